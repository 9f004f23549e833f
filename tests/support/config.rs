use std::fs;
use std::path::{Path, PathBuf};

/// Write `contents` as `config.toml` inside `dir`.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

/// Config polling a local JSON feed and persisting into `dir/data`.
pub fn json_feed_config(dir: &Path, feed: &Path) -> String {
    format!(
        r#"
[source]
kind = "json"
url = "{feed}"

[poller]
interval_ms = 50
recovery_threshold = 3

[storage]
data_dir = "{data}"
min_persist_interval_secs = 3600

[server]
bind = "127.0.0.1:0"

[logging]
level = "warn"
"#,
        feed = feed.display(),
        data = dir.join("data").display(),
    )
}
