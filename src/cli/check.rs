//! Handler for `check config`.

use std::path::Path;

use crate::app::{Config, SourceKind};
use crate::cli::output;
use crate::error::Result;

/// Validate configuration file without starting the service.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    output::header();
    output::section(&format!("Checking {}", path.display()));

    let config = Config::load(path)?;
    output::success("Configuration file is valid");
    println!();

    output::section("Summary");
    let kind = match config.source.kind {
        SourceKind::Html => "html",
        SourceKind::Json => "json",
    };
    output::field("Source", format!("{kind} {}", config.source.url));
    output::field("Interval", format!("{} ms", config.poller.interval_ms));
    output::field("Recovery", format!("after {} failures", config.poller.recovery_threshold));
    output::field("Data dir", config.storage.data_dir.display());
    output::field(
        "Persist",
        format!(
            "every {}s or >{} changes",
            config.storage.min_persist_interval_secs, config.storage.burst_threshold
        ),
    );
    output::field("History", format!("{} entries per match", config.storage.history_limit));
    output::field("Bind", &config.server.bind);
    output::field("Log level", &config.logging.level);
    println!();

    let persistence = config.storage.persistence();
    if persistence.snapshot_path().exists() {
        output::success(&format!(
            "Existing snapshot found at {}",
            persistence.snapshot_path().display()
        ));
    } else {
        output::warning("No snapshot on disk yet; the service will start empty");
    }
    println!();
    println!(
        "  Run {} to start",
        output::highlight(&format!("oddsfeed run -c {}", path.display()))
    );

    Ok(())
}
