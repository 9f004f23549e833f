//! Handler for the `run` command.

use tracing::info;

use crate::app::{App, Config};
use crate::cli::RunArgs;
use crate::error::Result;

/// Apply command-line overrides on top of the loaded file.
#[allow(clippy::result_large_err)]
pub fn apply_overrides(config: &mut Config, args: &RunArgs) -> Result<()> {
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if let Some(ref bind) = args.bind {
        config.server.bind = bind.clone();
        config.validate()?;
    }
    Ok(())
}

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, args)?;

    config.init_logging();
    info!(
        source = %config.source.url,
        interval_ms = config.poller.interval_ms,
        data_dir = %config.storage.data_dir.display(),
        "oddsfeed starting"
    );

    App::run(config).await
}
