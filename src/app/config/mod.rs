//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. Only `[source]` is required;
//! every other section falls back to defaults. The `PORT` environment
//! variable overrides the port of `server.bind`.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{ConfigError, Result};

mod logging;
mod service;
mod source;

pub use logging::LoggingConfig;
pub use service::{PollerConfig, ServerConfig, StorageConfig};
pub use source::{SelectorConfig, SourceConfig, SourceKind};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse(&content)?;
        config.apply_port_override(std::env::var("PORT").ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::result_large_err)]
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ConfigError::Parse)?)
    }

    /// Replace the port of `server.bind` with `port`, if given.
    #[allow(clippy::result_large_err)]
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<()> {
        let Some(port) = port else {
            return Ok(());
        };
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
            field: "PORT",
            reason: format!("'{port}' is not a port number"),
        })?;
        let mut addr = self.bind_addr()?;
        addr.set_port(port);
        self.server.bind = addr.to_string();
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "url" }.into());
        }
        if self.source.kind == SourceKind::Html {
            let parsed = url::Url::parse(&self.source.url).map_err(|e| ConfigError::InvalidValue {
                field: "url",
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidValue {
                    field: "url",
                    reason: format!("unsupported scheme '{}'", parsed.scheme()),
                }
                .into());
            }
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be greater than zero".into(),
            }
            .into());
        }
        if self.poller.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_ms",
                reason: "must be greater than zero".into(),
            }
            .into());
        }
        if self.storage.history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history_limit",
                reason: "must be greater than zero".into(),
            }
            .into());
        }
        if self.storage.snapshot_file == self.storage.mapping_file {
            return Err(ConfigError::InvalidValue {
                field: "mapping_file",
                reason: "must differ from snapshot_file".into(),
            }
            .into());
        }
        self.bind_addr()?;
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        Ok(self
            .server
            .bind
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                field: "bind",
                reason: e.to_string(),
            })?)
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
