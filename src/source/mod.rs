//! Match sources: anything that can produce a batch of records on demand.

pub mod html;
pub mod json;
pub mod raw;

use async_trait::async_trait;
use thiserror::Error;

use crate::app::config::{SourceConfig, SourceKind};
use crate::domain::MatchRecord;

pub use html::HtmlSource;
pub use json::JsonSource;
pub use raw::RawMatch;

/// Scrape failures. Every variant is transient from the engine's view.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("failed to decode feed: {0}")]
    Decode(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no matches found")]
    Empty,
}

/// A scraper or feed polled by the poller.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Fetch one batch. An empty page is reported as [`SourceError::Empty`].
    async fn fetch(&self) -> Result<Vec<MatchRecord>, SourceError>;
}

/// Build the configured source.
pub fn from_config(config: &SourceConfig) -> Result<Box<dyn MatchSource>, SourceError> {
    match config.kind {
        SourceKind::Html => Ok(Box::new(HtmlSource::new(config)?)),
        SourceKind::Json => Ok(Box::new(JsonSource::new(config)?)),
    }
}

fn http_client(config: &SourceConfig) -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()?)
}
