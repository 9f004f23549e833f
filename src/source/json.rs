//! JSON feed source: an HTTP endpoint or a local file holding raw matches.
//!
//! Accepts either a bare array of matches or an object with a `matches`
//! array, so a persisted snapshot file can be replayed as a feed.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use super::raw::RawMatch;
use super::{http_client, MatchSource, SourceError};
use crate::app::config::SourceConfig;
use crate::domain::MatchRecord;

#[derive(Deserialize)]
#[serde(untagged)]
enum Feed {
    List(Vec<RawMatch>),
    Wrapped { matches: Vec<RawMatch> },
}

enum Location {
    Http { client: reqwest::Client, url: String },
    File(PathBuf),
}

pub struct JsonSource {
    location: Location,
}

impl JsonSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let location = if config.url.starts_with("http://") || config.url.starts_with("https://") {
            Location::Http {
                client: http_client(config)?,
                url: config.url.clone(),
            }
        } else {
            Location::File(PathBuf::from(config.url.trim_start_matches("file://")))
        };
        Ok(Self { location })
    }

    /// Source reading a local file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
        }
    }

    async fn read(&self) -> Result<Vec<u8>, SourceError> {
        match &self.location {
            Location::Http { client, url } => {
                let response = client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::Status {
                        status: status.as_u16(),
                        url: url.clone(),
                    });
                }
                Ok(response.bytes().await?.to_vec())
            }
            Location::File(path) => {
                tokio::fs::read(path).await.map_err(|source| SourceError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }
}

#[async_trait]
impl MatchSource for JsonSource {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch(&self) -> Result<Vec<MatchRecord>, SourceError> {
        let bytes = self.read().await?;
        let matches = decode(&bytes)?;
        if matches.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(matches)
    }
}

/// Decode a feed body into records stamped with the current time.
pub fn decode(bytes: &[u8]) -> Result<Vec<MatchRecord>, SourceError> {
    let feed: Feed =
        serde_json::from_slice(bytes).map_err(|e| SourceError::Decode(e.to_string()))?;
    let raw = match feed {
        Feed::List(list) => list,
        Feed::Wrapped { matches } => matches,
    };
    let now = Utc::now();
    Ok(raw.into_iter().map(|m| m.into_record(now)).collect())
}
