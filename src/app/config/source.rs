//! Scrape source configuration.

use serde::Deserialize;

/// Which kind of source to poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Html,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    /// Page URL for `html`; URL or local path for `json`.
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

fn default_user_agent() -> String {
    concat!("oddsfeed/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            url: String::new(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            selectors: SelectorConfig::default(),
        }
    }
}

/// CSS selectors for the HTML scraper. `price` and `volume` are relative to
/// a back/lay button; everything else is relative to a match item.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub item: String,
    pub team: String,
    pub date: String,
    pub time: String,
    pub score: String,
    pub back: String,
    pub lay: String,
    pub price: String,
    pub volume: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            item: ".inplay-item".into(),
            team: ".inplay-item__player span".into(),
            date: ".date-content .inPlayDate-content__date".into(),
            time: ".date-content .inPlayDate-content__time".into(),
            score: ".score-content:not(.empty) span".into(),
            back: ".odd-button.back-color".into(),
            lay: ".odd-button.lay-color".into(),
            price: ".odd-button__price".into(),
            volume: ".odd-button__volume".into(),
        }
    }
}
