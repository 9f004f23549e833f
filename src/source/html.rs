//! HTML page scraper driven by configurable CSS selectors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::raw::{RawMatch, RawOdd, RawOdds};
use super::{http_client, MatchSource, SourceError};
use crate::app::config::{SelectorConfig, SourceConfig};
use crate::domain::MatchRecord;

/// Parsed form of [`SelectorConfig`].
#[derive(Debug)]
pub struct Selectors {
    item: Selector,
    team: Selector,
    date: Selector,
    time: Selector,
    score: Selector,
    back: Selector,
    lay: Selector,
    price: Selector,
    volume: Selector,
}

impl Selectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, SourceError> {
        Ok(Self {
            item: parse(&config.item)?,
            team: parse(&config.team)?,
            date: parse(&config.date)?,
            time: parse(&config.time)?,
            score: parse(&config.score)?,
            back: parse(&config.back)?,
            lay: parse(&config.lay)?,
            price: parse(&config.price)?,
            volume: parse(&config.volume)?,
        })
    }
}

fn parse(selector: &str) -> Result<Selector, SourceError> {
    Selector::parse(selector).map_err(|e| SourceError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

pub struct HtmlSource {
    client: reqwest::Client,
    url: String,
    selectors: Selectors,
}

impl HtmlSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(config)?,
            url: config.url.clone(),
            selectors: Selectors::compile(&config.selectors)?,
        })
    }
}

#[async_trait]
impl MatchSource for HtmlSource {
    fn name(&self) -> &str {
        "html"
    }

    async fn fetch(&self) -> Result<Vec<MatchRecord>, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        let body = response.text().await?;

        let matches = parse_matches(&body, &self.selectors, Utc::now());
        debug!(url = %self.url, bytes = body.len(), matches = matches.len(), "Parsed page");
        if matches.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(matches)
    }
}

/// Extract every match item on the page.
pub fn parse_matches(
    html: &str,
    selectors: &Selectors,
    captured_at: DateTime<Utc>,
) -> Vec<MatchRecord> {
    let document = Html::parse_document(html);
    document
        .select(&selectors.item)
        .map(|item| parse_item(item, selectors).into_record(captured_at))
        .collect()
}

fn parse_item(item: ElementRef<'_>, selectors: &Selectors) -> RawMatch {
    let mut teams = item.select(&selectors.team).map(text);
    let team1 = teams.next();
    let team2 = teams.next();

    let score: Vec<String> = item
        .select(&selectors.score)
        .map(text)
        .filter(|s| !s.is_empty())
        .collect();
    let in_play = !score.is_empty();

    RawMatch {
        team1,
        team2,
        date: item.select(&selectors.date).next().map(text),
        time: item.select(&selectors.time).next().map(text),
        in_play: Some(in_play),
        score: in_play.then_some(score),
        odds: Some(RawOdds {
            back: ladder(item, &selectors.back, selectors),
            lay: ladder(item, &selectors.lay, selectors),
        }),
    }
}

fn ladder(item: ElementRef<'_>, side: &Selector, selectors: &Selectors) -> Vec<RawOdd> {
    item.select(side)
        .enumerate()
        .map(|(i, button)| RawOdd {
            position: Some(i as u32),
            price: button.select(&selectors.price).next().map(text),
            volume: button.select(&selectors.volume).next().map(text),
        })
        .collect()
}

fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
