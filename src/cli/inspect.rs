//! Handler for `inspect`: show what is on disk without starting the service.

use owo_colors::OwoColorize;
use tabled::{Table, Tabled};

use crate::app::{Config, StorageConfig};
use crate::cli::{output, InspectArgs};
use crate::domain::{MatchRecord, OddEntry};
use crate::error::Result;

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Match")]
    label: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Live")]
    live: &'static str,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Back")]
    back: String,
    #[tabled(rename = "Lay")]
    lay: String,
}

impl From<&MatchRecord> for MatchRow {
    fn from(record: &MatchRecord) -> Self {
        let when = [&record.scheduled_date, &record.scheduled_time]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            id: record.id.to_string(),
            label: record.label(),
            when,
            live: if record.in_play { "yes" } else { "" },
            score: record.score.as_ref().map(|s| s.join(" ")).unwrap_or_default(),
            back: best_price(&record.odds.back),
            lay: best_price(&record.odds.lay),
        }
    }
}

fn best_price(side: &[OddEntry]) -> String {
    side.iter()
        .min_by_key(|e| e.position)
        .map(|e| e.price.clone())
        .unwrap_or_else(|| "-".into())
}

fn storage_for(args: &InspectArgs) -> Result<StorageConfig> {
    let mut storage = if args.config.exists() {
        Config::load(&args.config)?.storage
    } else {
        StorageConfig::default()
    };
    if let Some(dir) = &args.data_dir {
        storage.data_dir = dir.clone();
    }
    Ok(storage)
}

pub fn execute(args: &InspectArgs) -> Result<()> {
    let persistence = storage_for(args)?.persistence();
    output::header();

    let Some(file) = persistence.read_snapshot()? else {
        output::warning(&format!(
            "No snapshot at {}",
            persistence.snapshot_path().display()
        ));
        return Ok(());
    };

    output::section(&format!("Snapshot {}", persistence.snapshot_path().display()));
    output::field("Captured", file.timestamp.to_rfc3339());
    if !file.updated.is_empty() {
        output::field("Saved", &file.updated);
    }
    match persistence.read_mapping() {
        Ok(Some(mapping)) => output::field("Remapped ids", mapping.mapping.len()),
        Ok(None) => output::field("Remapped ids", 0),
        Err(e) => output::warning(&format!("Mapping file unreadable: {e}")),
    }

    let rows: Vec<MatchRow> = file
        .matches
        .iter()
        .filter(|m| args.team.as_deref().map_or(true, |t| m.involves_team(t)))
        .map(MatchRow::from)
        .collect();
    output::field("Matches", format!("{} shown of {}", rows.len(), file.matches.len()));
    println!();

    if rows.is_empty() {
        println!("  {}", "nothing to show".dimmed());
        return Ok(());
    }
    for line in Table::new(rows).to_string().lines() {
        println!("  {line}");
    }
    println!();
    Ok(())
}
