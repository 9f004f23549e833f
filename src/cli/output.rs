//! Shared CLI output helpers for consistent operator-facing text.

use std::fmt::Display;

use owo_colors::OwoColorize;

/// Print the application header with name and version.
pub fn header() {
    println!("{} {}", "oddsfeed".bold(), env!("CARGO_PKG_VERSION").dimmed());
    println!();
}

/// Print a section header.
pub fn section(title: &str) {
    println!("{}", title.bold());
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    println!("  {:<14} {}", label.dimmed(), value);
}

pub fn success(message: &str) {
    println!("  {} {}", "✓".green(), message);
}

pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message);
}

pub fn error(message: &str) {
    eprintln!("  {} {}", "×".red(), message);
}

/// Emphasise a command or path inside a sentence.
pub fn highlight(text: &str) -> String {
    text.cyan().to_string()
}
