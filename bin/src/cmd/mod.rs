//! CLI subcommand modules.
//!
//! This module contains the implementations for all ballast CLI subcommands
//! and the output helpers they share.

pub(crate) mod optimize;
pub(crate) mod weights;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable table
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Print a boxed section header.
pub(crate) fn print_header(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", title);
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

/// Print a symbol/weight table followed by exposure totals.
pub(crate) fn print_weights<'a>(rows: impl IntoIterator<Item = (&'a str, f64)>) {
    let rows: Vec<(&str, f64)> = rows.into_iter().collect();
    if rows.is_empty() {
        println!("No targets.");
        return;
    }

    println!("{:<12} {:>10}", "Symbol", "Weight");
    println!("{:-<12} {:->10}", "", "");
    for (symbol, weight) in &rows {
        println!("{:<12} {:>+10.4}", symbol, weight);
    }
    println!("{:-<12} {:->10}", "", "");

    let gross: f64 = rows.iter().map(|(_, w)| w.abs()).sum();
    let net: f64 = rows.iter().map(|(_, w)| w).sum();
    println!("{:<12} {:>10.4}", "Gross", gross);
    println!("{:<12} {:>+10.4}", "Net", net);
}

/// Print `value` as pretty JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
