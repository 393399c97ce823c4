// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{BackendKind, StoreConfig};
use crate::storage::{FilterCriteria, ScanMode};

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Directory holding the scan history")]
    pub data_dir: Option<PathBuf>,

    #[arg(
        long = "backend",
        default_value = "file",
        global = true,
        help = "Storage backend: file or sled"
    )]
    pub backend: String,

    #[arg(long = "log-level", default_value = "warn", global = true)]
    pub log_level: String,

    #[arg(long = "no-color", help = "Disable colored output", global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a markdown accessibility report as a new scan
    Record(RecordArgs),
    /// List stored scans
    List(ListArgs),
    /// Show one scan
    Show(ShowArgs),
    /// Compare two scans
    Compare(CompareArgs),
    /// Set or clear the label of a scan
    Label(LabelArgs),
    /// Delete one scan
    Delete(DeleteArgs),
    /// Remove every stored scan
    Clear(ClearArgs),
    /// Write the history as pretty-printed JSON
    Export(ExportArgs),
    /// Replace the history with a previously exported file
    Import(ImportArgs),
    /// Show storage usage
    Quota,
    /// Aggregate statistics over the history
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    #[arg(short = 'u', long = "url")]
    pub url: String,

    #[arg(short = 'm', long = "mode", default_value = "single")]
    pub mode: String,

    #[arg(
        short = 'r',
        long = "report",
        help = "Markdown report file; reads stdin when omitted"
    )]
    pub report: Option<PathBuf>,

    #[arg(short = 'l', long = "label")]
    pub label: Option<String>,

    #[arg(
        long = "discovered",
        help = "Page discovered during exploration (repeatable)"
    )]
    pub discovered: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long = "url", help = "Case-insensitive URL substring")]
    pub url: Option<String>,

    #[arg(long = "mode")]
    pub mode: Option<String>,

    #[arg(long = "from", help = "Start date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")]
    pub from: Option<String>,

    #[arg(long = "to", help = "End date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")]
    pub to: Option<String>,

    #[arg(long = "min-violations")]
    pub min_violations: Option<u32>,

    #[arg(long = "max-violations")]
    pub max_violations: Option<u32>,

    #[arg(long = "format", default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: String,

    #[arg(long = "report", help = "Print the raw markdown report")]
    pub report: bool,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[arg(help = "Baseline (earlier) scan id")]
    pub baseline: Option<String>,

    #[arg(help = "Current (later) scan id")]
    pub current: Option<String>,

    #[arg(long = "url", help = "Compare the two most recent scans of this URL")]
    pub url: Option<String>,

    #[arg(long = "format", default_value = "table")]
    pub format: String,

    #[arg(long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LabelArgs {
    pub id: String,

    #[arg(help = "New label; an empty string clears it")]
    pub label: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    #[arg(long = "confirm", help = "Confirm deletion without interactive prompt")]
    pub confirm: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[arg(long = "format", default_value = "table")]
    pub format: String,

    #[arg(long = "top-n", default_value_t = 5)]
    pub top_n: usize,

    #[arg(long = "url", help = "Show the quality trend for this exact URL")]
    pub url: Option<String>,
}

impl Cli {
    pub fn store_config(&self) -> Result<StoreConfig, String> {
        let mut config = StoreConfig::new();
        config.set_backend(self.backend.parse::<BackendKind>()?);
        config.set_data_dir(self.data_dir.clone());
        Ok(config)
    }
}

impl RecordArgs {
    pub fn parse_mode(&self) -> Result<ScanMode, String> {
        self.mode.parse()
    }

    pub fn discovered_urls(&self) -> Option<Vec<String>> {
        if self.discovered.is_empty() {
            None
        } else {
            Some(self.discovered.clone())
        }
    }
}

impl ListArgs {
    pub fn to_criteria(&self) -> Result<FilterCriteria, String> {
        let mode = match &self.mode {
            Some(m) => Some(m.parse::<ScanMode>()?),
            None => None,
        };
        let date_from = match &self.from {
            Some(s) => Some(parse_date_string(s).ok_or_else(|| invalid_date(s))?),
            None => None,
        };
        let date_to = match &self.to {
            Some(s) => Some(parse_end_date_string(s).ok_or_else(|| invalid_date(s))?),
            None => None,
        };

        Ok(FilterCriteria {
            url: self.url.clone(),
            mode,
            date_from,
            date_to,
            min_violations: self.min_violations,
            max_violations: self.max_violations,
        })
    }
}

fn invalid_date(input: &str) -> String {
    format!(
        "Invalid date '{}'. Use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
        input
    )
}

pub fn parse_date_string(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    if let Ok(naive) =
        NaiveDateTime::parse_from_str(&format!("{} 00:00:00", date_str), "%Y-%m-%d %H:%M:%S")
    {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    None
}

/// Like [`parse_date_string`], but a bare date covers the whole day.
pub fn parse_end_date_string(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    NaiveDateTime::parse_from_str(
        &format!("{} 23:59:59.999999999", date_str),
        "%Y-%m-%d %H:%M:%S%.f",
    )
    .ok()
    .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_string() {
        let date = parse_date_string("2025-03-10").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 3, 10));
        assert_eq!(date.hour(), 0);

        let full = parse_date_string("2025-03-10 14:30:00").unwrap();
        assert_eq!(full.hour(), 14);

        assert!(parse_date_string("yesterday").is_none());
    }

    #[test]
    fn test_parse_end_date_covers_day() {
        let end = parse_end_date_string("2025-03-10").unwrap();
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
    }

    #[test]
    fn test_list_args_to_criteria() {
        let cli = Cli::parse_from([
            "a11yhistory",
            "list",
            "--mode",
            "exploration",
            "--from",
            "2025-01-01",
            "--min-violations",
            "3",
        ]);
        let Commands::List(args) = cli.command else {
            panic!("expected list command");
        };

        let criteria = args.to_criteria().unwrap();
        assert_eq!(criteria.mode, Some(ScanMode::Exploration));
        assert!(criteria.date_from.is_some());
        assert!(criteria.date_to.is_none());
        assert_eq!(criteria.min_violations, Some(3));
    }

    #[test]
    fn test_list_args_reject_bad_input() {
        let cli = Cli::parse_from(["a11yhistory", "list", "--to", "soon"]);
        let Commands::List(args) = cli.command else {
            panic!("expected list command");
        };
        assert!(args.to_criteria().is_err());
    }

    #[test]
    fn test_record_args() {
        let cli = Cli::parse_from([
            "a11yhistory",
            "--backend",
            "sled",
            "record",
            "--url",
            "https://example.com",
            "--mode",
            "exploration",
            "--discovered",
            "https://example.com/a",
            "--discovered",
            "https://example.com/b",
        ]);
        let config = cli.store_config().unwrap();
        assert_eq!(config.backend(), BackendKind::Sled);

        let Commands::Record(args) = cli.command else {
            panic!("expected record command");
        };
        assert_eq!(args.parse_mode().unwrap(), ScanMode::Exploration);
        assert_eq!(args.discovered_urls().unwrap().len(), 2);
    }
}
