// File: history.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use chrono::Utc;
use colored::*;

use super::record::print_record_summary;
use super::{colored_count, colored_score, print_error, print_info, print_success, print_warning, take};
use crate::cli::{ListArgs, ShowArgs};
use crate::comparison::quality_score;
use crate::storage::{ScanHistoryStore, ScanRecord};
use crate::util::{format_absolute_time, format_relative_time, truncate_url};

pub async fn execute_list(args: &ListArgs, store: &ScanHistoryStore) -> Result<()> {
    let criteria = args.to_criteria().map_err(anyhow::Error::msg)?;
    let scans = take(store.filter(&criteria))?;

    if scans.is_empty() {
        print_warning("No scan history found matching the criteria");
        return Ok(());
    }

    match args.format.to_lowercase().as_str() {
        "table" => {
            print_success(&format!("Found {} scan records", scans.len()));
            display_history_table(&scans);
        }
        "json" => display_history_json(&scans)?,
        _ => {
            print_error(&format!("Unsupported format: {}", args.format));
        }
    }

    Ok(())
}

pub async fn execute_show(args: &ShowArgs, store: &ScanHistoryStore) -> Result<()> {
    let record = take(store.get_by_id(&args.id))?;

    println!();
    println!("{}", record.id.bold().bright_white());
    println!(
        "  Recorded: {} ({})",
        format_absolute_time(&record.timestamp),
        format_relative_time(&record.timestamp, &Utc::now())
    );
    print_record_summary(&record);

    if let Some(ref urls) = record.discovered_urls {
        println!("  Discovered pages: {}", urls.len());
        for url in urls {
            println!("    • {}", url.cyan());
        }
    }

    if args.report {
        println!();
        println!("{}", "─".repeat(80).bright_black());
        println!("{}", record.report);
        println!("{}", "─".repeat(80).bright_black());
    } else {
        print_info("Use --report to print the full markdown report");
    }

    Ok(())
}

fn display_history_table(scans: &[ScanRecord]) {
    let now = Utc::now();

    println!();
    println!("{}", "═".repeat(120).bright_black());
    println!("{:^120}", "SCAN HISTORY".bold().bright_white());
    println!("{}", "═".repeat(120).bright_black());

    println!(
        "{:<46} {:<44} {:<12} {:<16} {:<6} {}",
        "ID".bold(),
        "URL".bold(),
        "Mode".bold(),
        "When".bold(),
        "Total".bold(),
        "Score".bold()
    );
    println!("{}", "─".repeat(120).bright_black());

    for scan in scans {
        let name = match scan.label {
            Some(ref label) => format!("{} [{}]", truncate_url(&scan.url, 30), label),
            None => scan.url.clone(),
        };

        println!(
            "{:<46} {:<44} {:<12} {:<16} {:<6} {}",
            scan.id,
            truncate_url(&name, 44),
            scan.mode.to_string(),
            format_relative_time(&scan.timestamp, &now),
            colored_count(scan.metadata.total_violations),
            colored_score(quality_score(scan))
        );
    }

    println!("{}", "═".repeat(120).bright_black());
}

fn display_history_json(scans: &[ScanRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(scans)?;
    println!("{}", json);
    Ok(())
}
