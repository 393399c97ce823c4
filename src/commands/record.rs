// File: record.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{bail, Context, Result};
use colored::*;
use std::io::Read;

use super::{colored_count, print_info, print_success, take};
use crate::cli::RecordArgs;
use crate::comparison::quality_score;
use crate::storage::{ScanHistoryStore, ScanRecord, Severity};
use crate::util::format_duration;

pub async fn execute(args: &RecordArgs, store: &ScanHistoryStore) -> Result<()> {
    let mode = args.parse_mode().map_err(anyhow::Error::msg)?;

    let report = match &args.report {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read report {}", path.display()))?,
        None => {
            print_info("Reading markdown report from stdin...");
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read report from stdin")?;
            buffer
        }
    };

    if report.trim().is_empty() {
        bail!("The report is empty; nothing to record");
    }

    let record = take(store.add(
        &args.url,
        mode,
        &report,
        args.label.as_deref(),
        args.discovered_urls(),
    ))?;

    print_success(&format!("Recorded scan {}", record.id.bold()));
    print_record_summary(&record);
    Ok(())
}

pub(super) fn print_record_summary(record: &ScanRecord) {
    let counts = &record.metadata.violations_by_severity;
    println!("  URL: {}", record.url.cyan());
    println!("  Mode: {}", record.mode);
    if let Some(ref label) = record.label {
        println!("  Label: {}", label);
    }
    println!(
        "  Violations: {}",
        colored_count(record.metadata.total_violations).bold()
    );
    for severity in Severity::ALL {
        println!(
            "    {} {}: {}",
            severity.emoji(),
            severity.label(),
            colored_count(counts.get(severity))
        );
    }
    println!("  Pages: {}", record.metadata.page_count);
    if let Some(level) = record.metadata.wcag_level {
        println!("  WCAG level: {}", level);
    }
    if let Some(duration) = record.metadata.scan_duration {
        println!("  Duration: {}", format_duration(duration));
    }
    println!("  Quality score: {}", super::colored_score(quality_score(record)));
}
