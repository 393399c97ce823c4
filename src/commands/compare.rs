// File: compare.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{bail, Context, Result};
use colored::*;
use std::path::Path;

use super::{colored_score, print_error, print_info, print_success, take};
use crate::cli::CompareArgs;
use crate::comparison::{
    is_improvement, is_regression, most_significant_change, summary, CountDiff, ScanComparison,
};
use crate::storage::{ScanHistoryStore, ScanRecord};
use crate::util::{format_absolute_time, format_duration};

pub async fn execute(args: &CompareArgs, store: &ScanHistoryStore) -> Result<()> {
    let (baseline_id, current_id) = match (&args.baseline, &args.current, &args.url) {
        (Some(baseline), Some(current), _) => (baseline.clone(), current.clone()),
        (None, None, Some(url)) => {
            let (baseline, current) = take(store.latest_pair_for_url(url))?;
            print_info(&format!("Comparing the two most recent scans of {}", url));
            (baseline.id, current.id)
        }
        _ => bail!("Pass two scan ids, or --url to compare the latest two scans of a URL"),
    };

    let comparison = take(store.compare(&baseline_id, &current_id))?;

    match args.format.to_lowercase().as_str() {
        "table" => display_comparison_table(&comparison),
        "json" => display_comparison_json(&comparison)?,
        _ => {
            print_error(&format!("Unsupported format: {}", args.format));
            return Ok(());
        }
    }

    if let Some(ref output_path) = args.output {
        save_comparison_output(&comparison, output_path, &args.format).await?;
        print_success(&format!("Comparison saved to: {}", output_path.display()));
    }

    Ok(())
}

fn display_comparison_table(comparison: &ScanComparison) {
    println!();
    println!("{}", "═".repeat(80).bright_black());
    println!("{:^80}", "SCAN COMPARISON RESULTS".bold().bright_white());
    println!("{}", "═".repeat(80).bright_black());

    display_scan_summary("Baseline", &comparison.baseline, comparison.baseline_score);
    display_scan_summary("Current", &comparison.current, comparison.current_score);

    println!();
    println!("{}", "VIOLATIONS BY SEVERITY".bold().white());
    println!("{}", "─".repeat(60).bright_black());
    println!(
        "{:<14} {:>9} {:>9} {:>7} {:>7} {:>10}",
        "Severity".bold(),
        "Baseline".bold(),
        "Current".bold(),
        "Fixed".bold(),
        "New".bold(),
        "Unchanged".bold()
    );
    for (severity, diff) in comparison.by_severity.iter() {
        print_diff_row(&format!("{} {}", severity.emoji(), severity.label()), diff);
    }
    println!("{}", "─".repeat(60).bright_black());
    print_diff_row("Total", &comparison.overall.counts);

    println!();
    let change = comparison.overall.percentage_change;
    let change_display = format!("{:+.1}%", change);
    let change_colored = if is_regression(comparison) {
        change_display.red()
    } else if is_improvement(comparison) {
        change_display.green()
    } else {
        change_display.normal()
    };
    println!("{}: {}", "Change".bold(), change_colored);

    let score_delta = comparison.current_score as i64 - comparison.baseline_score as i64;
    println!(
        "{}: {} -> {} ({:+})",
        "Quality score".bold(),
        colored_score(comparison.baseline_score),
        colored_score(comparison.current_score),
        score_delta
    );

    match most_significant_change(comparison) {
        Some(severity) => println!(
            "{}: {} {}",
            "Most significant change".bold(),
            severity.emoji(),
            severity.label()
        ),
        None => println!("{}: none", "Most significant change".bold()),
    }

    let icon = if is_improvement(comparison) {
        "🟢"
    } else if is_regression(comparison) {
        "🔴"
    } else {
        "ℹ️"
    };
    println!();
    println!("  {} {}", icon, summary(comparison).bold());
    println!(
        "  Time between scans: {}",
        format_duration(comparison.elapsed_seconds.unsigned_abs() * 1000)
    );
    println!("{}", "═".repeat(80).bright_black());
}

fn print_diff_row(name: &str, diff: &CountDiff) {
    let fixed = if diff.fixed > 0 {
        diff.fixed.to_string().green()
    } else {
        diff.fixed.to_string().dimmed()
    };
    let new = if diff.new > 0 {
        diff.new.to_string().red()
    } else {
        diff.new.to_string().dimmed()
    };
    println!(
        "{:<14} {:>9} {:>9} {:>7} {:>7} {:>10}",
        name, diff.baseline, diff.current, fixed, new, diff.unchanged
    );
}

fn display_scan_summary(title: &str, scan: &ScanRecord, score: u32) {
    println!();
    println!("{}", title.bold().bright_blue());
    println!("  ID: {}", scan.id);
    println!("  Name: {}", scan.display_name().cyan());
    println!("  Timestamp: {}", format_absolute_time(&scan.timestamp));
    println!("  Mode: {}", scan.mode);
    println!("  Violations: {}", scan.metadata.total_violations);
    println!("  Quality score: {}", colored_score(score));
}

fn display_comparison_json(comparison: &ScanComparison) -> Result<()> {
    let json = serde_json::to_string_pretty(&comparison_json(comparison))?;
    println!("{}", json);
    Ok(())
}

fn comparison_json(comparison: &ScanComparison) -> serde_json::Value {
    serde_json::json!({
        "comparison": comparison,
        "summary": summary(comparison),
        "isImprovement": is_improvement(comparison),
        "isRegression": is_regression(comparison),
        "mostSignificantChange": most_significant_change(comparison)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string()),
    })
}

async fn save_comparison_output(
    comparison: &ScanComparison,
    path: &Path,
    format: &str,
) -> Result<()> {
    let content = match format.to_lowercase().as_str() {
        "json" => serde_json::to_string_pretty(&comparison_json(comparison))?,
        _ => {
            let mut output = String::new();
            output.push_str(&format!(
                "Comparison Report: {} -> {}\n",
                comparison.baseline.url, comparison.current.url
            ));
            output.push_str(&format!(
                "Generated: {}\n\n",
                format_absolute_time(&chrono::Utc::now())
            ));
            output.push_str(&format!(
                "Baseline: {} ({}, {} violations)\n",
                comparison.baseline.id,
                format_absolute_time(&comparison.baseline.timestamp),
                comparison.overall.counts.baseline
            ));
            output.push_str(&format!(
                "Current: {} ({}, {} violations)\n\n",
                comparison.current.id,
                format_absolute_time(&comparison.current.timestamp),
                comparison.overall.counts.current
            ));
            for (severity, diff) in comparison.by_severity.iter() {
                output.push_str(&format!(
                    "  - {}: {} -> {} (fixed {}, new {})\n",
                    severity.label(),
                    diff.baseline,
                    diff.current,
                    diff.fixed,
                    diff.new
                ));
            }
            output.push_str(&format!(
                "\nChange: {:+.1}%\nSummary: {}\n",
                comparison.overall.percentage_change,
                summary(comparison)
            ));
            output
        }
    };

    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write comparison to {}", path.display()))?;
    Ok(())
}
