// File: stats.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use colored::*;

use super::{colored_count, colored_score, print_error, print_info, take};
use crate::cli::StatsArgs;
use crate::stats::{url_trend, HistoryStats, TrendPoint};
use crate::storage::{ScanHistoryStore, Severity};
use crate::util::{format_absolute_time, format_bytes};

pub async fn execute_quota(store: &ScanHistoryStore) -> Result<()> {
    let quota = take(store.get_quota())?;
    let config = store.config();

    println!("{}", "Storage Usage".bold().bright_blue());
    println!("{}", "─".repeat(40).bright_black());
    println!("Backend: {}", store.backend_name());
    println!(
        "Used: {} of {}",
        format_bytes(quota.used),
        format_bytes(quota.limit)
    );

    let percentage = format!("{:.1}%", quota.percentage_used);
    let percentage = if quota.percentage_used >= config.aggressive_prune_threshold() * 100.0 {
        percentage.red().bold()
    } else if quota.percentage_used > config.warning_threshold() * 100.0 {
        percentage.yellow()
    } else {
        percentage.green()
    };
    println!("Usage: {}", percentage);
    println!("Scans: {} / {}", quota.scan_count, config.max_scans());
    Ok(())
}

pub async fn execute(args: &StatsArgs, store: &ScanHistoryStore) -> Result<()> {
    let records = take(store.get_all())?;
    let stats = HistoryStats::from_records(&records, args.top_n);
    let trend = args.url.as_deref().map(|url| url_trend(&records, url));

    match args.format.to_lowercase().as_str() {
        "table" => {
            display_stats_table(&stats);
            if let (Some(url), Some(points)) = (args.url.as_deref(), trend.as_ref()) {
                display_trend(url, points);
            }
        }
        "json" => {
            let json = serde_json::json!({
                "stats": stats,
                "trend": trend,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => print_error(&format!("Unsupported format: {}", args.format)),
    }
    Ok(())
}

fn display_stats_table(stats: &HistoryStats) {
    if stats.total_scans == 0 {
        print_info("No scans stored yet");
        return;
    }

    println!("{}", "Scan History Statistics".bold().bright_blue());
    println!("{}", "─".repeat(50).bright_black());
    println!(
        "Scans: {} ({} single, {} exploration)",
        stats.total_scans, stats.single_scans, stats.exploration_scans
    );
    println!("Unique URLs: {}", stats.unique_urls);
    println!("Total violations: {}", stats.total_violations);
    for severity in Severity::ALL {
        println!(
            "  {} {:<10} {}",
            severity.emoji(),
            severity.label(),
            colored_count(stats.severity_totals.get(severity))
        );
    }
    println!("Average quality score: {:.1}", stats.average_quality_score);
    if let Some(score) = stats.latest_quality_score {
        println!("Latest quality score: {}", colored_score(score));
    }
    if let (Some(oldest), Some(newest)) = (stats.oldest_scan, stats.newest_scan) {
        println!(
            "Range: {} to {}",
            format_absolute_time(&oldest),
            format_absolute_time(&newest)
        );
    }

    if !stats.most_scanned_urls.is_empty() {
        println!();
        println!("{}", "Most scanned URLs".bold());
        for (url, count) in &stats.most_scanned_urls {
            println!("  {:>3}  {}", count, url.cyan());
        }
    }
}

fn display_trend(url: &str, points: &[TrendPoint]) {
    println!();
    println!("{} {}", "Trend for".bold(), url.cyan());
    if points.is_empty() {
        print_info("No scans stored for this URL");
        return;
    }
    for point in points {
        println!(
            "  {}  {:>5} violations  score {}",
            format_absolute_time(&point.timestamp),
            point.total_violations,
            colored_score(point.quality_score)
        );
    }
}
