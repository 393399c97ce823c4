// File: stats.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::comparison::quality_score;
use crate::storage::models::{ScanMode, ScanRecord, Severity, SeverityCounts};

#[derive(Debug, Clone, Serialize)]
pub struct HistoryStats {
    pub total_scans: usize,
    pub single_scans: usize,
    pub exploration_scans: usize,
    pub unique_urls: usize,
    pub total_violations: u64,
    pub severity_totals: SeverityCounts,
    pub average_quality_score: f64,
    pub latest_quality_score: Option<u32>,
    pub oldest_scan: Option<DateTime<Utc>>,
    pub newest_scan: Option<DateTime<Utc>>,
    pub most_scanned_urls: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub total_violations: u32,
    pub quality_score: u32,
}

impl HistoryStats {
    pub fn from_records(records: &[ScanRecord], top_n: usize) -> Self {
        let mut severity_totals = SeverityCounts::default();
        let mut url_counts: HashMap<&str, usize> = HashMap::new();
        let mut total_violations = 0u64;
        let mut score_sum = 0u64;

        for record in records {
            *url_counts.entry(record.url.as_str()).or_insert(0) += 1;
            total_violations += record.metadata.total_violations as u64;
            score_sum += quality_score(record) as u64;
            for severity in Severity::ALL {
                let sum = severity_totals
                    .get(severity)
                    .saturating_add(record.metadata.violations_by_severity.get(severity));
                severity_totals.set(severity, sum);
            }
        }

        let mut most_scanned_urls: Vec<(String, usize)> = url_counts
            .iter()
            .map(|(url, count)| (url.to_string(), *count))
            .collect();
        most_scanned_urls.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        most_scanned_urls.truncate(top_n);

        let average_quality_score = if records.is_empty() {
            0.0
        } else {
            (score_sum as f64 / records.len() as f64 * 10.0).round() / 10.0
        };

        Self {
            total_scans: records.len(),
            single_scans: records.iter().filter(|r| r.mode == ScanMode::Single).count(),
            exploration_scans: records
                .iter()
                .filter(|r| r.mode == ScanMode::Exploration)
                .count(),
            unique_urls: url_counts.len(),
            total_violations,
            severity_totals,
            average_quality_score,
            latest_quality_score: records
                .iter()
                .max_by_key(|r| r.timestamp)
                .map(quality_score),
            oldest_scan: records.iter().map(|r| r.timestamp).min(),
            newest_scan: records.iter().map(|r| r.timestamp).max(),
            most_scanned_urls,
        }
    }
}

/// Violations and score over time for one exact URL, oldest first.
pub fn url_trend(records: &[ScanRecord], url: &str) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = records
        .iter()
        .filter(|r| r.url == url)
        .map(|r| TrendPoint {
            timestamp: r.timestamp,
            total_violations: r.metadata.total_violations,
            quality_score: quality_score(r),
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}
