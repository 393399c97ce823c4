// File: models.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Single,
    Exploration,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Single => write!(f, "single"),
            ScanMode::Exploration => write!(f, "exploration"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(ScanMode::Single),
            "exploration" | "explore" | "multi" => Ok(ScanMode::Exploration),
            other => Err(format!("Unknown scan mode: {}", other)),
        }
    }
}

/// Violation severity, ordered by user impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Severity {
    /// Fixed order used wherever severities are iterated, highest impact first.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Serious,
        Severity::Moderate,
        Severity::Minor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Serious => "Serious",
            Severity::Moderate => "Moderate",
            Severity::Minor => "Minor",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::Serious => "🟠",
            Severity::Moderate => "🟡",
            Severity::Minor => "🔵",
        }
    }

    pub fn weight(&self) -> u32 {
        match self {
            Severity::Critical => 10,
            Severity::Serious => 5,
            Severity::Moderate => 2,
            Severity::Minor => 1,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label().to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WcagLevel {
    A,
    AA,
    AAA,
}

impl fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WcagLevel::A => write!(f, "A"),
            WcagLevel::AA => write!(f, "AA"),
            WcagLevel::AAA => write!(f, "AAA"),
        }
    }
}

impl FromStr for WcagLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(WcagLevel::A),
            "AA" => Ok(WcagLevel::AA),
            "AAA" => Ok(WcagLevel::AAA),
            other => Err(format!("Unknown WCAG level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: u32,
    pub serious: u32,
    pub moderate: u32,
    pub minor: u32,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Serious => self.serious,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
        }
    }

    pub fn set(&mut self, severity: Severity, value: u32) {
        match severity {
            Severity::Critical => self.critical = value,
            Severity::Serious => self.serious = value,
            Severity::Moderate => self.moderate = value,
            Severity::Minor => self.minor = value,
        }
    }

    pub fn sum(&self) -> u32 {
        Severity::ALL
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(self.get(*s)))
    }

    pub fn is_empty(&self) -> bool {
        Severity::ALL.iter().all(|s| self.get(*s) == 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanMetadata {
    pub total_violations: u32,
    pub violations_by_severity: SeverityCounts,
    pub page_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wcag_level: Option<WcagLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_duration: Option<u64>,
}

impl ScanMetadata {
    pub fn empty(mode: ScanMode) -> Self {
        Self {
            total_violations: 0,
            violations_by_severity: SeverityCounts::default(),
            page_count: default_page_count(mode),
            wcag_level: None,
            scan_duration: None,
        }
    }
}

pub fn default_page_count(mode: ScanMode) -> u32 {
    match mode {
        ScanMode::Single => 1,
        ScanMode::Exploration => 0,
    }
}

/// One persisted audit result. Only `label` ever changes after creation, and it
/// changes by replacing the record (see [`ScanRecord::with_label`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: String,
    pub url: String,
    pub mode: ScanMode,
    pub timestamp: DateTime<Utc>,
    pub report: String,
    pub metadata: ScanMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_urls: Option<Vec<String>>,
}

impl ScanRecord {
    pub fn with_label(&self, label: Option<String>) -> ScanRecord {
        ScanRecord {
            label,
            ..self.clone()
        }
    }

    pub fn total_violations(&self) -> u32 {
        self.metadata.total_violations
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistory {
    pub version: u32,
    pub scans: Vec<ScanRecord>,
    pub last_modified: DateTime<Utc>,
}

impl ScanHistory {
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION,
            scans: Vec::new(),
            last_modified: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&ScanRecord> {
        self.scans.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.scans.iter().position(|s| s.id == id)
    }

    /// Most-recent-first. The sort is stable so records sharing a timestamp keep
    /// their relative order.
    pub fn sort_most_recent_first(&mut self) {
        self.scans.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_mode_roundtrip_names() {
        assert_eq!("single".parse::<ScanMode>().unwrap(), ScanMode::Single);
        assert_eq!(
            "Exploration".parse::<ScanMode>().unwrap(),
            ScanMode::Exploration
        );
        assert!("deep".parse::<ScanMode>().is_err());
        assert_eq!(ScanMode::Exploration.to_string(), "exploration");
    }

    #[test]
    fn test_severity_counts_sum_and_set() {
        let mut counts = SeverityCounts::default();
        assert!(counts.is_empty());

        counts.set(Severity::Critical, 2);
        counts.set(Severity::Minor, 5);

        assert_eq!(counts.get(Severity::Critical), 2);
        assert_eq!(counts.sum(), 7);
        assert!(!counts.is_empty());
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let metadata = ScanMetadata {
            total_violations: 3,
            violations_by_severity: SeverityCounts {
                critical: 1,
                serious: 2,
                moderate: 0,
                minor: 0,
            },
            page_count: 1,
            wcag_level: Some(WcagLevel::AA),
            scan_duration: None,
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["totalViolations"], 3);
        assert_eq!(json["violationsBySeverity"]["serious"], 2);
        assert_eq!(json["pageCount"], 1);
        assert_eq!(json["wcagLevel"], "AA");
        assert!(json.get("scanDuration").is_none());
    }

    #[test]
    fn test_with_label_keeps_other_fields() {
        let record = ScanRecord {
            id: "scan_1".to_string(),
            url: "https://example.com".to_string(),
            mode: ScanMode::Single,
            timestamp: Utc::now(),
            report: "# Report".to_string(),
            metadata: ScanMetadata::empty(ScanMode::Single),
            label: None,
            discovered_urls: None,
        };

        let labeled = record.with_label(Some("Before redesign".to_string()));
        assert_eq!(labeled.label.as_deref(), Some("Before redesign"));
        assert_eq!(labeled.id, record.id);
        assert_eq!(labeled.timestamp, record.timestamp);
        assert_eq!(labeled.display_name(), "Before redesign");
        assert_eq!(record.display_name(), "https://example.com");
    }
}
