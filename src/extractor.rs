// File: extractor.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Pulls violation counts and compliance hints out of free-form markdown
//! accessibility reports.
//!
//! Each field is resolved by an ordered list of [`NumericPattern`]s. Totals,
//! page counts, WCAG level and duration take the first match; severity counts
//! take the maximum over every match. When no severity pattern matches at all,
//! the extractor falls back to counting numbered `### N.` entries below each
//! severity heading.

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::storage::models::{ScanMetadata, ScanMode, Severity, SeverityCounts, WcagLevel};

/// Optional bold markers and an optional colon between a label and its value.
const SEP: &str = r"[ \t]*\**[ \t]*:?[ \t]*\**[ \t]*";

/// A single extraction strategy: a regex whose first capture group is a number.
#[derive(Debug)]
pub struct NumericPattern {
    name: &'static str,
    regex: Regex,
}

impl NumericPattern {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern)
                .unwrap_or_else(|_| panic!("Invalid extractor pattern: {}", pattern)),
        }
    }

    /// First numeric capture in the text. Captures that do not fit a `u32`
    /// count as no match.
    pub fn first(&self, text: &str) -> Option<u32> {
        self.regex
            .captures_iter(text)
            .find_map(|caps| caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
    }

    /// Largest numeric capture over every match in the text.
    pub fn max(&self, text: &str) -> Option<u32> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
            .max()
    }
}

fn first_match(patterns: &[NumericPattern], text: &str) -> Option<u32> {
    patterns.iter().find_map(|p| {
        let found = p.first(text);
        if found.is_some() {
            trace!("pattern '{}' matched {:?}", p.name, found);
        }
        found
    })
}

fn max_merge(patterns: &[NumericPattern], text: &str, current: u32) -> u32 {
    patterns.iter().fold(current, |acc, p| match p.max(text) {
        Some(value) => {
            trace!("pattern '{}' matched {}", p.name, value);
            acc.max(value)
        }
        None => acc,
    })
}

static TOTAL_PATTERNS: Lazy<Vec<NumericPattern>> = Lazy::new(|| {
    vec![
        NumericPattern::new(
            "total-violations-label",
            &format!(r"(?i)total[ \t]+violations(?:[ \t]+found)?{}(\d+)", SEP),
        ),
        NumericPattern::new(
            "n-total-violations",
            r"(?i)\b(\d+)[ \t]+total[ \t]+violations",
        ),
    ]
});

struct SeverityPatterns {
    severity: Severity,
    patterns: Vec<NumericPattern>,
    heading: Regex,
}

static SEVERITY_PATTERNS: Lazy<Vec<SeverityPatterns>> = Lazy::new(|| {
    Severity::ALL
        .iter()
        .map(|severity| {
            let name = severity.label();
            let emoji = regex::escape(severity.emoji());
            SeverityPatterns {
                severity: *severity,
                patterns: vec![
                    NumericPattern::new(
                        "emoji-count-violations",
                        &format!(
                            r"(?i){}[ \t]*\**[ \t]*{}{}(\d+)[ \t]+violations?",
                            emoji, name, SEP
                        ),
                    ),
                    NumericPattern::new(
                        "category-issues",
                        &format!(r"(?i)\b{}[ \t]+issues[ \t]*:[ \t]*\**[ \t]*(\d+)", name),
                    ),
                    NumericPattern::new(
                        "bold-category",
                        &format!(
                            r"(?i)\*\*{}(?:[ \t]+issues)?[ \t]*:?\*\*[ \t]*:?[ \t]*(\d+)",
                            name
                        ),
                    ),
                    NumericPattern::new(
                        "heading-with-count",
                        &format!(
                            r"(?im)^#{{1,6}}[ \t]*(?:{}[ \t]*)?{}(?:[ \t]+issues)?[ \t]*\((\d+)\)",
                            emoji, name
                        ),
                    ),
                ],
                heading: Regex::new(&format!(
                    r"(?i)^(#{{1,6}})[ \t]*(?:{}[ \t]*)?{}\b",
                    emoji, name
                ))
                .unwrap_or_else(|_| panic!("Invalid heading pattern for {}", name)),
            }
        })
        .collect()
});

static SUB_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^###[ \t]*\d+\.").unwrap());

static PAGE_COUNT_PATTERNS: Lazy<Vec<NumericPattern>> = Lazy::new(|| {
    vec![
        NumericPattern::new("scanned-n-pages", r"(?i)scanned[ \t]+(\d+)[ \t]+pages?"),
        NumericPattern::new("n-pages-scanned", r"(?i)\b(\d+)[ \t]+pages?[ \t]+scanned"),
        NumericPattern::new(
            "total-pages",
            &format!(r"(?i)total[ \t]+pages(?:[ \t]+scanned)?{}(\d+)", SEP),
        ),
        NumericPattern::new("pages-scanned", &format!(r"(?i)pages[ \t]+scanned{}(\d+)", SEP)),
    ]
});

static WCAG_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"(?i)WCAG[ \t]*(?:2(?:\.\d)?[ \t]*)?(?:level[ \t]*)?(AAA|AA|A)[ \t]+compliant",
        )
        .unwrap(),
        Regex::new(r"(?i)meets[ \t]+WCAG[ \t]*(?:2(?:\.\d)?[ \t]*)?(?:level[ \t]*)?(AAA|AA|A)\b")
            .unwrap(),
    ]
});

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)duration{}(\d+(?:\.\d+)?)[ \t]*(milliseconds?|ms|minutes?|mins?|m|seconds?|secs?|s)\b",
        SEP
    ))
    .unwrap()
});

pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Derives [`ScanMetadata`] from a markdown report. Never fails: text that
    /// matches nothing yields zero counts and the mode's default page count.
    pub fn parse(report: &str, mode: ScanMode) -> ScanMetadata {
        let mut metadata = ScanMetadata::empty(mode);

        let explicit_total = Self::explicit_total(report).unwrap_or(0);
        let mut counts = Self::severity_counts(report);

        if counts.is_empty() {
            counts = Self::heading_fallback(report);
            if !counts.is_empty() {
                debug!("severity counts taken from section headings: {:?}", counts);
            }
        }

        metadata.violations_by_severity = counts;
        metadata.total_violations = explicit_total.max(counts.sum());

        if mode == ScanMode::Exploration {
            if let Some(pages) = first_match(&PAGE_COUNT_PATTERNS, report) {
                metadata.page_count = pages;
            }
        }

        metadata.wcag_level = Self::wcag_level(report);
        metadata.scan_duration = Self::scan_duration(report);

        debug!(
            "extracted metadata: total={} pages={} wcag={:?}",
            metadata.total_violations, metadata.page_count, metadata.wcag_level
        );

        metadata
    }

    pub fn explicit_total(report: &str) -> Option<u32> {
        first_match(&TOTAL_PATTERNS, report)
    }

    pub fn severity_counts(report: &str) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for entry in SEVERITY_PATTERNS.iter() {
            let merged = max_merge(&entry.patterns, report, counts.get(entry.severity));
            counts.set(entry.severity, merged);
        }
        counts
    }

    /// Counts `### N.` entries inside each severity section. A section runs
    /// from its heading to the next heading of the same or higher level.
    /// Level-1 headings are document titles and never open a section.
    pub fn heading_fallback(report: &str) -> SeverityCounts {
        let lines: Vec<&str> = report.lines().collect();
        let mut counts = SeverityCounts::default();

        for entry in SEVERITY_PATTERNS.iter() {
            let Some((start, level)) = lines.iter().enumerate().find_map(|(idx, line)| {
                entry
                    .heading
                    .captures(line.trim_start())
                    .and_then(|caps| caps.get(1).map(|m| (idx, m.as_str().len())))
                    .filter(|(_, level)| *level >= 2)
            }) else {
                continue;
            };

            let mut entries = 0u32;
            for line in &lines[start + 1..] {
                let trimmed = line.trim_start();
                if SUB_ENTRY.is_match(trimmed) {
                    entries = entries.saturating_add(1);
                    continue;
                }
                if heading_level(trimmed).is_some_and(|l| l <= level) {
                    break;
                }
            }
            counts.set(entry.severity, entries);
        }

        counts
    }

    pub fn wcag_level(report: &str) -> Option<WcagLevel> {
        WCAG_PATTERNS.iter().find_map(|regex| {
            regex
                .captures(report)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<WcagLevel>().ok())
        })
    }

    pub fn scan_duration(report: &str) -> Option<u64> {
        let caps = DURATION_PATTERN.captures(report)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str().to_lowercase();
        let factor = if unit.starts_with("mil") || unit == "ms" {
            1.0
        } else if unit.starts_with('m') {
            60_000.0
        } else {
            1_000.0
        };
        Some((value * factor).round() as u64)
    }
}

fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match line[hashes..].chars().next() {
        Some(c) if c.is_whitespace() => Some(hashes),
        None => Some(hashes),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    const EMOJI_REPORT: &str = "# Accessibility Report\n\n\
        🔴 Critical: 5 violations\n\
        🟠 Serious: 10 violations\n\
        🟡 Moderate: 3 violations\n\
        🔵 Minor: 2 violations\n";

    #[test]
    fn test_emoji_counts_without_total() {
        let metadata = MetadataExtractor::parse(EMOJI_REPORT, ScanMode::Single);

        assert_eq!(metadata.violations_by_severity.critical, 5);
        assert_eq!(metadata.violations_by_severity.serious, 10);
        assert_eq!(metadata.violations_by_severity.moderate, 3);
        assert_eq!(metadata.violations_by_severity.minor, 2);
        assert_eq!(metadata.total_violations, 20);
        assert_eq!(metadata.page_count, 1);
    }

    #[test]
    fn test_explicit_total_dominates_empty_severities() {
        let report = "## Summary\n\n**Total Violations Found:** 15\n\nSee details below.";
        let metadata = MetadataExtractor::parse(report, ScanMode::Single);

        assert_eq!(metadata.total_violations, 15);
        assert!(metadata.violations_by_severity.is_empty());
    }

    #[test]
    fn test_sum_wins_over_smaller_explicit_total() {
        let report = format!("Total Violations: 4\n{}", EMOJI_REPORT);
        let metadata = MetadataExtractor::parse(&report, ScanMode::Single);
        assert_eq!(metadata.total_violations, 20);
    }

    #[rstest]
    #[case("Critical Issues: 3", 3)]
    #[case("**Critical**: 4", 4)]
    #[case("**Critical:** 6", 6)]
    #[case("## 🔴 Critical Issues (7)", 7)]
    #[case("🔴 **Critical**: 1 violation", 1)]
    #[case("critical issues: 2", 2)]
    fn test_critical_pattern_variants(#[case] report: &str, #[case] expected: u32) {
        let counts = MetadataExtractor::severity_counts(report);
        assert_eq!(counts.critical, expected);
    }

    #[test]
    fn test_conflicting_mentions_keep_maximum() {
        let report = "🔴 Critical: 2 violations\n\nLater on: Critical Issues: 5\n**Critical**: 1";
        let counts = MetadataExtractor::severity_counts(report);
        assert_eq!(counts.critical, 5);
    }

    #[test]
    fn test_heading_fallback_counts_sub_entries() {
        let report = "# Report\n\n\
            ## 🔴 Critical Issues\n\n\
            ### 1. Missing alt text\nDetails\n\
            ### 2. Empty button\nDetails\n\n\
            ## 🟠 Serious Issues\n\n\
            ### 1. Low contrast\n\n\
            ## Recommendations\n\n\
            ### 1. Not a violation\n";
        let metadata = MetadataExtractor::parse(report, ScanMode::Single);

        assert_eq!(metadata.violations_by_severity.critical, 2);
        assert_eq!(metadata.violations_by_severity.serious, 1);
        assert_eq!(metadata.violations_by_severity.moderate, 0);
        assert_eq!(metadata.total_violations, 3);
    }

    #[test]
    fn test_heading_fallback_skips_document_title() {
        let report = "# Critical accessibility audit\n\n\
            ## Serious Issues\n\n\
            ### 1. Low contrast\n\
            ### 2. Missing label\n\n\
            ## Minor Issues\n\n\
            ### 1. Redundant title\n";
        let counts = MetadataExtractor::heading_fallback(report);

        assert_eq!(counts.critical, 0);
        assert_eq!(counts.serious, 2);
        assert_eq!(counts.minor, 1);
    }

    #[test]
    fn test_fallback_not_used_when_patterns_match() {
        let report = "Critical Issues: 1\n\n## Serious Issues\n\n### 1. One\n### 2. Two\n";
        let counts = MetadataExtractor::parse(report, ScanMode::Single).violations_by_severity;
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.serious, 0);
    }

    #[test]
    fn test_empty_report_is_all_zero() {
        let single = MetadataExtractor::parse("", ScanMode::Single);
        assert_eq!(single.total_violations, 0);
        assert_eq!(single.page_count, 1);
        assert_eq!(single.wcag_level, None);

        let exploration = MetadataExtractor::parse("nothing useful", ScanMode::Exploration);
        assert_eq!(exploration.page_count, 0);
        assert!(exploration.violations_by_severity.is_empty());
    }

    #[rstest]
    #[case("We scanned 12 pages on this site", 12)]
    #[case("8 pages scanned in total", 8)]
    #[case("**Total Pages:** 5", 5)]
    #[case("Pages Scanned: 9", 9)]
    fn test_page_count_phrases(#[case] report: &str, #[case] expected: u32) {
        let metadata = MetadataExtractor::parse(report, ScanMode::Exploration);
        assert_eq!(metadata.page_count, expected);
    }

    #[test]
    fn test_page_count_ignored_in_single_mode() {
        let metadata = MetadataExtractor::parse("scanned 12 pages", ScanMode::Single);
        assert_eq!(metadata.page_count, 1);
    }

    #[rstest]
    #[case("The site is WCAG AA compliant", Some(WcagLevel::AA))]
    #[case("This page meets WCAG 2.1 AAA", Some(WcagLevel::AAA))]
    #[case("wcag level a compliant", Some(WcagLevel::A))]
    #[case("Not compliant with anything", None)]
    fn test_wcag_level(#[case] report: &str, #[case] expected: Option<WcagLevel>) {
        assert_eq!(MetadataExtractor::wcag_level(report), expected);
    }

    #[test]
    fn test_overflowing_number_is_no_match() {
        let report = "Total Violations: 99999999999999999999";
        assert_eq!(MetadataExtractor::explicit_total(report), None);
        assert_eq!(
            MetadataExtractor::parse(report, ScanMode::Single).total_violations,
            0
        );
    }

    #[rstest]
    #[case("Scan duration: 1500ms", Some(1500))]
    #[case("**Duration:** 2.5s", Some(2500))]
    #[case("Scan Duration: 2 minutes", Some(120_000))]
    #[case("no timing info", None)]
    fn test_scan_duration(#[case] report: &str, #[case] expected: Option<u64>) {
        assert_eq!(MetadataExtractor::scan_duration(report), expected);
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("## Title"), Some(2));
        assert_eq!(heading_level("###"), Some(3));
        assert_eq!(heading_level("#hashtag"), None);
        assert_eq!(heading_level("plain"), None);
    }
}
