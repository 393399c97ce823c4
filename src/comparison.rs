// File: comparison.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Deterministic diff between two stored scans. Everything here is pure: no
//! storage access, no clock, no failure path.

use serde::Serialize;

use crate::storage::models::{ScanRecord, Severity, SeverityCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountDiff {
    pub baseline: u32,
    pub current: u32,
    pub fixed: u32,
    pub new: u32,
    pub unchanged: u32,
}

impl CountDiff {
    pub fn between(baseline: u32, current: u32) -> Self {
        Self {
            baseline,
            current,
            fixed: baseline.saturating_sub(current),
            new: current.saturating_sub(baseline),
            unchanged: baseline.min(current),
        }
    }

    pub fn delta(&self) -> i64 {
        self.current as i64 - self.baseline as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallDiff {
    #[serde(flatten)]
    pub counts: CountDiff,
    pub percentage_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityDiffs {
    pub critical: CountDiff,
    pub serious: CountDiff,
    pub moderate: CountDiff,
    pub minor: CountDiff,
}

impl SeverityDiffs {
    fn between(baseline: &SeverityCounts, current: &SeverityCounts) -> Self {
        let diff = |s: Severity| CountDiff::between(baseline.get(s), current.get(s));
        Self {
            critical: diff(Severity::Critical),
            serious: diff(Severity::Serious),
            moderate: diff(Severity::Moderate),
            minor: diff(Severity::Minor),
        }
    }

    pub fn get(&self, severity: Severity) -> &CountDiff {
        match severity {
            Severity::Critical => &self.critical,
            Severity::Serious => &self.serious,
            Severity::Moderate => &self.moderate,
            Severity::Minor => &self.minor,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Severity, &CountDiff)> + '_ {
        Severity::ALL.iter().map(move |s| (*s, self.get(*s)))
    }

    pub fn total_fixed(&self) -> u32 {
        self.iter().fold(0u32, |acc, (_, d)| acc.saturating_add(d.fixed))
    }

    pub fn total_new(&self) -> u32 {
        self.iter().fold(0u32, |acc, (_, d)| acc.saturating_add(d.new))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanComparison {
    pub baseline: ScanRecord,
    pub current: ScanRecord,
    pub overall: OverallDiff,
    pub by_severity: SeverityDiffs,
    pub baseline_score: u32,
    pub current_score: u32,
    pub elapsed_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub fn compare(baseline: &ScanRecord, current: &ScanRecord) -> ScanComparison {
    let counts = CountDiff::between(baseline.total_violations(), current.total_violations());
    let overall = OverallDiff {
        counts,
        percentage_change: percentage_change(counts.baseline, counts.current),
    };

    ScanComparison {
        baseline: baseline.clone(),
        current: current.clone(),
        overall,
        by_severity: SeverityDiffs::between(
            &baseline.metadata.violations_by_severity,
            &current.metadata.violations_by_severity,
        ),
        baseline_score: quality_score(baseline),
        current_score: quality_score(current),
        elapsed_seconds: (current.timestamp - baseline.timestamp).num_seconds(),
    }
}

/// Relative change of the total, one decimal place. A zero baseline yields
/// exactly 100 when violations appeared and 0 when there are none.
pub fn percentage_change(baseline: u32, current: u32) -> f64 {
    if baseline == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    let change = (current as f64 - baseline as f64) / baseline as f64 * 100.0;
    (change * 10.0).round() / 10.0
}

pub fn is_improvement(comparison: &ScanComparison) -> bool {
    comparison.overall.counts.current < comparison.overall.counts.baseline
}

pub fn is_regression(comparison: &ScanComparison) -> bool {
    comparison.overall.counts.current > comparison.overall.counts.baseline
}

fn violations(count: u32) -> String {
    if count == 1 {
        "1 violation".to_string()
    } else {
        format!("{} violations", count)
    }
}

pub fn summary(comparison: &ScanComparison) -> String {
    let CountDiff {
        baseline,
        current,
        fixed,
        new,
        ..
    } = comparison.overall.counts;

    if baseline == 0 && current == 0 {
        return "No violations in either scan".to_string();
    }
    if current == 0 {
        return format!("All {} fixed", violations(baseline));
    }
    if baseline == 0 {
        return format!("{} new {} detected", current, plural_word(current));
    }
    if baseline == current {
        return format!("No change ({} in both scans)", violations(current));
    }

    let fixed_by_severity = comparison.by_severity.total_fixed();
    let new_by_severity = comparison.by_severity.total_new();

    match (fixed_by_severity, new_by_severity) {
        (f, n) if f > 0 && n > 0 => format!("{} fixed, {} new", f, n),
        (f, _) if f > 0 => format!("{} fixed", violations(f)),
        (_, n) if n > 0 => format!("{} new {}", n, plural_word(n)),
        _ if fixed > 0 => format!("{} fixed", violations(fixed)),
        _ => format!("{} new {}", new, plural_word(new)),
    }
}

fn plural_word(count: u32) -> &'static str {
    if count == 1 {
        "violation"
    } else {
        "violations"
    }
}

/// Severity with the largest absolute change. Ties go to the higher severity;
/// `None` when nothing changed.
pub fn most_significant_change(comparison: &ScanComparison) -> Option<Severity> {
    let mut best: Option<(Severity, u64)> = None;
    for (severity, diff) in comparison.by_severity.iter() {
        let magnitude = diff.delta().unsigned_abs();
        if magnitude == 0 {
            continue;
        }
        match best {
            Some((_, top)) if top >= magnitude => {}
            _ => best = Some((severity, magnitude)),
        }
    }
    best.map(|(severity, _)| severity)
}

/// 0..=100 health metric: 100 minus the weighted violation count, floored at 0.
pub fn quality_score(record: &ScanRecord) -> u32 {
    let counts = &record.metadata.violations_by_severity;
    let penalty: u64 = Severity::ALL
        .iter()
        .map(|s| s.weight() as u64 * counts.get(*s) as u64)
        .sum();
    100u64.saturating_sub(penalty) as u32
}

/// Positive when `current` scores better than `baseline`.
pub fn compare_quality_scores(baseline: &ScanRecord, current: &ScanRecord) -> i32 {
    quality_score(current) as i32 - quality_score(baseline) as i32
}

pub fn validate_comparison(a: &ScanRecord, b: &ScanRecord) -> ComparisonValidation {
    if a.id == b.id {
        return ComparisonValidation {
            valid: false,
            error: Some("Cannot compare a scan with itself".to_string()),
            warning: None,
        };
    }

    let mut warnings = Vec::new();
    if a.url != b.url {
        warnings.push(format!(
            "Comparing scans of different URLs: {} vs {}",
            a.url, b.url
        ));
    }
    if a.mode != b.mode {
        warnings.push(format!(
            "Comparing scans with different modes: {} vs {}",
            a.mode, b.mode
        ));
    }

    ComparisonValidation {
        valid: true,
        error: None,
        warning: if warnings.is_empty() {
            None
        } else {
            Some(warnings.join("; "))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{ScanMetadata, ScanMode};
    use chrono::{Duration, Utc};
    use rstest::*;

    fn record(id: &str, url: &str, counts: [u32; 4], total: Option<u32>) -> ScanRecord {
        let violations_by_severity = SeverityCounts {
            critical: counts[0],
            serious: counts[1],
            moderate: counts[2],
            minor: counts[3],
        };
        ScanRecord {
            id: id.to_string(),
            url: url.to_string(),
            mode: ScanMode::Single,
            timestamp: Utc::now(),
            report: String::new(),
            metadata: ScanMetadata {
                total_violations: total
                    .unwrap_or(0)
                    .max(violations_by_severity.sum()),
                violations_by_severity,
                page_count: 1,
                wcag_level: None,
                scan_duration: None,
            },
            label: None,
            discovered_urls: None,
        }
    }

    #[rstest]
    #[case(0, 0, 0.0)]
    #[case(0, 5, 100.0)]
    #[case(20, 9, -55.0)]
    #[case(10, 10, 0.0)]
    #[case(4, 8, 100.0)]
    fn test_percentage_change_exact(#[case] baseline: u32, #[case] current: u32, #[case] expected: f64) {
        assert_eq!(percentage_change(baseline, current), expected);
    }

    #[test]
    fn test_percentage_change_rounds_to_one_decimal() {
        assert!((percentage_change(7, 20) - 185.7).abs() < 1e-9);
    }

    #[test]
    fn test_compare_overall_and_severity_counts() {
        let baseline = record("a", "https://x.io", [2, 4, 1, 0], None);
        let mut current = record("b", "https://x.io", [0, 6, 1, 3], None);
        current.timestamp = baseline.timestamp + Duration::hours(2);

        let cmp = compare(&baseline, &current);

        assert_eq!(cmp.overall.counts.baseline, 7);
        assert_eq!(cmp.overall.counts.current, 10);
        assert_eq!(cmp.overall.counts.new, 3);
        assert_eq!(cmp.overall.counts.fixed, 0);
        assert_eq!(cmp.overall.counts.unchanged, 7);
        assert_eq!(cmp.by_severity.critical.fixed, 2);
        assert_eq!(cmp.by_severity.serious.new, 2);
        assert_eq!(cmp.by_severity.moderate.unchanged, 1);
        assert_eq!(cmp.by_severity.minor.new, 3);
        assert_eq!(cmp.elapsed_seconds, 7200);
        assert!(is_regression(&cmp));
        assert!(!is_improvement(&cmp));
        assert_eq!(summary(&cmp), "2 fixed, 5 new");
    }

    #[test]
    fn test_fixed_and_new_are_reciprocal() {
        let a = record("a", "u", [1, 5, 0, 2], Some(12));
        let b = record("b", "u", [3, 1, 4, 0], None);

        let forward = compare(&a, &b);
        let backward = compare(&b, &a);

        assert_eq!(forward.overall.counts.new, backward.overall.counts.fixed);
        assert_eq!(forward.overall.counts.fixed, backward.overall.counts.new);
        for severity in Severity::ALL {
            assert_eq!(
                forward.by_severity.get(severity).new,
                backward.by_severity.get(severity).fixed
            );
        }
    }

    #[rstest]
    #[case([0, 0, 0, 0], [0, 0, 0, 0], "No violations in either scan")]
    #[case([1, 2, 0, 0], [0, 0, 0, 0], "All 3 violations fixed")]
    #[case([0, 0, 0, 0], [0, 0, 4, 0], "4 new violations detected")]
    #[case([1, 0, 0, 0], [0, 1, 0, 0], "No change (1 violation in both scans)")]
    #[case([3, 2, 0, 0], [1, 2, 0, 0], "2 violations fixed")]
    #[case([1, 0, 0, 0], [1, 0, 0, 1], "1 new violation")]
    fn test_summary_cases(#[case] base: [u32; 4], #[case] cur: [u32; 4], #[case] expected: &str) {
        let cmp = compare(&record("a", "u", base, None), &record("b", "u", cur, None));
        assert_eq!(summary(&cmp), expected);
    }

    #[test]
    fn test_summary_falls_back_to_totals_without_severity_detail() {
        let cmp = compare(
            &record("a", "u", [0, 0, 0, 0], Some(15)),
            &record("b", "u", [0, 0, 0, 0], Some(10)),
        );
        assert_eq!(summary(&cmp), "5 violations fixed");
    }

    #[test]
    fn test_summary_saturates_huge_counts() {
        let cmp = compare(
            &record("a", "u", [4_000_000_000, 4_000_000_000, 0, 0], None),
            &record("b", "u", [0, 0, 0, 1], None),
        );
        assert_eq!(cmp.by_severity.total_fixed(), u32::MAX);
        assert_eq!(cmp.by_severity.total_new(), 1);
        assert_eq!(summary(&cmp), format!("{} fixed, 1 new", u32::MAX));
        assert!(is_improvement(&cmp));
    }

    #[test]
    fn test_most_significant_change() {
        let cmp = compare(
            &record("a", "u", [1, 5, 0, 0], None),
            &record("b", "u", [4, 2, 0, 0], None),
        );
        // critical and serious both moved by 3; critical comes first
        assert_eq!(most_significant_change(&cmp), Some(Severity::Critical));

        let cmp = compare(
            &record("a", "u", [1, 1, 1, 1], None),
            &record("b", "u", [1, 1, 9, 1], None),
        );
        assert_eq!(most_significant_change(&cmp), Some(Severity::Moderate));

        let cmp = compare(
            &record("a", "u", [2, 0, 0, 0], None),
            &record("b", "u", [2, 0, 0, 0], None),
        );
        assert_eq!(most_significant_change(&cmp), None);
    }

    #[rstest]
    #[case([0, 0, 0, 0], 100)]
    #[case([1, 0, 0, 0], 90)]
    #[case([0, 2, 3, 4], 80)]
    #[case([10, 0, 0, 0], 0)]
    #[case([50, 50, 50, 50], 0)]
    fn test_quality_score(#[case] counts: [u32; 4], #[case] expected: u32) {
        assert_eq!(quality_score(&record("a", "u", counts, None)), expected);
    }

    #[test]
    fn test_quality_score_is_monotonic() {
        for severity in Severity::ALL {
            let mut previous = 100;
            for n in 0..15 {
                let mut r = record("a", "u", [0, 0, 0, 0], None);
                r.metadata.violations_by_severity.set(severity, n);
                let score = quality_score(&r);
                assert!(score <= previous);
                assert!(score <= 100);
                previous = score;
            }
        }
    }

    #[test]
    fn test_critical_dominates_score() {
        let critical = record("a", "u", [1, 0, 0, 0], None);
        let minors = record("b", "u", [0, 0, 0, 9], None);
        assert!(quality_score(&critical) < quality_score(&minors));
        assert_eq!(compare_quality_scores(&critical, &minors), 1);
        assert_eq!(compare_quality_scores(&minors, &critical), -1);
    }

    #[test]
    fn test_validate_comparison() {
        let a = record("a", "https://x.io", [0, 0, 0, 0], None);
        let same = validate_comparison(&a, &a);
        assert!(!same.valid);
        assert_eq!(same.error.as_deref(), Some("Cannot compare a scan with itself"));

        let b = record("b", "https://x.io", [0, 0, 0, 0], None);
        let ok = validate_comparison(&a, &b);
        assert!(ok.valid);
        assert!(ok.warning.is_none());

        let other_url = record("c", "https://y.io", [0, 0, 0, 0], None);
        let warned = validate_comparison(&a, &other_url);
        assert!(warned.valid);
        assert!(warned.warning.unwrap().contains("different URLs"));

        let mut other_mode = record("d", "https://x.io", [0, 0, 0, 0], None);
        other_mode.mode = ScanMode::Exploration;
        let warned = validate_comparison(&a, &other_mode);
        assert!(warned.valid);
        assert!(warned.warning.unwrap().contains("different modes"));
    }
}
