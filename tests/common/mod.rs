// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use a11yhistory::config::{BackendKind, StoreConfig};
use a11yhistory::storage::ScanHistoryStore;
use std::path::Path;
use tempfile::TempDir;

pub fn store_config(dir: &Path, backend: BackendKind) -> StoreConfig {
    let mut config = StoreConfig::new();
    config.set_backend(backend);
    config.set_data_dir(Some(dir.to_path_buf()));
    config
}

pub fn open_store(dir: &Path, backend: BackendKind) -> ScanHistoryStore {
    ScanHistoryStore::open(store_config(dir, backend)).expect("store should open")
}

pub fn temp_store(backend: BackendKind) -> (TempDir, ScanHistoryStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = open_store(dir.path(), backend);
    (dir, store)
}

pub fn sample_single_report() -> String {
    r#"# Accessibility Report

**Total Violations:** 9

## Summary

- 🔴 Critical: 2 violations
- 🟠 Serious: 3 violations
- 🟡 Moderate: 1 violation
- 🔵 Minor: 3 violations

WCAG 2.1 AA compliant
Scan duration: 4.5 seconds
"#
    .to_string()
}

pub fn sample_improved_report() -> String {
    r#"# Accessibility Report

Critical Issues: 0
Serious Issues: 1
Moderate Issues: 2
Minor Issues: 1
"#
    .to_string()
}

pub fn sample_exploration_report() -> String {
    r#"# Site Exploration

Scanned 7 pages

## Critical Issues

### 1. Missing alt text
### 2. Empty button

## Minor Issues

### 1. Redundant title
"#
    .to_string()
}
