// File: config.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const STORAGE_KEY: &str = "a11y-scan-history";
pub const STORAGE_LIMIT_BYTES: u64 = 5 * 1024 * 1024;
pub const WARNING_THRESHOLD: f64 = 0.8;
pub const AGGRESSIVE_PRUNE_THRESHOLD: f64 = 0.95;
pub const MAX_SCANS: usize = 50;
pub const PRUNE_RATIO: f64 = 0.5;
pub const MAX_LABEL_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    File,
    Sled,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "json" => Ok(BackendKind::File),
            "sled" => Ok(BackendKind::Sled),
            other => Err(format!("Unsupported storage backend: {}", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => write!(f, "file"),
            BackendKind::Sled => write!(f, "sled"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    storage_key: String,
    storage_limit: u64,
    warning_threshold: f64,
    aggressive_prune_threshold: f64,
    max_scans: usize,
    prune_ratio: f64,
    backend: BackendKind,
    data_dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            storage_limit: STORAGE_LIMIT_BYTES,
            warning_threshold: WARNING_THRESHOLD,
            aggressive_prune_threshold: AGGRESSIVE_PRUNE_THRESHOLD,
            max_scans: MAX_SCANS,
            prune_ratio: PRUNE_RATIO,
            backend: BackendKind::File,
            data_dir: None,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn set_storage_key(&mut self, key: &str) {
        self.storage_key = key.to_string();
    }

    pub fn storage_limit(&self) -> u64 {
        self.storage_limit
    }

    pub fn set_storage_limit(&mut self, limit: u64) {
        self.storage_limit = limit;
    }

    pub fn warning_threshold(&self) -> f64 {
        self.warning_threshold
    }

    pub fn set_warning_threshold(&mut self, threshold: f64) {
        self.warning_threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn aggressive_prune_threshold(&self) -> f64 {
        self.aggressive_prune_threshold
    }

    pub fn set_aggressive_prune_threshold(&mut self, threshold: f64) {
        self.aggressive_prune_threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn max_scans(&self) -> usize {
        self.max_scans
    }

    pub fn set_max_scans(&mut self, max_scans: usize) {
        self.max_scans = max_scans.max(1);
    }

    pub fn prune_ratio(&self) -> f64 {
        self.prune_ratio
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn set_backend(&mut self, backend: BackendKind) {
        self.backend = backend;
    }

    pub fn data_dir(&self) -> Option<&PathBuf> {
        self.data_dir.as_ref()
    }

    pub fn set_data_dir(&mut self, dir: Option<PathBuf>) {
        self.data_dir = dir;
    }

    /// Directory holding the history, falling back to the platform's local
    /// data directory.
    pub fn resolve_data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("a11yhistory"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
