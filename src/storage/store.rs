// File: store.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::Value;

use super::backend::{open_backend, StorageBackend};
use super::errors::{BackendError, StorageError, StorageResult};
use super::models::{ScanHistory, ScanMode, ScanRecord, SCHEMA_VERSION};
use crate::comparison::{self, ScanComparison};
use crate::config::{StoreConfig, MAX_LABEL_LENGTH};
use crate::extractor::MetadataExtractor;
use crate::util::{estimate_size, generate_scan_id};

const PROBE_KEY: &str = "__storage_test__";

/// Uniform outcome of every store operation.
#[derive(Debug, Clone, Serialize)]
pub struct StoreResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T> StoreResult<T> {
    pub fn ok(data: T) -> Self {
        Self::ok_with_warning(data, None)
    }

    pub fn ok_with_warning(data: T, warning: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            warning,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            warning: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.success
    }

    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .error
                .unwrap_or_else(|| "Unknown storage error".to_string())),
        }
    }
}

impl<T> From<StorageResult<(T, Option<String>)>> for StoreResult<T> {
    fn from(result: StorageResult<(T, Option<String>)>) -> Self {
        match result {
            Ok((data, warning)) => Self::ok_with_warning(data, warning),
            Err(e) => {
                error!("scan history operation failed: {}", e);
                Self::fail(e.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
    pub used: u64,
    pub limit: u64,
    pub percentage_used: f64,
    pub scan_count: usize,
}

/// All set criteria must hold. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub url: Option<String>,
    pub mode: Option<ScanMode>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub min_violations: Option<u32>,
    pub max_violations: Option<u32>,
}

impl FilterCriteria {
    pub fn matches(&self, record: &ScanRecord) -> bool {
        if let Some(ref url) = self.url {
            if !url_contains(&record.url, url) {
                return false;
            }
        }

        if let Some(mode) = self.mode {
            if record.mode != mode {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if record.timestamp < from {
                return false;
            }
        }

        if let Some(to) = self.date_to {
            if record.timestamp > to {
                return false;
            }
        }

        let total = record.total_violations();
        if self.min_violations.is_some_and(|min| total < min) {
            return false;
        }
        if self.max_violations.is_some_and(|max| total > max) {
            return false;
        }

        true
    }
}

fn url_contains(url: &str, needle: &str) -> bool {
    url.to_lowercase().contains(&needle.to_lowercase())
}

/// Trims and caps a user label. An empty result clears the label.
pub fn sanitize_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_LABEL_LENGTH).collect())
}

/// Versioned, size-bounded scan history persisted as one JSON blob under a
/// single key of the injected backend. Every mutation is a full
/// load-mutate-persist cycle.
pub struct ScanHistoryStore {
    backend: Box<dyn StorageBackend>,
    config: StoreConfig,
}

impl ScanHistoryStore {
    pub fn new<B: StorageBackend + 'static>(backend: B, config: StoreConfig) -> Self {
        Self {
            backend: Box::new(backend),
            config,
        }
    }

    pub fn open(config: StoreConfig) -> StorageResult<Self> {
        let backend = open_backend(&config)?;
        Ok(Self { backend, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn get_quota(&self) -> StoreResult<QuotaInfo> {
        let limit = self.config.storage_limit();
        let used = if self.is_available() {
            self.backend
                .get(self.config.storage_key())
                .ok()
                .flatten()
                .map(|raw| estimate_size(&raw))
                .unwrap_or(0)
        } else {
            0
        };

        StoreResult::ok(QuotaInfo {
            used,
            limit,
            percentage_used: percentage_of(used, limit),
            scan_count: self.load().len(),
        })
    }

    pub fn get_all(&self) -> StoreResult<Vec<ScanRecord>> {
        StoreResult::ok(self.load().scans)
    }

    pub fn get_by_id(&self, id: &str) -> StoreResult<ScanRecord> {
        self.load()
            .find(id)
            .cloned()
            .map(StoreResult::ok)
            .unwrap_or_else(|| StoreResult::fail(StorageError::NotFound(id.to_string()).to_string()))
    }

    pub fn get_by_url(&self, url: &str, exact_match: bool) -> StoreResult<Vec<ScanRecord>> {
        let scans = self
            .load()
            .scans
            .into_iter()
            .filter(|s| {
                if exact_match {
                    s.url == url
                } else {
                    url_contains(&s.url, url)
                }
            })
            .collect();
        StoreResult::ok(scans)
    }

    pub fn filter(&self, criteria: &FilterCriteria) -> StoreResult<Vec<ScanRecord>> {
        let scans = self
            .load()
            .scans
            .into_iter()
            .filter(|s| criteria.matches(s))
            .collect();
        StoreResult::ok(scans)
    }

    pub fn add(
        &self,
        url: &str,
        mode: ScanMode,
        report: &str,
        label: Option<&str>,
        discovered_urls: Option<Vec<String>>,
    ) -> StoreResult<ScanRecord> {
        self.mutate(|history, max_scans| {
            let record = ScanRecord {
                id: generate_scan_id(),
                url: url.to_string(),
                mode,
                timestamp: Utc::now(),
                report: report.to_string(),
                metadata: MetadataExtractor::parse(report, mode),
                label: label.and_then(sanitize_label),
                discovered_urls: match mode {
                    ScanMode::Exploration => discovered_urls,
                    ScanMode::Single => None,
                },
            };

            history.scans.insert(0, record.clone());
            if history.scans.len() > max_scans {
                debug!(
                    "dropping {} oldest scans over the {} scan limit",
                    history.scans.len() - max_scans,
                    max_scans
                );
                history.scans.truncate(max_scans);
            }
            info!(
                "recorded {} scan {} for {} ({} violations)",
                record.mode, record.id, record.url, record.metadata.total_violations
            );
            Ok(record)
        })
    }

    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.mutate(|history, _| {
            let index = history
                .position(id)
                .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
            history.scans.remove(index);
            Ok(())
        })
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.mutate(|history, _| {
            *history = ScanHistory::new();
            Ok(())
        })
    }

    pub fn update_label(&self, id: &str, label: &str) -> StoreResult<ScanRecord> {
        self.mutate(|history, _| {
            let index = history
                .position(id)
                .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
            let updated = history.scans[index].with_label(sanitize_label(label));
            history.scans[index] = updated.clone();
            Ok(updated)
        })
    }

    pub fn export_as_json(&self) -> StoreResult<String> {
        match serde_json::to_string_pretty(&self.load()) {
            Ok(json) => StoreResult::ok(json),
            Err(e) => StoreResult::fail(StorageError::from(e).to_string()),
        }
    }

    pub fn import_from_json(&self, json: &str) -> StoreResult<()> {
        let result = (|| -> StorageResult<((), Option<String>)> {
            let mut history = parse_history(json)?;
            history.sort_most_recent_first();
            history.scans.truncate(self.config.max_scans());
            self.ensure_writable()?;
            let warning = self.persist(&mut history)?;
            info!("imported {} scans", history.len());
            Ok(((), warning))
        })();
        result.into()
    }

    /// The two most recent scans of exactly `url`, as (baseline, current).
    pub fn latest_pair_for_url(&self, url: &str) -> StoreResult<(ScanRecord, ScanRecord)> {
        let mut scans = self
            .load()
            .scans
            .into_iter()
            .filter(|s| s.url == url);
        match (scans.next(), scans.next()) {
            (Some(current), Some(baseline)) => StoreResult::ok((baseline, current)),
            (Some(_), None) => StoreResult::fail(format!(
                "Only one scan of {} is stored; two are needed to compare",
                url
            )),
            _ => StoreResult::fail(format!("No scans of {} are stored", url)),
        }
    }

    /// Looks up both records and compares them. Validation warnings are
    /// passed through; comparing a scan with itself fails.
    pub fn compare(&self, baseline_id: &str, current_id: &str) -> StoreResult<ScanComparison> {
        let history = self.load();
        let (baseline, current) = match (history.find(baseline_id), history.find(current_id)) {
            (Some(b), Some(c)) => (b, c),
            (None, _) => {
                return StoreResult::fail(StorageError::NotFound(baseline_id.to_string()).to_string())
            }
            (_, None) => {
                return StoreResult::fail(StorageError::NotFound(current_id.to_string()).to_string())
            }
        };

        let validation = comparison::validate_comparison(baseline, current);
        if !validation.valid {
            return StoreResult::fail(validation.error.unwrap_or_default());
        }
        StoreResult::ok_with_warning(comparison::compare(baseline, current), validation.warning)
    }

    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut ScanHistory, usize) -> StorageResult<T>,
    ) -> StoreResult<T> {
        let result = (|| -> StorageResult<(T, Option<String>)> {
            self.ensure_writable()?;
            let mut history = self.load();
            let value = apply(&mut history, self.config.max_scans())?;
            let warning = self.persist(&mut history)?;
            Ok((value, warning))
        })();
        result.into()
    }

    fn is_available(&self) -> bool {
        let probe = self
            .backend
            .set(PROBE_KEY, PROBE_KEY)
            .and_then(|_| self.backend.remove(PROBE_KEY));
        match probe {
            Ok(()) => true,
            // A full backend can still be read, and a write gets to prune.
            Err(BackendError::QuotaExceeded(msg)) => {
                debug!("{} storage probe hit quota: {}", self.backend.name(), msg);
                true
            }
            Err(e) => {
                debug!("{} storage probe failed: {}", self.backend.name(), e);
                false
            }
        }
    }

    fn ensure_writable(&self) -> StorageResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StorageError::Unavailable(format!(
                "the {} backend rejected a test write; scan history cannot be saved",
                self.backend.name()
            )))
        }
    }

    /// Current history, or an empty one when storage is unavailable, empty or
    /// unreadable.
    fn load(&self) -> ScanHistory {
        if !self.is_available() {
            warn!("storage unavailable, using empty scan history");
            return ScanHistory::new();
        }

        match self.backend.get(self.config.storage_key()) {
            Ok(None) => ScanHistory::new(),
            Ok(Some(raw)) => parse_history(&raw).unwrap_or_else(|e| {
                warn!("discarding corrupt scan history: {}", e);
                ScanHistory::new()
            }),
            Err(e) => {
                warn!("failed to read scan history: {}", e);
                ScanHistory::new()
            }
        }
    }

    fn persist(&self, history: &mut ScanHistory) -> StorageResult<Option<String>> {
        let limit = self.config.storage_limit();
        let key = self.config.storage_key();
        let mut pruned = 0;

        history.last_modified = Utc::now();
        let mut serialized = serde_json::to_string(&*history)?;

        if estimate_size(&serialized) > limit {
            pruned += self.prune(history);
            serialized = serde_json::to_string(&*history)?;
            let size = estimate_size(&serialized);
            if size > limit {
                return Err(StorageError::QuotaExceeded(format!(
                    "history needs {} bytes but the limit is {} bytes even after pruning",
                    size, limit
                )));
            }
        }

        match self.backend.set(key, &serialized) {
            Ok(()) => {}
            Err(BackendError::QuotaExceeded(msg)) => {
                warn!("storage rejected write ({}), pruning and retrying once", msg);
                pruned += self.prune(history);
                serialized = serde_json::to_string(&*history)?;
                self.backend.set(key, &serialized)?;
            }
            Err(e) => return Err(e.into()),
        }

        let mut warnings = Vec::new();
        if pruned > 0 {
            warnings.push(format!(
                "{} older scans were removed to free storage space",
                pruned
            ));
        }
        if let Some(usage) = self.usage_warning(estimate_size(&serialized)) {
            warnings.push(usage);
        }

        Ok(if warnings.is_empty() {
            None
        } else {
            Some(warnings.join(". "))
        })
    }

    /// Keeps the most recent share of scans given by the prune ratio, never
    /// fewer than one. Returns how many were removed.
    fn prune(&self, history: &mut ScanHistory) -> usize {
        let before = history.len();
        let keep = ((before as f64 * self.config.prune_ratio()).floor() as usize).max(1);
        history.sort_most_recent_first();
        history.scans.truncate(keep);
        let removed = before - history.len();
        if removed > 0 {
            warn!("pruned {} of {} scans to stay within storage quota", removed, before);
        }
        removed
    }

    fn usage_warning(&self, used: u64) -> Option<String> {
        let limit = self.config.storage_limit();
        let percentage = percentage_of(used, limit);

        if percentage >= self.config.aggressive_prune_threshold() * 100.0 {
            Some(format!(
                "Storage is nearly full ({:.1}% used); older scans will be pruned when the limit is reached. Consider exporting your history",
                percentage
            ))
        } else if percentage > self.config.warning_threshold() * 100.0 {
            Some(format!(
                "Storage is {:.1}% full. Consider exporting and clearing old scans",
                percentage
            ))
        } else {
            None
        }
    }
}

fn percentage_of(used: u64, limit: u64) -> f64 {
    if limit == 0 {
        return 100.0;
    }
    (used as f64 / limit as f64 * 100.0).clamp(0.0, 100.0)
}

/// Parses and shape-checks a history blob, migrating older versions.
fn parse_history(raw: &str) -> StorageResult<ScanHistory> {
    let mut value: Value = serde_json::from_str(raw)
        .map_err(|e| StorageError::InvalidData(format!("malformed JSON: {}", e)))?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| StorageError::InvalidData("expected a JSON object".to_string()))?;

    if !object.get("version").is_some_and(Value::is_u64) {
        return Err(StorageError::InvalidData(
            "missing or non-numeric 'version'".to_string(),
        ));
    }
    if !object.get("scans").is_some_and(Value::is_array) {
        return Err(StorageError::InvalidData(
            "'scans' must be an array".to_string(),
        ));
    }
    if !object.contains_key("lastModified") {
        object.insert(
            "lastModified".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }

    let mut history: ScanHistory = serde_json::from_value(value)
        .map_err(|e| StorageError::InvalidData(format!("invalid scan history: {}", e)))?;

    if history.version != SCHEMA_VERSION {
        migrate(&mut history);
    }
    Ok(history)
}

/// Brings an older blob up to [`SCHEMA_VERSION`]. No format change exists yet,
/// so records are kept as they are.
fn migrate(history: &mut ScanHistory) {
    info!(
        "migrating scan history from version {} to {}",
        history.version, SCHEMA_VERSION
    );
    history.version = SCHEMA_VERSION;
}
