// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

pub mod backend;
pub mod errors;
pub mod models;
pub mod store;

pub use backend::{open_backend, FileBackend, MemoryBackend, SledBackend, StorageBackend};
pub use errors::{BackendError, StorageError, StorageResult};
pub use models::*;
pub use store::{FilterCriteria, QuotaInfo, ScanHistoryStore, StoreResult};
