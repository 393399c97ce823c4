// File: errors.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;

/// Failure reported by a [`StorageBackend`](super::backend::StorageBackend).
#[derive(Debug)]
pub enum BackendError {
    Unavailable(String),
    QuotaExceeded(String),
    Io(std::io::Error),
    Database(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            Self::QuotaExceeded(msg) => write!(f, "Storage quota exceeded: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::Unavailable(error.to_string()),
            _ => Self::Io(error),
        }
    }
}

impl From<sled::Error> for BackendError {
    fn from(error: sled::Error) -> Self {
        match error {
            sled::Error::Io(e) => Self::from(e),
            other => Self::Database(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum StorageError {
    Unavailable(String),
    QuotaExceeded(String),
    NotFound(String),
    InvalidData(String),
    Serialization(serde_json::Error),
    Backend(BackendError),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "Storage is not available: {}", msg),
            Self::QuotaExceeded(msg) => write!(f, "Storage quota exceeded: {}", msg),
            Self::NotFound(id) => write!(f, "Scan not found: {}", id),
            Self::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::Backend(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization(e) => Some(e),
            Self::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

impl From<BackendError> for StorageError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Unavailable(msg) => Self::Unavailable(msg),
            BackendError::QuotaExceeded(msg) => Self::QuotaExceeded(msg),
            other => Self::Backend(other),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
