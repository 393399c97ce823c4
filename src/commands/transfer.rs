// File: transfer.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{Context, Result};
use log::debug;

use super::{print_success, take};
use crate::cli::{ExportArgs, ImportArgs};
use crate::storage::ScanHistoryStore;

pub async fn execute_export(args: &ExportArgs, store: &ScanHistoryStore) -> Result<()> {
    let json = take(store.export_as_json())?;

    match args.output {
        Some(ref path) => {
            tokio::fs::write(path, &json)
                .await
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            print_success(&format!("History exported to: {}", path.display()));
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn execute_import(args: &ImportArgs, store: &ScanHistoryStore) -> Result<()> {
    let json = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    debug!("importing {} bytes from {}", json.len(), args.file.display());

    take(store.import_from_json(&json))?;
    let count = take(store.get_all())?.len();
    print_success(&format!(
        "Imported history from {} ({} scans)",
        args.file.display(),
        count
    ));
    Ok(())
}
