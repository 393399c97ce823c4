// File: manage.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use colored::*;
use std::io::{self, Write};

use super::{print_info, print_success, print_warning, take};
use crate::cli::{ClearArgs, DeleteArgs, LabelArgs};
use crate::storage::ScanHistoryStore;

pub async fn execute_label(args: &LabelArgs, store: &ScanHistoryStore) -> Result<()> {
    let record = take(store.update_label(&args.id, &args.label))?;
    match record.label {
        Some(ref label) => print_success(&format!("Labelled {} as '{}'", record.id, label)),
        None => print_success(&format!("Removed label from {}", record.id)),
    }
    Ok(())
}

pub async fn execute_delete(args: &DeleteArgs, store: &ScanHistoryStore) -> Result<()> {
    take(store.delete(&args.id))?;
    print_success(&format!("Deleted scan {}", args.id));
    Ok(())
}

pub async fn execute_clear(args: &ClearArgs, store: &ScanHistoryStore) -> Result<()> {
    let count = take(store.get_all())?.len();
    if count == 0 {
        print_info("Scan history is already empty");
        return Ok(());
    }

    if !args.confirm && !confirm_clear(count)? {
        print_warning("Operation cancelled by user");
        return Ok(());
    }

    take(store.clear())?;
    print_success(&format!("Removed {} stored scans", count));
    Ok(())
}

fn confirm_clear(count: usize) -> Result<bool> {
    println!();
    print_warning("This operation will permanently delete the scan history!");
    println!("{} scans will be removed", count.to_string().red());
    println!();

    loop {
        print!("Are you sure you want to continue? [y/N]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            _ => {
                println!("Please enter 'y' for yes or 'n' for no");
                continue;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::storage::{MemoryBackend, ScanMode};

    fn store_with_scan() -> (ScanHistoryStore, String) {
        let store = ScanHistoryStore::new(MemoryBackend::new(), StoreConfig::new());
        let record = store
            .add("https://example.com", ScanMode::Single, "Serious Issues: 3", None, None)
            .into_result()
            .unwrap();
        (store, record.id)
    }

    #[tokio::test]
    async fn test_label_and_delete() {
        let (store, id) = store_with_scan();

        let label = LabelArgs {
            id: id.clone(),
            label: "  release candidate  ".to_string(),
        };
        execute_label(&label, &store).await.unwrap();
        let stored = store.get_by_id(&id).into_result().unwrap();
        assert_eq!(stored.label.as_deref(), Some("release candidate"));

        execute_delete(&DeleteArgs { id: id.clone() }, &store).await.unwrap();
        assert!(store.get_by_id(&id).into_result().is_err());

        let err = execute_delete(&DeleteArgs { id }, &store).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_clear_with_confirm_flag() {
        let (store, _) = store_with_scan();

        execute_clear(&ClearArgs { confirm: true }, &store).await.unwrap();
        assert!(store.get_all().into_result().unwrap().is_empty());

        // Empty history short-circuits before prompting.
        execute_clear(&ClearArgs { confirm: false }, &store).await.unwrap();
    }
}
