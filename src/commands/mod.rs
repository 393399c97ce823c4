// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use colored::*;

use crate::cli::Commands;
use crate::storage::{ScanHistoryStore, StoreResult};

pub mod compare;
pub mod history;
pub mod manage;
pub mod record;
pub mod stats;
pub mod transfer;

pub async fn dispatch(command: &Commands, store: &ScanHistoryStore) -> Result<()> {
    match command {
        Commands::Record(args) => record::execute(args, store).await,
        Commands::List(args) => history::execute_list(args, store).await,
        Commands::Show(args) => history::execute_show(args, store).await,
        Commands::Compare(args) => compare::execute(args, store).await,
        Commands::Label(args) => manage::execute_label(args, store).await,
        Commands::Delete(args) => manage::execute_delete(args, store).await,
        Commands::Clear(args) => manage::execute_clear(args, store).await,
        Commands::Export(args) => transfer::execute_export(args, store).await,
        Commands::Import(args) => transfer::execute_import(args, store).await,
        Commands::Quota => stats::execute_quota(store).await,
        Commands::Stats(args) => stats::execute(args, store).await,
    }
}

/// Unwraps a store result, printing its warning and turning a failure into an
/// error for the caller.
fn take<T>(result: StoreResult<T>) -> Result<T> {
    if let Some(ref warning) = result.warning {
        print_warning(warning);
    }
    result.into_result().map_err(anyhow::Error::msg)
}

fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

fn colored_count(count: u32) -> ColoredString {
    if count == 0 {
        count.to_string().green()
    } else {
        count.to_string().normal()
    }
}

fn colored_score(score: u32) -> ColoredString {
    match score {
        90..=100 => score.to_string().green(),
        70..=89 => score.to_string().yellow(),
        _ => score.to_string().red(),
    }
}
