// File: main.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use a11yhistory::cli::Cli;
use a11yhistory::commands;
use a11yhistory::storage::ScanHistoryStore;
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Warn)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = SimpleLogger::new()
        .with_level(parse_level(&cli.log_level))
        .init()
    {
        eprintln!("Failed to initialize logger: {}", e);
    }

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = cli.store_config().map_err(anyhow::Error::msg)?;
    let store = ScanHistoryStore::open(config).context("Failed to open scan history")?;
    log::debug!("using {} backend", store.backend_name());
    commands::dispatch(&cli.command, &store).await
}
