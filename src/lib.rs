// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_inception)]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::new_without_default)]

pub mod cli;
pub mod commands;
pub mod comparison;
pub mod config;
pub mod extractor;
pub mod stats;
pub mod storage;
pub mod util;

#[cfg(test)]
mod config_tests;
