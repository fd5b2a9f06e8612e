// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! provenance-cli library
//!
//! This module exports the configuration and reports of the `provenance`
//! binary for use in integration tests and as a library.

pub mod changelog;
pub mod check;
pub mod config;
pub mod contributors;
pub mod info;
pub mod report;
