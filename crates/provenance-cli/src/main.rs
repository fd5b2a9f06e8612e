// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! provenance: build metadata and history reports from git
//!
//! This binary prints build information, changelogs, contributor lists and
//! release checks for the repository it is run in.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use provenance_cli::config::Config;
use provenance_cli::report;

fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to stderr so report output on stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    config.validate().context("Invalid configuration")?;
    debug!(?config, "Starting provenance");

    match report::run(&config).context("Report failed")? {
        Some(output) => print!("{output}"),
        None => info!("Report skipped"),
    }

    Ok(())
}
