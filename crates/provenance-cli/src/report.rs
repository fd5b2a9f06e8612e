// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Report dispatch
//!
//! Opens the configured repository, applies the skip rules for missing
//! repositories and unborn branches, and hands the handle to the selected
//! report.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use provenance_cli::config::Config;
//! use provenance_cli::report;
//!
//! let config = Config::parse_from(["provenance", "changelog"]);
//! if let Some(output) = report::run(&config).expect("report") {
//!     print!("{output}");
//! }
//! ```

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};
use provenance_git::{GitError, GitErrorKind, GitRepository, open_repository};
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::changelog::{self, ChangelogOptions};
use crate::check::{self, CheckOptions};
use crate::config::{Command, Config};
use crate::contributors::{self, ContributorOptions};
use crate::info;

// ============================================================================
// Error Types
// ============================================================================

/// Report errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// Git error
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Invalid regular expression in an option
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unusable `strftime` format
    #[error("Invalid date format: {0}")]
    DateFormat(String),

    /// No repository path given and the current directory is unknown
    #[error("Current directory is unavailable and no --repository was given")]
    NoWorkingDirectory,

    /// One or more release checks failed
    #[error("{count} check(s) failed: {summary}")]
    ChecksFailed {
        /// Number of failed checks
        count: usize,
        /// Failure messages joined with `; `
        summary: String,
    },
}

// ============================================================================
// Shared helpers
// ============================================================================

/// A validated `strftime` pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    /// Validate `pattern`
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::DateFormat`] if chrono rejects a specifier.
    pub fn parse(pattern: &str) -> Result<Self, ReportError> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ReportError::DateFormat(pattern.to_string()));
        }
        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    /// Format `date` in its own offset
    #[must_use]
    pub fn format(&self, date: &DateTime<FixedOffset>) -> String {
        date.format(&self.pattern).to_string()
    }
}

/// Compile a user pattern; `^`/`$` match at line boundaries within messages
pub(crate) fn multi_line_pattern(pattern: &str) -> Result<Regex, ReportError> {
    Ok(RegexBuilder::new(pattern).multi_line(true).build()?)
}

// ============================================================================
// Dispatch
// ============================================================================

/// Open the configured repository
///
/// Returns `Ok(None)` when the report should be skipped: no repository was
/// found and `--skip-no-git` is set, or HEAD sits on an unborn branch.
///
/// # Errors
///
/// Returns an error if the repository cannot be opened or checked.
pub fn open(config: &Config) -> Result<Option<Box<dyn GitRepository>>, ReportError> {
    let path = config
        .repository_path()
        .ok_or(ReportError::NoWorkingDirectory)?;
    let backend = config.backend();

    let mut repository = match open_repository(&backend, &path, config.git_dir.as_deref()) {
        Ok(repository) => repository,
        Err(e) if config.skip_no_git && e.kind() == GitErrorKind::RepositoryNotFound => {
            info!(path = %path.display(), "No git repository found, skipping");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    repository.set_head_ref(config.head_ref());

    if on_unborn_branch(repository.as_ref())? {
        return Ok(None);
    }

    debug!(backend = backend.name(), head = config.head_ref(), "Repository ready");
    Ok(Some(repository))
}

/// Whether HEAD sits on an unborn branch, logging the skip
///
/// The branch name is only logged, so failing to read it does not turn the
/// skip into an error.
fn on_unborn_branch(repository: &dyn GitRepository) -> Result<bool, GitError> {
    if !repository.is_on_unborn_branch()? {
        return Ok(false);
    }
    let branch = repository.branch().ok();
    warn!(
        branch = branch.as_deref(),
        "Building from an unborn branch, skipping"
    );
    Ok(true)
}

/// Run the configured report and return its output
///
/// `Ok(None)` means the report was skipped.
///
/// # Errors
///
/// Returns an error if the repository cannot be read, an option is invalid,
/// or (for `check`) any release check fails.
pub fn run(config: &Config) -> Result<Option<String>, ReportError> {
    let command = config.report();
    let Some(mut repository) = open(config)? else {
        return Ok(None);
    };

    let output = run_report(repository.as_ref(), config, &command);
    repository.close();
    output.map(Some)
}

fn run_report(
    repository: &dyn GitRepository,
    config: &Config,
    command: &Command,
) -> Result<String, ReportError> {
    match command {
        Command::Info { json, date_format } => {
            let date_format = DateFormat::parse(date_format)?;
            let build_info = info::collect(
                repository,
                config.dirty_suffix(),
                !config.ignore_untracked,
                &date_format,
            );
            if *json {
                Ok(format!("{}\n", serde_json::to_string_pretty(&build_info)?))
            } else {
                Ok(build_info.to_properties())
            }
        }
        Command::Changelog {
            skip_tagged,
            skip_commits_matching,
            date_format,
            limit,
        } => {
            let mut options = ChangelogOptions::new(DateFormat::parse(date_format)?);
            options.skip_tagged = *skip_tagged;
            options.limit = *limit;
            if let Some(pattern) = skip_commits_matching.as_deref().filter(|p| !p.is_empty()) {
                options.skip_commits_matching = Some(multi_line_pattern(pattern)?);
            }
            changelog::render(repository, &options)
        }
        Command::Contributors {
            sort,
            show_email,
            no_counts,
        } => {
            let options = ContributorOptions {
                sort: *sort,
                show_email: *show_email,
                show_counts: !no_counts,
            };
            contributors::render(repository, &options)
        }
        Command::Check {
            branch,
            allow_dirty,
            commit_message,
            require_tag,
        } => {
            if config.head_ref() != provenance_git::repository::DEFAULT_HEAD {
                warn!(
                    head = config.head_ref(),
                    "Checks run against a ref other than HEAD and may not match the work tree"
                );
            }
            let options = CheckOptions {
                branch: branch.clone(),
                clean: !allow_dirty,
                include_untracked: !config.ignore_untracked,
                commit_message: commit_message
                    .as_deref()
                    .map(multi_line_pattern)
                    .transpose()?,
                require_tag: *require_tag,
            };
            let failures = check::run_checks(repository, &options)?;
            if failures.is_empty() {
                info!("All checks passed");
                return Ok(String::new());
            }
            for failure in &failures {
                warn!(%failure, "Check failed");
            }
            Err(ReportError::ChecksFailed {
                count: failures.len(),
                summary: failures
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            })
        }
    }
}
