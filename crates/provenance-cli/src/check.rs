// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Release checks on the head commit

use provenance_git::{DescribeOptions, GitError, GitRepository};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Which checks to run
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Branch HEAD must be on
    pub branch: Option<String>,
    /// Require a clean work tree
    pub clean: bool,
    /// Count untracked files as dirt
    pub include_untracked: bool,
    /// Pattern the HEAD commit message must match
    pub commit_message: Option<Regex>,
    /// Require HEAD to carry an annotated tag
    pub require_tag: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            branch: None,
            clean: true,
            include_untracked: true,
            commit_message: None,
            require_tag: false,
        }
    }
}

/// A failed release check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckFailure {
    /// HEAD is on another branch
    #[error("Expected branch {expected}, but HEAD is on {actual}")]
    WrongBranch {
        /// Required branch
        expected: String,
        /// Branch (or detached commit id) HEAD is on
        actual: String,
    },

    /// HEAD's message does not match
    #[error("HEAD commit message does not match {pattern}")]
    WrongCommitMessage {
        /// The required pattern
        pattern: String,
    },

    /// The work tree has changes
    #[error("The work tree is not clean")]
    Unclean,

    /// HEAD carries no annotated tag
    #[error("HEAD is not tagged")]
    Untagged,
}

/// Run the enabled checks, returning every failure
///
/// # Errors
///
/// Returns an error if the repository cannot be read; failed checks are not
/// errors.
pub fn run_checks(
    repository: &dyn GitRepository,
    options: &CheckOptions,
) -> Result<Vec<CheckFailure>, GitError> {
    let mut failures = Vec::new();

    if let Some(expected) = &options.branch {
        let actual = repository.branch()?;
        if &actual != expected {
            failures.push(CheckFailure::WrongBranch {
                expected: expected.clone(),
                actual,
            });
        }
    }

    if let Some(pattern) = &options.commit_message {
        let head = repository.head_commit()?;
        if !pattern.is_match(&head.message) {
            failures.push(CheckFailure::WrongCommitMessage {
                pattern: pattern.as_str().to_string(),
            });
        }
    }

    let dirty = if options.clean || options.require_tag {
        repository.is_dirty(options.include_untracked)?
    } else {
        false
    };
    if options.clean && dirty {
        failures.push(CheckFailure::Unclean);
    }

    if options.require_tag {
        let description =
            repository.describe_with(&DescribeOptions::default().without_dirty_check())?;
        if !description.is_tagged() {
            failures.push(CheckFailure::Untagged);
        } else if !options.clean && dirty {
            warn!(
                tag = description.next_tag_name(),
                "HEAD is tagged, but the work tree is not clean"
            );
        }
    }

    debug!(failures = failures.len(), "Ran release checks");
    Ok(failures)
}
