// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for provenance-git

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during repository operations
#[derive(Debug, Error)]
pub enum GitError {
    /// The path is not a usable repository
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was searched for a repository
        path: String,
    },

    /// Repository metadata is present but unreadable or inconsistent
    #[error("Repository at {path} is corrupt: {reason}")]
    RepositoryCorrupt {
        /// The metadata directory of the repository
        path: String,
        /// What was found to be broken
        reason: String,
    },

    /// HEAD or a named ref cannot be resolved to a commit
    #[error("Cannot resolve reference {reference}: {reason}")]
    ReferenceUnresolvable {
        /// The reference string that could not be resolved
        reference: String,
        /// Why resolution failed (unborn branch, dangling ref, ...)
        reason: String,
    },

    /// The external version-control executable could not be started
    #[error("Executable not found: {program}")]
    ExecutableNotFound {
        /// The program that was looked up on `PATH`
        program: String,
    },

    /// The external version-control executable ran and reported a failure
    #[error("Command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        /// The command line that was run
        command: String,
        /// Exit status as reported by the OS
        status: String,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// Error from the embedded git library
    #[error("Git library error: {0}")]
    Library(#[from] git2::Error),

    /// I/O error while talking to the repository
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend output could not be interpreted
    #[error("Cannot parse {context}: {detail}")]
    Parse {
        /// What was being parsed
        context: &'static str,
        /// The offending input or a description of the problem
        detail: String,
    },

    /// The `.mailmap` file exists but could not be read
    #[error("Cannot read mailmap {path}: {source}")]
    MailMap {
        /// Location of the mailmap file
        path: PathBuf,
        /// Underlying read error
        source: std::io::Error,
    },

    /// The handle was used after `close()`
    #[error("Repository handle has been closed")]
    RepositoryClosed,

    /// The handle was used before a successful `check()`
    #[error("Repository has not been checked")]
    RepositoryUnchecked,
}

/// Coarse classification of [`GitError`]s for callers that decide whether a
/// failure is fatal to their report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitErrorKind {
    /// Path is not a usable repository
    RepositoryNotFound,
    /// Metadata present but unreadable or inconsistent
    RepositoryCorrupt,
    /// HEAD or a named ref cannot be resolved
    ReferenceUnresolvable,
    /// The underlying tool is missing
    BackendMissing,
    /// The underlying process or library call failed
    BackendFailed,
    /// Backend output could not be interpreted
    Parse,
    /// Handle lifecycle misuse (closed or unchecked)
    InvalidState,
}

impl GitError {
    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> GitErrorKind {
        match self {
            Self::RepositoryNotFound { .. } => GitErrorKind::RepositoryNotFound,
            Self::RepositoryCorrupt { .. } => GitErrorKind::RepositoryCorrupt,
            Self::ReferenceUnresolvable { .. } => GitErrorKind::ReferenceUnresolvable,
            Self::ExecutableNotFound { .. } => GitErrorKind::BackendMissing,
            Self::CommandFailed { .. } | Self::Library(_) | Self::Io(_) | Self::MailMap { .. } => {
                GitErrorKind::BackendFailed
            }
            Self::Parse { .. } => GitErrorKind::Parse,
            Self::RepositoryClosed | Self::RepositoryUnchecked => GitErrorKind::InvalidState,
        }
    }

    pub(crate) fn unresolvable(reference: &str, reason: impl Into<String>) -> Self {
        Self::ReferenceUnresolvable {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(context: &'static str, detail: impl Into<String>) -> Self {
        Self::Parse {
            context,
            detail: detail.into(),
        }
    }
}
