// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Git commit types and operations

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::GitError;

/// A person as recorded in a commit or tag, without a timestamp
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Display name
    pub name: String,
    /// Email address (without angle brackets)
    pub email: String,
}

impl Identity {
    /// Create an identity from a name and email address
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Author or committer of a commit, with the time and timezone they acted in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Display name
    pub name: String,
    /// Email address (without angle brackets)
    pub email: String,
    /// Timestamp in the signer's own timezone
    pub time: DateTime<FixedOffset>,
}

impl Signature {
    /// The name/email pair of this signature
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.name.clone(), self.email.clone())
    }
}

/// Represents a fully loaded git commit
///
/// Both backends read every field in a single pass, so a `Commit` never has
/// partially loaded state. Handles cache commits by id; the cache is what
/// makes the commit graph lazy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit SHA (40 hex characters)
    pub id: String,
    /// Parent commit SHAs, first parent first
    pub parents: Vec<String>,
    /// Who wrote the change
    pub author: Signature,
    /// Who recorded the change
    pub committer: Signature,
    /// Commit message without leading or trailing line breaks
    pub message: String,
}

impl Commit {
    /// Validate that a SHA is a valid 40-character hex string
    #[must_use]
    pub fn is_valid_id(id: &str) -> bool {
        id.len() == 40 && id.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Check if this is a merge commit (has multiple parents)
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Check if this is a root commit (has no parents)
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// The one-line subject of the message
    ///
    /// This is the first paragraph of the message with its lines joined by
    /// single spaces, which is what `git log --format=%s` prints.
    #[must_use]
    pub fn subject(&self) -> String {
        self.message
            .lines()
            .skip_while(|line| line.trim().is_empty())
            .take_while(|line| !line.trim().is_empty())
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Commit time, used to order walks
    #[must_use]
    pub fn commit_time(&self) -> i64 {
        self.committer.time.timestamp()
    }
}

/// Decode commit text stored in `encoding`, UTF-8 when the header is absent
///
/// Matches what `git log` prints: Latin-1 is re-encoded to UTF-8, anything
/// else must already be valid UTF-8.
pub(crate) fn decode_text(bytes: &[u8], encoding: Option<&str>) -> Result<String, GitError> {
    let latin1 = encoding.is_some_and(|name| {
        matches!(
            name.to_ascii_lowercase().as_str(),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1"
        )
    });
    if latin1 {
        return Ok(bytes.iter().copied().map(char::from).collect());
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        GitError::parse(
            "commit text",
            format!("{e} (encoding {})", encoding.unwrap_or("UTF-8")),
        )
    })
}

/// Strip the blank lines git may store around a message
pub(crate) fn normalize_message(message: &str) -> String {
    message
        .trim_start_matches('\n')
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

/// Build a timestamp from epoch seconds and a UTC offset in minutes
pub(crate) fn timestamp(seconds: i64, offset_minutes: i32) -> Result<DateTime<FixedOffset>, GitError> {
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| GitError::parse("timezone offset", offset_minutes.to_string()))?;
    DateTime::from_timestamp(seconds, 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| GitError::parse("timestamp", seconds.to_string()))
}
