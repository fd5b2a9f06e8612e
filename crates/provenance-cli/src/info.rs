// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Build information about the head commit
//!
//! Every field is read independently so one failure (say, a branch name on
//! a dangling ref) still leaves the rest of the report intact. Failed fields
//! are logged and left empty.

use provenance_git::{DescribeOptions, GitError, GitRepository};
use serde::Serialize;
use tracing::{debug, warn};

use crate::report::DateFormat;

/// Build information for the head commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    /// Branch `HEAD` points at, or the commit id when detached
    pub branch: Option<String>,
    /// Abbreviated head commit id, with the dirty flag when dirty
    pub commit_abbrev: Option<String>,
    /// Full head commit id, with the dirty flag when dirty
    pub commit_id: Option<String>,
    /// Whether the work tree has uncommitted changes
    pub dirty: Option<bool>,
    /// Author of the head commit
    pub author_name: Option<String>,
    /// Author email of the head commit
    pub author_email: Option<String>,
    /// Author date, formatted
    pub author_date: Option<String>,
    /// Committer of the head commit
    pub committer_name: Option<String>,
    /// Committer email of the head commit
    pub committer_email: Option<String>,
    /// Committer date, formatted
    pub committer_date: Option<String>,
    /// `git describe` string
    pub describe: Option<String>,
    /// Nearest annotated tag, empty when there is none
    pub tag_name: Option<String>,
    /// Version derived from the describe string, `None` when untagged
    pub version: Option<String>,
}

fn field<T>(name: &'static str, result: Result<T, GitError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field = name, error = %e, "Failed to read build info field");
            None
        }
    }
}

/// Collect build information from `repository`
///
/// `dirty_suffix` is appended to both ids and the describe string when the
/// work tree is dirty; `None` skips the suffix but still reports `dirty`.
pub fn collect(
    repository: &dyn GitRepository,
    dirty_suffix: Option<&str>,
    include_untracked: bool,
    date_format: &DateFormat,
) -> BuildInfo {
    let mut info = BuildInfo {
        branch: field("branch", repository.branch()),
        dirty: field("dirty", repository.is_dirty(include_untracked)),
        ..Default::default()
    };
    let flag = match (info.dirty, dirty_suffix) {
        (Some(true), Some(suffix)) => suffix,
        _ => "",
    };

    if let Some(head) = field("commit", repository.head_commit()) {
        info.commit_abbrev = field("commit_abbrev", repository.abbreviated_commit_id(&head))
            .map(|abbrev| format!("{abbrev}{flag}"));
        info.commit_id = Some(format!("{}{flag}", head.id));
        info.author_date = Some(date_format.format(&head.author.time));
        info.committer_date = Some(date_format.format(&head.committer.time));
        info.author_name = Some(head.author.name);
        info.author_email = Some(head.author.email);
        info.committer_name = Some(head.committer.name);
        info.committer_email = Some(head.committer.email);
    }

    let mut options = DescribeOptions {
        dirty_suffix: dirty_suffix.map(str::to_string),
        ..Default::default()
    };
    if !include_untracked {
        options = options.ignore_untracked();
    }
    if let Some(description) = field("describe", repository.describe_with(&options)) {
        let describe = description.to_string();
        info.version = description.tag.as_ref().map(|_| version_of(&describe));
        info.tag_name = Some(description.next_tag_name().to_string());
        info.describe = Some(describe);
    }

    debug!(?info, "Collected build info");
    info
}

/// Strip one leading `v` from a describe string
fn version_of(describe: &str) -> String {
    describe
        .strip_prefix(['v', 'V'])
        .unwrap_or(describe)
        .to_string()
}

impl BuildInfo {
    /// Render as `key=value` lines, skipping fields that could not be read
    #[must_use]
    pub fn to_properties(&self) -> String {
        let dirty = self.dirty.map(|dirty| dirty.to_string());
        [
            ("branch", &self.branch),
            ("commit.abbrev", &self.commit_abbrev),
            ("commit.id", &self.commit_id),
            ("commit.dirty", &dirty),
            ("commit.author.name", &self.author_name),
            ("commit.author.email", &self.author_email),
            ("commit.author.date", &self.author_date),
            ("commit.committer.name", &self.committer_name),
            ("commit.committer.email", &self.committer_email),
            ("commit.committer.date", &self.committer_date),
            ("tag.describe", &self.describe),
            ("tag.name", &self.tag_name),
            ("version", &self.version),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|value| format!("{key}={value}\n")))
        .collect()
    }
}
