// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! `git describe`-style descriptions of a commit

use std::fmt;

use serde::Serialize;

use crate::tag::Tag;

/// Default suffix appended to descriptions of a dirty work tree
pub const DEFAULT_DIRTY_SUFFIX: &str = "-dirty";

/// Maximum number of tagged commits considered while describing
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

/// Options for [`GitRepository::describe_with`](crate::GitRepository::describe_with)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeOptions {
    /// Suffix appended when the work tree is dirty; `None` skips the dirty check
    pub dirty_suffix: Option<String>,
    /// Count untracked files as making the work tree dirty
    pub include_untracked: bool,
    /// Stop collecting candidate tags after this many
    pub max_candidates: usize,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self {
            dirty_suffix: Some(DEFAULT_DIRTY_SUFFIX.to_string()),
            include_untracked: true,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

impl DescribeOptions {
    /// Describe without checking the work tree
    #[must_use]
    pub fn without_dirty_check(mut self) -> Self {
        self.dirty_suffix = None;
        self
    }

    /// Use a custom dirty suffix
    #[must_use]
    pub fn dirty_suffix(mut self, suffix: &str) -> Self {
        self.dirty_suffix = Some(suffix.to_string());
        self
    }

    /// Ignore untracked files in the dirty check
    #[must_use]
    pub fn ignore_untracked(mut self) -> Self {
        self.include_untracked = false;
        self
    }
}

/// The nearest tag reachable from a commit and how far away it is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagDescription {
    /// Full id of the described commit
    pub commit_id: String,
    /// Shortest unique prefix of `commit_id`
    pub abbreviated_id: String,
    /// Nearest reachable annotated tag
    pub tag: Option<Tag>,
    /// Commits reachable from the described commit but not from the tag
    pub distance: usize,
    /// Set when the work tree was found dirty
    pub dirty_suffix: Option<String>,
}

impl TagDescription {
    /// Whether the described commit carries the tag itself
    #[must_use]
    pub fn is_tagged(&self) -> bool {
        self.tag.is_some() && self.distance == 0
    }

    /// Whether the work tree was dirty when the description was made
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty_suffix.is_some()
    }

    /// Name of the nearest tag, or an empty string
    #[must_use]
    pub fn next_tag_name(&self) -> &str {
        self.tag.as_ref().map_or("", |tag| tag.name.as_str())
    }
}

impl fmt::Display for TagDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            None => write!(f, "{}", self.abbreviated_id)?,
            Some(tag) if self.distance == 0 => write!(f, "{}", tag.name)?,
            Some(tag) => write!(f, "{}-{}-g{}", tag.name, self.distance, self.abbreviated_id)?,
        }
        if let Some(suffix) = &self.dirty_suffix {
            write!(f, "{suffix}")?;
        }
        Ok(())
    }
}
