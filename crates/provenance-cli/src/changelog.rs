// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Changelog built by walking history from the head commit
//!
//! Commits are listed newest first. A commit carrying an annotated tag opens
//! a version section with the tag's date; commits above the newest tag are
//! grouped under the current branch. Lightweight tags are ignored, and the
//! newest tag names a commit tagged more than once, as in `describe`.

use std::collections::HashMap;

use provenance_git::{
    Commit, CommitWalkAction, GitError, GitRepository, Tag, WalkControl, WalkOptions, describe,
};
use regex::Regex;
use tracing::debug;

use crate::report::{DateFormat, ReportError};

/// Heading printed above the changelog
pub const DEFAULT_HEADER: &str = "Changelog\n=========\n";

/// Options for [`render`]
#[derive(Debug, Clone)]
pub struct ChangelogOptions {
    /// Heading printed before any entry
    pub header: String,
    /// Format of the tag dates on version lines
    pub date_format: DateFormat,
    /// Print the version line of a tagged commit but not its subject
    pub skip_tagged: bool,
    /// Commits whose message matches are left out entirely
    pub skip_commits_matching: Option<Regex>,
    /// Stop after this many commits
    pub limit: Option<usize>,
}

impl ChangelogOptions {
    /// Default options with the given date format
    #[must_use]
    pub fn new(date_format: DateFormat) -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            date_format,
            skip_tagged: false,
            skip_commits_matching: None,
            limit: None,
        }
    }
}

/// Walk action writing changelog lines
pub struct ChangelogAction<'a> {
    options: &'a ChangelogOptions,
    tags: HashMap<String, Tag>,
    first_entry: bool,
    latest_tag: Option<String>,
    output: String,
}

impl<'a> ChangelogAction<'a> {
    /// Start a changelog with `options`
    #[must_use]
    pub fn new(options: &'a ChangelogOptions) -> Self {
        Self {
            options,
            tags: HashMap::new(),
            first_entry: true,
            latest_tag: None,
            output: String::new(),
        }
    }

    /// Name of the newest tag seen so far
    #[must_use]
    pub fn latest_tag(&self) -> Option<&str> {
        self.latest_tag.as_deref()
    }

    /// The changelog text
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }

    fn line(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

impl CommitWalkAction for ChangelogAction<'_> {
    fn prepare(&mut self, repository: &dyn GitRepository) -> Result<(), GitError> {
        let options = self.options;
        self.line(&options.header);
        self.tags = describe::tagged_commits(repository)?;
        debug!(tags = self.tags.len(), "Collected changelog tags");
        Ok(())
    }

    fn execute(
        &mut self,
        repository: &dyn GitRepository,
        commit: &Commit,
    ) -> Result<WalkControl, GitError> {
        if self
            .options
            .skip_commits_matching
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(&commit.message))
        {
            return Ok(WalkControl::Continue);
        }

        if let Some(tag) = self.tags.get_mut(&commit.id) {
            repository.load_tag(tag)?;
            let date = tag
                .date()
                .map(|date| self.options.date_format.format(&date))
                .unwrap_or_default();
            let name = tag.name.clone();
            let version = if self.first_entry {
                format!("Version {name} - {date}\n")
            } else {
                format!("\nVersion {name} - {date}\n")
            };
            self.line(&version);
            self.latest_tag.get_or_insert(name);

            if self.options.skip_tagged {
                self.first_entry = false;
                return Ok(WalkControl::Continue);
            }
        } else if self.first_entry {
            let branch = repository.branch()?;
            self.line(&format!("Commits on branch \"{branch}\"\n"));
        }

        self.line(&format!(" * {}", commit.subject()));
        self.first_entry = false;
        Ok(WalkControl::Continue)
    }
}

/// Walk from HEAD and render the changelog
///
/// # Errors
///
/// Returns an error if the walk or a tag lookup fails.
pub fn render(
    repository: &dyn GitRepository,
    options: &ChangelogOptions,
) -> Result<String, ReportError> {
    let walk_options = WalkOptions {
        limit: options.limit,
        ..Default::default()
    };
    let mut action = ChangelogAction::new(options);
    let summary = repository.walk_commits_with(&walk_options, &mut action)?;
    debug!(
        visited = summary.visited,
        latest_tag = action.latest_tag(),
        "Rendered changelog"
    );
    Ok(action.into_output())
}
