// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Contributor list aggregated from commit authors
//!
//! Authors are folded onto their canonical identity through the
//! repository's `.mailmap` before counting.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use provenance_git::{Commit, CommitWalkAction, GitError, GitRepository, WalkControl};
use serde::Serialize;
use tracing::debug;

use crate::config::ContributorSort;
use crate::report::ReportError;

/// Heading printed above the contributor list
pub const DEFAULT_HEADER: &str = "Contributors\n============\n";

/// Options for [`render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributorOptions {
    /// Ordering of the list
    pub sort: ContributorSort,
    /// Append each contributor's email address
    pub show_email: bool,
    /// Append each contributor's commit count
    pub show_counts: bool,
}

impl Default for ContributorOptions {
    fn default() -> Self {
        Self {
            sort: ContributorSort::Count,
            show_email: false,
            show_counts: true,
        }
    }
}

/// One canonical author
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
    /// Canonical name
    pub name: String,
    /// Canonical email address
    pub email: String,
    /// Number of authored commits
    pub count: usize,
    /// Author date of the earliest commit
    pub first_commit: DateTime<FixedOffset>,
}

/// Walk action counting commits per canonical author email
#[derive(Debug, Default)]
pub struct ContributorsAction {
    contributors: BTreeMap<String, Contributor>,
}

impl ContributorsAction {
    /// Contributors in the requested order
    #[must_use]
    pub fn into_sorted(self, sort: ContributorSort) -> Vec<Contributor> {
        let mut contributors: Vec<Contributor> = self.contributors.into_values().collect();
        match sort {
            ContributorSort::Count => contributors.sort_by(|a, b| b.count.cmp(&a.count)),
            ContributorSort::Name => contributors.sort_by(|a, b| a.name.cmp(&b.name)),
            ContributorSort::Date => contributors.sort_by_key(|c| c.first_commit),
        }
        contributors
    }
}

impl CommitWalkAction for ContributorsAction {
    fn execute(
        &mut self,
        repository: &dyn GitRepository,
        commit: &Commit,
    ) -> Result<WalkControl, GitError> {
        let identity = repository.mail_map()?.canonical_author(commit);
        let date = commit.author.time;
        self.contributors
            .entry(identity.email.clone())
            .and_modify(|contributor| {
                contributor.count += 1;
                if date < contributor.first_commit {
                    contributor.first_commit = date;
                }
            })
            .or_insert_with(|| Contributor {
                name: identity.name,
                email: identity.email,
                count: 1,
                first_commit: date,
            });
        Ok(WalkControl::Continue)
    }
}

/// Render contributor lines for `contributors`
#[must_use]
pub fn format_list(contributors: &[Contributor], options: &ContributorOptions) -> String {
    let mut output = format!("{DEFAULT_HEADER}\n");
    for contributor in contributors {
        output.push_str(" * ");
        output.push_str(&contributor.name);
        if options.show_email {
            output.push_str(&format!(" ({})", contributor.email));
        }
        if options.show_counts {
            output.push_str(&format!(" ({})", contributor.count));
        }
        output.push('\n');
    }
    output
}

/// Walk from HEAD and render the contributor list
///
/// # Errors
///
/// Returns an error if the walk or the mailmap fails.
pub fn render(
    repository: &dyn GitRepository,
    options: &ContributorOptions,
) -> Result<String, ReportError> {
    let mut action = ContributorsAction::default();
    let summary = repository.walk_commits(&mut action)?;
    let contributors = action.into_sorted(options.sort);
    debug!(
        commits = summary.visited,
        contributors = contributors.len(),
        "Aggregated contributors"
    );
    Ok(format_list(&contributors, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    fn contributor(name: &str, count: usize, day: u32) -> Contributor {
        Contributor {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            count,
            first_commit: FixedOffset::east_opt(0)
                .and_then(|tz| tz.with_ymd_and_hms(2024, 1, day, 0, 0, 0).single())
                .expect("date"),
        }
    }

    fn action(contributors: Vec<Contributor>) -> ContributorsAction {
        ContributorsAction {
            contributors: contributors
                .into_iter()
                .map(|c| (c.email.clone(), c))
                .collect(),
        }
    }

    fn names(contributors: &[Contributor]) -> Vec<&str> {
        contributors.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_sort_by_count_descending() {
        let sorted = action(vec![
            contributor("Ada", 1, 3),
            contributor("Bob", 5, 2),
            contributor("Cy", 3, 1),
        ])
        .into_sorted(ContributorSort::Count);
        assert_eq!(names(&sorted), vec!["Bob", "Cy", "Ada"]);
    }

    #[test]
    fn test_sort_by_name() {
        let sorted = action(vec![contributor("Cy", 3, 1), contributor("Ada", 1, 3)])
            .into_sorted(ContributorSort::Name);
        assert_eq!(names(&sorted), vec!["Ada", "Cy"]);
    }

    #[test]
    fn test_sort_by_first_commit() {
        let sorted = action(vec![contributor("Ada", 1, 3), contributor("Cy", 3, 1)])
            .into_sorted(ContributorSort::Date);
        assert_eq!(names(&sorted), vec!["Cy", "Ada"]);
    }

    #[test]
    fn test_format_list_options() {
        let contributors = vec![contributor("Ada", 2, 1)];
        let plain = format_list(&contributors, &ContributorOptions::default());
        assert_eq!(plain, "Contributors\n============\n\n * Ada (2)\n");

        let options = ContributorOptions {
            show_email: true,
            show_counts: false,
            ..Default::default()
        };
        assert_eq!(
            format_list(&contributors, &options),
            "Contributors\n============\n\n * Ada (ada@example.com)\n"
        );
    }
}
