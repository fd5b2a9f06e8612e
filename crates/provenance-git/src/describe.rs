// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Nearest-tag resolution
//!
//! Follows `git describe`: only annotated tags are candidates, the distance
//! is the number of commits reachable from the described commit but not from
//! the tagged commit, and the closest of the first few tagged commits found
//! while walking back from the head wins.

use std::collections::HashMap;

use tracing::debug;

use crate::commit::Commit;
use crate::description::{DescribeOptions, TagDescription};
use crate::error::GitError;
use crate::repository::GitRepository;
use crate::tag::Tag;
use crate::walk::{CommitWalkAction, CountCommits, WalkControl, WalkOptions, walk};

/// Collects tagged commits in walk order while counting the whole walk
struct CandidateCollector<'a> {
    tagged: &'a HashMap<String, Tag>,
    max_candidates: usize,
    found: Vec<String>,
    reachable: usize,
}

impl CommitWalkAction for CandidateCollector<'_> {
    fn execute(
        &mut self,
        _repository: &dyn GitRepository,
        commit: &Commit,
    ) -> Result<WalkControl, GitError> {
        self.reachable += 1;
        if self.found.len() < self.max_candidates && self.tagged.contains_key(&commit.id) {
            self.found.push(commit.id.clone());
        }
        Ok(WalkControl::Continue)
    }
}

/// Describe the head commit of a repository
///
/// Backends implement [`GitRepository::describe_with`] by calling this.
///
/// # Errors
///
/// Fails if the head cannot be resolved (including an unborn branch), a tag
/// cannot be loaded, or the dirty check fails.
pub fn describe(
    repository: &dyn GitRepository,
    options: &DescribeOptions,
) -> Result<TagDescription, GitError> {
    let head = repository.head_commit()?;
    let mut tagged = tagged_commits(repository)?;

    let (tag, distance) = match tagged.remove(&head.id) {
        Some(tag) => (Some(tag), 0),
        None => match nearest_tag(repository, &head, &tagged, options.max_candidates)? {
            Some((commit_id, distance)) => (tagged.remove(&commit_id), distance),
            None => (None, 0),
        },
    };

    let dirty_suffix = match &options.dirty_suffix {
        Some(suffix) if repository.is_dirty(options.include_untracked)? => Some(suffix.clone()),
        _ => None,
    };

    let description = TagDescription {
        abbreviated_id: repository.abbreviated_commit_id(&head)?,
        commit_id: head.id,
        tag,
        distance,
        dirty_suffix,
    };
    debug!(description = %description, "described head");
    Ok(description)
}

/// Annotated tags keyed by the commit they point at
///
/// When several tags share a commit the newest one wins, with the smallest
/// name breaking ties. Tags that needed comparing come back loaded.
///
/// # Errors
///
/// Fails if the tags cannot be listed or a competing tag cannot be loaded.
pub fn tagged_commits(repository: &dyn GitRepository) -> Result<HashMap<String, Tag>, GitError> {
    let mut tagged: HashMap<String, Tag> = HashMap::new();
    for mut tag in repository.tags()?.into_iter().filter(|tag| tag.annotated) {
        let Some(current) = tagged.get_mut(&tag.target) else {
            tagged.insert(tag.target.clone(), tag);
            continue;
        };
        repository.load_tag(current)?;
        repository.load_tag(&mut tag)?;
        // Names arrive sorted, so an equal date keeps the current tag
        if tag.date() > current.date() {
            *current = tag;
        }
    }
    Ok(tagged)
}

/// Closest tagged ancestor of `head` and its distance
fn nearest_tag(
    repository: &dyn GitRepository,
    head: &Commit,
    tagged: &HashMap<String, Tag>,
    max_candidates: usize,
) -> Result<Option<(String, usize)>, GitError> {
    if tagged.is_empty() || max_candidates == 0 {
        return Ok(None);
    }

    let mut collector = CandidateCollector {
        tagged,
        max_candidates,
        found: Vec::new(),
        reachable: 0,
    };
    walk(repository, &WalkOptions::default().from(&head.id), &mut collector)?;

    let mut best: Option<(String, usize)> = None;
    for commit_id in collector.found {
        let mut counter = CountCommits::default();
        walk(repository, &WalkOptions::default().from(&commit_id), &mut counter)?;
        let distance = collector.reachable.saturating_sub(counter.count);
        debug!(commit = %commit_id, distance, "describe candidate");
        if best.as_ref().is_none_or(|(_, shortest)| distance < *shortest) {
            best = Some((commit_id, distance));
        }
    }
    Ok(best)
}
