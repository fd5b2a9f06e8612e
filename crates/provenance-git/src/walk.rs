// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit graph walking
//!
//! A walk visits every commit reachable from a start ref exactly once,
//! newest committer time first. Ties are broken by the order in which
//! commits were discovered, so both backends produce the same sequence for
//! the same graph. Each commit is handed to a [`CommitWalkAction`].

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use serde::Serialize;
use tracing::{debug, trace};

use crate::commit::Commit;
use crate::error::GitError;
use crate::repository::GitRepository;

/// Whether a walk should go on after a commit was processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Visit the next commit
    Continue,
    /// End the walk; `finish` still runs
    Stop,
}

/// A visitor run over the commits of a walk
///
/// `prepare` runs once before the first commit, `execute` once per commit,
/// and `finish` once after the last one. An error from any of them aborts the
/// walk; `finish` is not called after a failure.
pub trait CommitWalkAction {
    /// Called before the first commit is visited
    fn prepare(&mut self, repository: &dyn GitRepository) -> Result<(), GitError> {
        let _ = repository;
        Ok(())
    }

    /// Process a single commit
    fn execute(
        &mut self,
        repository: &dyn GitRepository,
        commit: &Commit,
    ) -> Result<WalkControl, GitError>;

    /// Called after the last commit was visited
    fn finish(&mut self, repository: &dyn GitRepository) -> Result<(), GitError> {
        let _ = repository;
        Ok(())
    }
}

/// Configuration for walking commits
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Maximum number of commits to visit
    pub limit: Option<usize>,
    /// Start from this ref (defaults to the handle's head ref)
    pub from_ref: Option<String>,
    /// Refs whose commits end the walk; they and their ancestry are skipped
    pub stop_at: Vec<String>,
}

impl WalkOptions {
    /// Create options for walking the N most recent commits
    #[must_use]
    pub fn latest(n: usize) -> Self {
        Self {
            limit: Some(n),
            ..Default::default()
        }
    }

    /// Set the starting reference
    #[must_use]
    pub fn from(mut self, reference: &str) -> Self {
        self.from_ref = Some(reference.to_string());
        self
    }

    /// Do not visit this ref's commit or walk past it
    #[must_use]
    pub fn stop_at(mut self, reference: &str) -> Self {
        self.stop_at.push(reference.to_string());
        self
    }
}

/// What a finished walk did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkSummary {
    /// Number of commits handed to the action
    pub visited: usize,
    /// Whether the action or the limit ended the walk before the graph did
    pub stopped_early: bool,
}

/// A commit waiting to be visited
struct Pending {
    time: i64,
    sequence: u64,
    commit: Commit,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // Max-heap: newest first, then earliest discovered
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Walk a repository's commit graph
///
/// Backends implement [`GitRepository::walk_commits_with`] by calling this,
/// which keeps the visiting order identical across backends.
///
/// # Errors
///
/// Fails if a ref cannot be resolved, a commit cannot be loaded, or the
/// action reports an error.
pub fn walk(
    repository: &dyn GitRepository,
    options: &WalkOptions,
    action: &mut dyn CommitWalkAction,
) -> Result<WalkSummary, GitError> {
    let start = match &options.from_ref {
        Some(reference) => repository.resolve_commit_id(reference)?,
        None => repository.head_id()?,
    };
    let boundaries = options
        .stop_at
        .iter()
        .map(|reference| repository.resolve_commit_id(reference))
        .collect::<Result<HashSet<_>, _>>()?;
    let limit = options.limit.unwrap_or(usize::MAX);

    debug!(start = %start, boundaries = boundaries.len(), limit = ?options.limit, "walking commits");

    action.prepare(repository)?;

    let mut seen = HashSet::new();
    let mut queue = BinaryHeap::new();
    let mut sequence = 0u64;
    let mut enqueue = |queue: &mut BinaryHeap<Pending>, id: &str| -> Result<(), GitError> {
        if boundaries.contains(id) || !seen.insert(id.to_string()) {
            return Ok(());
        }
        let commit = repository.find_commit(id)?;
        queue.push(Pending {
            time: commit.commit_time(),
            sequence,
            commit,
        });
        sequence += 1;
        Ok(())
    };

    enqueue(&mut queue, &start)?;

    let mut summary = WalkSummary::default();
    while let Some(Pending { commit, .. }) = queue.pop() {
        if summary.visited >= limit {
            summary.stopped_early = true;
            break;
        }
        trace!(id = %commit.id, "visiting commit");
        summary.visited += 1;
        if action.execute(repository, &commit)? == WalkControl::Stop {
            summary.stopped_early = true;
            break;
        }
        for parent in &commit.parents {
            enqueue(&mut queue, parent)?;
        }
    }

    action.finish(repository)?;
    debug!(visited = summary.visited, stopped_early = summary.stopped_early, "walk finished");
    Ok(summary)
}

/// Counts the commits it is run over
#[derive(Debug, Clone, Copy, Default)]
pub struct CountCommits {
    /// Commits seen so far
    pub count: usize,
}

impl CommitWalkAction for CountCommits {
    fn execute(
        &mut self,
        _repository: &dyn GitRepository,
        _commit: &Commit,
    ) -> Result<WalkControl, GitError> {
        self.count += 1;
        Ok(WalkControl::Continue)
    }
}
