// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! The repository capability contract shared by both backends
//!
//! Callers hold a `Box<dyn GitRepository>` and never see which backend
//! answers. Handles are single-threaded: the lazy caches use `RefCell`s and
//! `OnceCell`s without locking, so give each thread its own handle.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::commit::Commit;
use crate::description::{DescribeOptions, TagDescription};
use crate::error::GitError;
use crate::library::LibraryRepository;
use crate::mailmap::MailMap;
use crate::process::{DEFAULT_PROGRAM, ProcessRepository};
use crate::tag::Tag;
use crate::walk::{CommitWalkAction, WalkOptions, WalkSummary};

/// The default head ref
pub const DEFAULT_HEAD: &str = "HEAD";

/// Read-only access to a local git repository
///
/// Every read requires a handle that is open and has passed [`check`].
/// Reads on a closed handle fail with `GitError::RepositoryClosed`, reads
/// before `check` with `GitError::RepositoryUnchecked`.
///
/// [`check`]: GitRepository::check
pub trait GitRepository {
    /// Validate that the repository is usable and mark the handle checked
    ///
    /// # Errors
    ///
    /// `RepositoryCorrupt` if the object database or HEAD is missing or
    /// unreadable, `RepositoryClosed` after `close`.
    fn check(&mut self) -> Result<(), GitError>;

    /// Whether `check` has succeeded on this handle
    fn is_checked(&self) -> bool;

    /// Release backend resources; calling it again is a no-op
    fn close(&mut self);

    /// Whether `close` has been called
    fn is_closed(&self) -> bool;

    /// The ref resolved as `HEAD` by commit operations
    fn head_ref(&self) -> &str;

    /// Use another ref as `HEAD`, e.g. to describe a different branch
    fn set_head_ref(&mut self, head_ref: &str);

    /// The metadata directory (`.git`)
    fn git_dir(&self) -> &Path;

    /// The working directory, `None` for bare repositories
    fn work_tree(&self) -> Option<&Path>;

    /// Short name of the branch `HEAD` points at
    ///
    /// On an unborn branch this is the name of the branch that will be
    /// created by the first commit. On a detached `HEAD` the full commit id is
    /// returned instead. Always reads the repository's own `HEAD`, whatever
    /// [`head_ref`](GitRepository::head_ref) is set to.
    fn branch(&self) -> Result<String, GitError>;

    /// Whether `HEAD` is a symbolic ref to a branch without commits
    ///
    /// Only meaningful while the head ref is `HEAD`; any other head ref that
    /// does not resolve is reported as an error.
    fn is_on_unborn_branch(&self) -> Result<bool, GitError>;

    /// Resolve any reference (branch, tag, `HEAD`, commit id) to a commit id
    fn resolve_commit_id(&self, reference: &str) -> Result<String, GitError>;

    /// Load a commit by its full id
    fn find_commit(&self, id: &str) -> Result<Commit, GitError>;

    /// Shortest unique prefix of a commit id, at least 7 characters long
    fn abbreviated_commit_id(&self, commit: &Commit) -> Result<String, GitError>;

    /// Whether the work tree differs from `HEAD`
    fn is_dirty(&self, include_untracked: bool) -> Result<bool, GitError>;

    /// All tags resolving to commits, as unloaded stubs sorted by name
    fn tags(&self) -> Result<Vec<Tag>, GitError>;

    /// Read a tag's date, tagger and message; loaded tags are left untouched
    fn load_tag(&self, tag: &mut Tag) -> Result<(), GitError>;

    /// The repository's `.mailmap`, parsed on first use and cached
    fn mail_map(&self) -> Result<&MailMap, GitError>;

    /// Describe the head commit like `git describe`
    fn describe_with(&self, options: &DescribeOptions) -> Result<TagDescription, GitError>;

    /// Run an action for every commit reachable from the start ref
    fn walk_commits_with(
        &self,
        options: &WalkOptions,
        action: &mut dyn CommitWalkAction,
    ) -> Result<WalkSummary, GitError>;

    /// Id of the commit the head ref resolves to
    ///
    /// # Errors
    ///
    /// `ReferenceUnresolvable` on an unborn branch or a dangling head ref.
    fn head_id(&self) -> Result<String, GitError> {
        let head_ref = self.head_ref().to_string();
        match self.resolve_commit_id(&head_ref) {
            Err(GitError::ReferenceUnresolvable { .. })
                if head_ref == DEFAULT_HEAD && self.is_on_unborn_branch()? =>
            {
                Err(GitError::unresolvable(
                    &head_ref,
                    format!("unborn branch {}", self.branch()?),
                ))
            }
            other => other,
        }
    }

    /// The commit the head ref resolves to
    fn head_commit(&self) -> Result<Commit, GitError> {
        let id = self.head_id()?;
        self.find_commit(&id)
    }

    /// Abbreviated id of the head commit
    fn abbreviated_head_id(&self) -> Result<String, GitError> {
        let commit = self.head_commit()?;
        self.abbreviated_commit_id(&commit)
    }

    /// Describe the head commit with default options
    fn describe(&self) -> Result<TagDescription, GitError> {
        self.describe_with(&DescribeOptions::default())
    }

    /// Walk every commit reachable from the head ref
    fn walk_commits(&self, action: &mut dyn CommitWalkAction) -> Result<WalkSummary, GitError> {
        self.walk_commits_with(&WalkOptions::default(), action)
    }
}

impl fmt::Debug for dyn GitRepository + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepository")
            .field("git_dir", &self.git_dir())
            .field("head_ref", &self.head_ref())
            .field("checked", &self.is_checked())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Which implementation answers repository queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Backend {
    /// The embedded `git2` library
    #[default]
    Library,
    /// The `git` executable
    Process {
        /// Program to run, looked up on `PATH` unless it is a path
        program: String,
    },
}

impl Backend {
    /// The process backend using `git` from `PATH`
    #[must_use]
    pub fn process() -> Self {
        Self::Process {
            program: DEFAULT_PROGRAM.to_string(),
        }
    }

    /// Short name for logs and reports
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Library => "library",
            Self::Process { .. } => "process",
        }
    }
}

/// Open and check a repository with the chosen backend
///
/// Without `git_dir` the repository containing `path` is discovered. With
/// it, `git_dir` is opened directly and `path` becomes the work tree.
///
/// # Errors
///
/// Any error from opening or from [`GitRepository::check`].
pub fn open_repository(
    backend: &Backend,
    path: &Path,
    git_dir: Option<&Path>,
) -> Result<Box<dyn GitRepository>, GitError> {
    let mut repository: Box<dyn GitRepository> = match (backend, git_dir) {
        (Backend::Library, None) => Box::new(LibraryRepository::open(path)?),
        (Backend::Library, Some(dir)) => {
            Box::new(LibraryRepository::open_with_git_dir(dir, Some(path))?)
        }
        (Backend::Process { program }, None) => {
            Box::new(ProcessRepository::open_with(program, path)?)
        }
        (Backend::Process { program }, Some(dir)) => Box::new(
            ProcessRepository::open_with_git_dir(program, dir, Some(path))?,
        ),
    };
    repository.check()?;
    info!(
        backend = backend.name(),
        git_dir = %repository.git_dir().display(),
        "opened repository"
    );
    Ok(repository)
}

/// Lifecycle flags and lazy caches every backend keeps per handle
#[derive(Debug)]
pub(crate) struct HandleState {
    head_ref: String,
    checked: bool,
    closed: bool,
    mail_map: OnceCell<MailMap>,
    commits: RefCell<HashMap<String, Commit>>,
    abbreviations: RefCell<HashMap<String, String>>,
}

impl HandleState {
    pub(crate) fn new() -> Self {
        Self {
            head_ref: DEFAULT_HEAD.to_string(),
            checked: false,
            closed: false,
            mail_map: OnceCell::new(),
            commits: RefCell::new(HashMap::new()),
            abbreviations: RefCell::new(HashMap::new()),
        }
    }

    /// Fail unless the handle is open and checked
    pub(crate) fn ensure_readable(&self) -> Result<(), GitError> {
        if self.closed {
            Err(GitError::RepositoryClosed)
        } else if !self.checked {
            Err(GitError::RepositoryUnchecked)
        } else {
            Ok(())
        }
    }

    pub(crate) fn ensure_open(&self) -> Result<(), GitError> {
        if self.closed {
            Err(GitError::RepositoryClosed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn mark_checked(&mut self) {
        self.checked = true;
    }

    pub(crate) fn is_checked(&self) -> bool {
        self.checked
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drop all caches and refuse further reads
    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.mail_map = OnceCell::new();
        self.commits.get_mut().clear();
        self.abbreviations.get_mut().clear();
    }

    pub(crate) fn head_ref(&self) -> &str {
        &self.head_ref
    }

    pub(crate) fn set_head_ref(&mut self, head_ref: &str) {
        self.head_ref = head_ref.to_string();
    }

    pub(crate) fn cached_commit(&self, id: &str) -> Option<Commit> {
        self.commits.borrow().get(id).cloned()
    }

    pub(crate) fn cache_commit(&self, commit: Commit) {
        self.commits.borrow_mut().insert(commit.id.clone(), commit);
    }

    pub(crate) fn cached_abbreviation(&self, id: &str) -> Option<String> {
        self.abbreviations.borrow().get(id).cloned()
    }

    pub(crate) fn cache_abbreviation(&self, id: &str, abbreviation: &str) {
        self.abbreviations
            .borrow_mut()
            .insert(id.to_string(), abbreviation.to_string());
    }

    /// Parse the mail map on first call; bare repositories get an empty map
    pub(crate) fn mail_map(&self, work_tree: Option<&Path>) -> Result<&MailMap, GitError> {
        self.ensure_readable()?;
        if let Some(map) = self.mail_map.get() {
            return Ok(map);
        }
        let map = match work_tree {
            Some(dir) => MailMap::from_work_tree(dir)?,
            None => MailMap::empty(),
        };
        Ok(self.mail_map.get_or_init(|| map))
    }
}

/// Verify the on-disk layout both backends rely on
///
/// Objects live in the common dir, which differs from `git_dir` only for
/// linked work trees.
pub(crate) fn check_layout(git_dir: &Path, common_dir: &Path) -> Result<(), GitError> {
    let corrupt = |reason: &str| GitError::RepositoryCorrupt {
        path: git_dir.display().to_string(),
        reason: reason.to_string(),
    };
    if !common_dir.join("objects").is_dir() {
        return Err(corrupt("object database is missing"));
    }
    if !git_dir.join("HEAD").is_file() {
        return Err(corrupt("HEAD is missing"));
    }
    Ok(())
}

/// Shorten a full ref name the way git prints branch names
pub(crate) fn short_ref_name(name: &str) -> &str {
    ["refs/heads/", "refs/tags/", "refs/remotes/"]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
}
