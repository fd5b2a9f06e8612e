// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Repository backend on the embedded `git2` library
//!
//! No external executable is needed. The `git2::Repository` is held until
//! the handle is closed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use git2::{ErrorCode, ObjectType, Oid, Repository, Status, StatusOptions};
use tracing::{debug, trace};

use crate::commit::{Commit, Identity, Signature, decode_text, normalize_message, timestamp};
use crate::description::{DescribeOptions, TagDescription};
use crate::error::GitError;
use crate::mailmap::MailMap;
use crate::repository::{DEFAULT_HEAD, GitRepository, HandleState, check_layout, short_ref_name};
use crate::tag::{Tag, TagDetails};
use crate::walk::{CommitWalkAction, WalkOptions, WalkSummary, walk};

/// Shortest abbreviation handed out for commit ids
pub const MIN_ABBREV: usize = 7;

/// A repository read through `git2`
pub struct LibraryRepository {
    repo: Option<Repository>,
    git_dir: PathBuf,
    work_tree: Option<PathBuf>,
    state: HandleState,
}

impl LibraryRepository {
    /// Discover and open the repository containing the given path
    ///
    /// This walks up the directory tree to find a `.git` directory.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if no repository is found.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "repository discovery failed");
            not_found(path)
        })?;
        Ok(Self::from_repository(repo))
    }

    /// Open a repository from an explicit metadata directory
    ///
    /// The work tree, when given, replaces the one recorded in the metadata.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if `git_dir` is not a repository.
    pub fn open_with_git_dir(
        git_dir: impl AsRef<Path>,
        work_tree: Option<&Path>,
    ) -> Result<Self, GitError> {
        let git_dir = git_dir.as_ref();
        let repo = Repository::open(git_dir).map_err(|e| {
            debug!(git_dir = %git_dir.display(), error = %e, "repository open failed");
            not_found(git_dir)
        })?;
        if let Some(work_tree) = work_tree {
            if !work_tree.is_dir() {
                return Err(not_found(work_tree));
            }
            repo.set_workdir(work_tree, false)?;
        }
        Ok(Self::from_repository(repo))
    }

    fn from_repository(repo: Repository) -> Self {
        let git_dir = trim_separator(repo.path());
        let work_tree = repo.workdir().map(trim_separator);
        debug!(git_dir = %git_dir.display(), bare = repo.is_bare(), "opened repository with git2");
        Self {
            repo: Some(repo),
            git_dir,
            work_tree,
            state: HandleState::new(),
        }
    }

    /// The open repository, provided the handle may be read
    fn repository(&self) -> Result<&Repository, GitError> {
        self.state.ensure_readable()?;
        self.repo.as_ref().ok_or(GitError::RepositoryClosed)
    }

    fn corrupt(&self, reason: impl std::fmt::Display) -> GitError {
        GitError::RepositoryCorrupt {
            path: self.git_dir.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Committer date of a commit, used to date lightweight tags
    fn commit_date(&self, repo: &Repository, id: &str) -> Result<DateTime<FixedOffset>, GitError> {
        match self.state.cached_commit(id) {
            Some(commit) => Ok(commit.committer.time),
            None => {
                let commit = find_git2_commit(repo, id)?;
                let when = commit.committer().when();
                timestamp(when.seconds(), when.offset_minutes())
            }
        }
    }
}

impl GitRepository for LibraryRepository {
    fn check(&mut self) -> Result<(), GitError> {
        self.state.ensure_open()?;
        let repo = self.repo.as_ref().ok_or(GitError::RepositoryClosed)?;
        check_layout(repo.path(), repo.commondir())?;
        repo.odb().map_err(|e| self.corrupt(e.message()))?;
        repo.find_reference(DEFAULT_HEAD)
            .map_err(|e| self.corrupt(e.message()))?;
        self.state.mark_checked();
        debug!(git_dir = %self.git_dir.display(), "repository checked");
        Ok(())
    }

    fn is_checked(&self) -> bool {
        self.state.is_checked()
    }

    fn close(&mut self) {
        if self.repo.take().is_some() {
            debug!(git_dir = %self.git_dir.display(), "closed repository");
        }
        self.state.close();
    }

    fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    fn head_ref(&self) -> &str {
        self.state.head_ref()
    }

    fn set_head_ref(&mut self, head_ref: &str) {
        self.state.set_head_ref(head_ref);
    }

    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn work_tree(&self) -> Option<&Path> {
        self.work_tree.as_deref()
    }

    fn branch(&self) -> Result<String, GitError> {
        let repo = self.repository()?;
        let head = repo.find_reference(DEFAULT_HEAD)?;
        if let Some(target) = head.symbolic_target() {
            return Ok(short_ref_name(target).to_string());
        }
        head.target()
            .map(|oid| oid.to_string())
            .ok_or_else(|| GitError::unresolvable(DEFAULT_HEAD, "HEAD has no target"))
    }

    fn is_on_unborn_branch(&self) -> Result<bool, GitError> {
        let repo = self.repository()?;
        if self.head_ref() != DEFAULT_HEAD {
            self.resolve_commit_id(self.head_ref())?;
            return Ok(false);
        }
        let head = repo.find_reference(DEFAULT_HEAD)?;
        let Some(target) = head.symbolic_target() else {
            return Ok(false);
        };
        match repo.find_reference(target) {
            Ok(_) => Ok(false),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_commit_id(&self, reference: &str) -> Result<String, GitError> {
        let repo = self.repository()?;
        let object = repo
            .revparse_single(reference)
            .map_err(|e| GitError::unresolvable(reference, e.message()))?;
        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::unresolvable(reference, e.message()))?;
        Ok(commit.id().to_string())
    }

    fn find_commit(&self, id: &str) -> Result<Commit, GitError> {
        let repo = self.repository()?;
        if let Some(commit) = self.state.cached_commit(id) {
            return Ok(commit);
        }
        let commit = convert_commit(&find_git2_commit(repo, id)?)?;
        trace!(id = %commit.id, "loaded commit");
        self.state.cache_commit(commit.clone());
        Ok(commit)
    }

    fn abbreviated_commit_id(&self, commit: &Commit) -> Result<String, GitError> {
        let repo = self.repository()?;
        if let Some(abbreviation) = self.state.cached_abbreviation(&commit.id) {
            return Ok(abbreviation);
        }
        let odb = repo.odb()?;
        for len in MIN_ABBREV..commit.id.len() {
            let prefix = &commit.id[..len];
            let short = Oid::from_str(prefix)
                .map_err(|e| GitError::unresolvable(&commit.id, e.message()))?;
            match odb.exists_prefix(short, len) {
                Ok(_) => {
                    self.state.cache_abbreviation(&commit.id, prefix);
                    return Ok(prefix.to_string());
                }
                Err(e) if e.code() == ErrorCode::Ambiguous => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.state.cache_abbreviation(&commit.id, &commit.id);
        Ok(commit.id.clone())
    }

    fn is_dirty(&self, include_untracked: bool) -> Result<bool, GitError> {
        let repo = self.repository()?;
        let mut options = StatusOptions::new();
        options
            .include_untracked(include_untracked)
            .recurse_untracked_dirs(false)
            .include_ignored(false)
            .exclude_submodules(true);
        let statuses = repo.statuses(Some(&mut options))?;
        let dirty = statuses.iter().any(|entry| {
            let status = entry.status();
            status != Status::CURRENT
                && !status.contains(Status::IGNORED)
                && (include_untracked || status != Status::WT_NEW)
        });
        debug!(dirty, include_untracked, "checked work tree status");
        Ok(dirty)
    }

    fn tags(&self) -> Result<Vec<Tag>, GitError> {
        let repo = self.repository()?;
        let mut tags = Vec::new();
        for reference in repo.references_glob("refs/tags/*")? {
            let reference = reference?;
            let (Some(full_name), Some(oid)) = (reference.name(), reference.target()) else {
                continue;
            };
            let name = short_ref_name(full_name);
            let object = repo.find_object(oid, None)?;
            match object.kind() {
                Some(ObjectType::Commit) => tags.push(Tag::stub(name, oid.to_string(), false)),
                Some(ObjectType::Tag) => match object.into_tag() {
                    Ok(tag) if tag.target_type() == Some(ObjectType::Commit) => {
                        tags.push(Tag::stub(name, tag.target_id().to_string(), true));
                    }
                    _ => trace!(tag = name, "skipping tag not pointing at a commit"),
                },
                _ => trace!(tag = name, "skipping tag not pointing at a commit"),
            }
        }
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }

    fn load_tag(&self, tag: &mut Tag) -> Result<(), GitError> {
        let repo = self.repository()?;
        if tag.is_loaded() {
            return Ok(());
        }
        let ref_name = format!("refs/tags/{}", tag.name);
        let reference = repo
            .find_reference(&ref_name)
            .map_err(|e| GitError::unresolvable(&ref_name, e.message()))?;
        let oid = reference
            .target()
            .ok_or_else(|| GitError::unresolvable(&ref_name, "symbolic tag"))?;

        let details = if tag.annotated {
            let object = repo.find_tag(oid)?;
            let tagger = object.tagger();
            let date = match &tagger {
                Some(signature) => {
                    let when = signature.when();
                    timestamp(when.seconds(), when.offset_minutes())?
                }
                None => self.commit_date(repo, &tag.target)?,
            };
            TagDetails {
                date,
                tagger: tagger
                    .as_ref()
                    .map(|s| -> Result<Identity, GitError> {
                        Ok(Identity::new(
                            decode_text(s.name_bytes(), None)?,
                            decode_text(s.email_bytes(), None)?,
                        ))
                    })
                    .transpose()?,
                message: object
                    .message_bytes()
                    .map(|m| decode_text(m, None))
                    .transpose()?
                    .map(|m| normalize_message(&m))
                    .filter(|m| !m.is_empty()),
            }
        } else {
            TagDetails {
                date: self.commit_date(repo, &tag.target)?,
                tagger: None,
                message: None,
            }
        };
        tag.hydrate(details);
        trace!(tag = %tag.name, "loaded tag");
        Ok(())
    }

    fn mail_map(&self) -> Result<&MailMap, GitError> {
        self.state.mail_map(self.work_tree())
    }

    fn describe_with(&self, options: &DescribeOptions) -> Result<TagDescription, GitError> {
        crate::describe::describe(self, options)
    }

    fn walk_commits_with(
        &self,
        options: &WalkOptions,
        action: &mut dyn CommitWalkAction,
    ) -> Result<WalkSummary, GitError> {
        walk(self, options, action)
    }
}

fn not_found(path: &Path) -> GitError {
    GitError::RepositoryNotFound {
        path: path.display().to_string(),
    }
}

/// `git2` reports directories with a trailing separator
fn trim_separator(path: &Path) -> PathBuf {
    path.components().collect()
}

fn find_git2_commit<'r>(repo: &'r Repository, id: &str) -> Result<git2::Commit<'r>, GitError> {
    let oid = Oid::from_str(id).map_err(|e| GitError::unresolvable(id, e.message()))?;
    repo.find_commit(oid)
        .map_err(|e| GitError::unresolvable(id, e.message()))
}

fn convert_signature(
    signature: &git2::Signature<'_>,
    encoding: Option<&str>,
) -> Result<Signature, GitError> {
    let when = signature.when();
    Ok(Signature {
        name: decode_text(signature.name_bytes(), encoding)?,
        email: decode_text(signature.email_bytes(), encoding)?,
        time: timestamp(when.seconds(), when.offset_minutes())?,
    })
}

/// Extract commit metadata from a git2 commit
fn convert_commit(commit: &git2::Commit<'_>) -> Result<Commit, GitError> {
    let encoding = commit.message_encoding();
    Ok(Commit {
        id: commit.id().to_string(),
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
        author: convert_signature(&commit.author(), encoding)?,
        committer: convert_signature(&commit.committer(), encoding)?,
        message: normalize_message(&decode_text(commit.message_bytes(), encoding)?),
    })
}
