// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! In-memory repository for unit tests of the walk and describe engines

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::commit::tests::signature;
use crate::commit::{Commit, Identity, timestamp};
use crate::description::{DescribeOptions, TagDescription};
use crate::error::GitError;
use crate::mailmap::MailMap;
use crate::repository::{DEFAULT_HEAD, GitRepository};
use crate::tag::{Tag, TagDetails};
use crate::walk::{CommitWalkAction, WalkOptions, WalkSummary, walk};

/// A commit graph built by hand; ids are sequential hex numbers
pub(crate) struct MemoryRepository {
    commits: HashMap<String, Commit>,
    tags: BTreeMap<String, (Tag, TagDetails)>,
    head: Option<String>,
    head_ref: String,
    dirty: bool,
    mail_map: MailMap,
}

impl MemoryRepository {
    pub(crate) fn new() -> Self {
        Self {
            commits: HashMap::new(),
            tags: BTreeMap::new(),
            head: None,
            head_ref: DEFAULT_HEAD.to_string(),
            dirty: false,
            mail_map: MailMap::empty(),
        }
    }

    /// Add a commit and return its id
    pub(crate) fn commit(&mut self, message: &str, parents: &[&str], seconds: i64) -> String {
        let id = format!("{:040x}", self.commits.len() + 1);
        let commit = Commit {
            id: id.clone(),
            parents: parents.iter().map(|p| (*p).to_string()).collect(),
            author: signature("Author", "author@example.com", seconds),
            committer: signature("Committer", "committer@example.com", seconds),
            message: message.to_string(),
        };
        self.commits.insert(id.clone(), commit);
        id
    }

    pub(crate) fn set_head(&mut self, id: &str) {
        self.head = Some(id.to_string());
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Add a tag created at `seconds`
    pub(crate) fn tag(&mut self, name: &str, target: &str, annotated: bool, seconds: i64) {
        let details = TagDetails {
            date: timestamp(seconds, 0).expect("valid timestamp"),
            tagger: annotated.then(|| Identity::new("Tagger", "tagger@example.com")),
            message: annotated.then(|| format!("Release {name}")),
        };
        self.tags.insert(
            name.to_string(),
            (Tag::stub(name, target, annotated), details),
        );
    }

    /// Id of the commit with this message
    pub(crate) fn id_of(&self, message: &str) -> String {
        self.commits
            .values()
            .find(|commit| commit.message == message)
            .map(|commit| commit.id.clone())
            .expect("commit exists")
    }
}

impl GitRepository for MemoryRepository {
    fn check(&mut self) -> Result<(), GitError> {
        Ok(())
    }

    fn is_checked(&self) -> bool {
        true
    }

    fn close(&mut self) {}

    fn is_closed(&self) -> bool {
        false
    }

    fn head_ref(&self) -> &str {
        &self.head_ref
    }

    fn set_head_ref(&mut self, head_ref: &str) {
        self.head_ref = head_ref.to_string();
    }

    fn git_dir(&self) -> &Path {
        Path::new(".git")
    }

    fn work_tree(&self) -> Option<&Path> {
        None
    }

    fn branch(&self) -> Result<String, GitError> {
        Ok("main".to_string())
    }

    fn is_on_unborn_branch(&self) -> Result<bool, GitError> {
        Ok(self.head.is_none())
    }

    fn resolve_commit_id(&self, reference: &str) -> Result<String, GitError> {
        if reference == DEFAULT_HEAD {
            return self
                .head
                .clone()
                .ok_or_else(|| GitError::unresolvable(reference, "no commits"));
        }
        if self.commits.contains_key(reference) {
            return Ok(reference.to_string());
        }
        self.tags
            .get(reference)
            .map(|(tag, _)| tag.target.clone())
            .ok_or_else(|| GitError::unresolvable(reference, "unknown"))
    }

    fn find_commit(&self, id: &str) -> Result<Commit, GitError> {
        self.commits
            .get(id)
            .cloned()
            .ok_or_else(|| GitError::unresolvable(id, "missing commit"))
    }

    fn abbreviated_commit_id(&self, commit: &Commit) -> Result<String, GitError> {
        Ok(commit.id[..7].to_string())
    }

    fn is_dirty(&self, _include_untracked: bool) -> Result<bool, GitError> {
        Ok(self.dirty)
    }

    fn tags(&self) -> Result<Vec<Tag>, GitError> {
        Ok(self.tags.values().map(|(tag, _)| tag.clone()).collect())
    }

    fn load_tag(&self, tag: &mut Tag) -> Result<(), GitError> {
        let (_, details) = self
            .tags
            .get(&tag.name)
            .ok_or_else(|| GitError::unresolvable(&tag.name, "unknown tag"))?;
        tag.hydrate(details.clone());
        Ok(())
    }

    fn mail_map(&self) -> Result<&MailMap, GitError> {
        Ok(&self.mail_map)
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
