// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fixture repositories built with git2 in temporary directories

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use provenance_git::{Backend, GitRepository, open_repository};
use tempfile::TempDir;

/// Base timestamp for fixture commits
pub const EPOCH: i64 = 1_700_000_000;

/// A throwaway repository on branch `main`
pub struct Fixture {
    pub dir: TempDir,
    pub repo: Repository,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut options = RepositoryInitOptions::new();
        options.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &options).expect("init");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file into the work tree without staging it
    pub fn write(&self, name: &str, content: &str) {
        std::fs::write(self.path().join(name), content).expect("write file");
    }

    /// Write and stage a file
    pub fn stage(&self, name: &str, content: &str) {
        self.write(name, content);
        let mut index = self.repo.index().expect("index");
        index.add_path(Path::new(name)).expect("add");
        index.write().expect("write index");
    }

    /// Commit the index on top of HEAD
    pub fn commit(&self, message: &str, seconds: i64) -> Oid {
        self.commit_as("Tester", "tester@example.com", message, seconds)
    }

    /// Commit the index on top of HEAD with a specific author
    pub fn commit_as(&self, name: &str, email: &str, message: &str, seconds: i64) -> Oid {
        let parents: Vec<Oid> = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.target())
            .into_iter()
            .collect();
        self.commit_with_parents(name, email, message, &parents, seconds)
    }

    /// Commit the index with explicit parents and move `main` to it
    pub fn merge(&self, message: &str, parents: &[Oid], seconds: i64) -> Oid {
        self.commit_with_parents("Tester", "tester@example.com", message, parents, seconds)
    }

    /// Commit the index with explicit parents without touching any ref
    pub fn detached_commit(&self, message: &str, parents: &[Oid], seconds: i64) -> Oid {
        let signature = signature("Tester", "tester@example.com", seconds);
        self.write_commit(&signature, message, parents)
    }

    fn commit_with_parents(
        &self,
        name: &str,
        email: &str,
        message: &str,
        parents: &[Oid],
        seconds: i64,
    ) -> Oid {
        let signature = signature(name, email, seconds);
        let oid = self.write_commit(&signature, message, parents);
        self.repo
            .reference("refs/heads/main", oid, true, "fixture commit")
            .expect("update main");
        oid
    }

    fn write_commit(&self, signature: &Signature<'_>, message: &str, parents: &[Oid]) -> Oid {
        let tree_id = self.repo.index().expect("index").write_tree().expect("tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");
        let parents: Vec<git2::Commit<'_>> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).expect("parent"))
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        self.repo
            .commit(None, signature, signature, message, &tree, &parent_refs)
            .expect("commit")
    }

    /// Write a root commit object byte for byte and move `main` to it
    ///
    /// `headers` is inserted after the committer line, e.g. an `encoding`
    /// header.
    pub fn raw_commit(&self, headers: &[u8], message: &[u8], seconds: i64) -> Oid {
        let tree_id = self.repo.index().expect("index").write_tree().expect("tree");
        let mut object = format!(
            "tree {tree_id}\n\
             author Tester <tester@example.com> {seconds} +0100\n\
             committer Tester <tester@example.com> {seconds} +0100\n"
        )
        .into_bytes();
        object.extend_from_slice(headers);
        object.push(b'\n');
        object.extend_from_slice(message);
        let oid = self
            .repo
            .odb()
            .expect("odb")
            .write(git2::ObjectType::Commit, &object)
            .expect("write commit");
        self.repo
            .reference("refs/heads/main", oid, true, "raw commit")
            .expect("update main");
        oid
    }

    pub fn annotated_tag(&self, name: &str, target: Oid, message: &str, seconds: i64) -> Oid {
        let object = self.repo.find_object(target, None).expect("target");
        let tagger = signature("Tagger", "tagger@example.com", seconds);
        self.repo
            .tag(name, &object, &tagger, message, false)
            .expect("annotated tag")
    }

    pub fn lightweight_tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(target, None).expect("target");
        self.repo
            .tag_lightweight(name, &object, false)
            .expect("lightweight tag");
    }

    pub fn branch(&self, name: &str, target: Oid) {
        self.repo
            .reference(&format!("refs/heads/{name}"), target, true, "fixture branch")
            .expect("branch");
    }

    pub fn detach_head(&self, target: Oid) {
        self.repo.set_head_detached(target).expect("detach");
    }
}

pub fn signature(name: &str, email: &str, seconds: i64) -> Signature<'static> {
    Signature::new(name, email, &Time::new(seconds, 60)).expect("signature")
}

/// A - B - C on main with an annotated `v1` on B
pub fn tagged_linear() -> (Fixture, [Oid; 3]) {
    let fixture = Fixture::new();
    fixture.stage("README.md", "A\n");
    let a = fixture.commit("A", EPOCH);
    fixture.stage("README.md", "B\n");
    let b = fixture.commit("B", EPOCH + 100);
    fixture.stage("README.md", "C\n");
    let c = fixture.commit("C\n\nWith a body", EPOCH + 200);
    fixture.annotated_tag("v1", b, "Release v1\n", EPOCH + 150);
    (fixture, [a, b, c])
}

/// Whether the `git` executable can be run
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Every backend usable on this machine
pub fn backends() -> Vec<Backend> {
    let mut backends = vec![Backend::Library];
    if git_available() {
        backends.push(Backend::process());
    } else {
        eprintln!("git not found, skipping process backend");
    }
    backends
}

pub fn open(backend: &Backend, path: &Path) -> Box<dyn GitRepository> {
    open_repository(backend, path, None).expect("open repository")
}
