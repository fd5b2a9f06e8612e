// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Shared helpers for provenance-cli tests

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use provenance_cli::config::Config;
use tempfile::TempDir;

/// Base timestamp for fixture commits (2023-11-14 22:13:20 UTC)
pub const EPOCH: i64 = 1_700_000_000;

// ============================================================================
// Fixture repositories
// ============================================================================

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

    /// Write, stage and commit a file on `main` as Tester
    pub fn commit(&self, message: &str, seconds: i64) -> Oid {
        self.commit_as("Tester", "tester@example.com", message, seconds)
    }

    /// Write, stage and commit a file on `main` as a specific author
    pub fn commit_as(&self, name: &str, email: &str, message: &str, seconds: i64) -> Oid {
        self.write("history.txt", &format!("{message}\n"));
        let mut index = self.repo.index().expect("index");
        index.add_path(Path::new("history.txt")).expect("add");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.target())
            .map(|oid| self.repo.find_commit(oid).expect("parent"));
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let signature = signature(name, email, seconds);
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .expect("commit")
    }

    pub fn annotated_tag(&self, name: &str, target: Oid, message: &str, seconds: i64) {
        let object = self.repo.find_object(target, None).expect("target");
        let tagger = signature("Tagger", "tagger@example.com", seconds);
        self.repo
            .tag(name, &object, &tagger, message, false)
            .expect("annotated tag");
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
}

/// UTC signature at `seconds`
pub fn signature(name: &str, email: &str, seconds: i64) -> Signature<'static> {
    Signature::new(name, email, &Time::new(seconds, 0)).expect("signature")
}

/// Three releases: `v1.0` on the first commit, `v1.1` on the third,
/// and two untagged commits on top
pub fn release_history() -> (Fixture, Vec<Oid>) {
    let fixture = Fixture::new();
    let ids = vec![
        fixture.commit("Initial import", EPOCH),
        fixture.commit("Add parser", EPOCH + 86_400),
        fixture.commit("Fix parser crash\n\nCloses #12", EPOCH + 2 * 86_400),
        fixture.commit("Document options", EPOCH + 3 * 86_400),
        fixture.commit("WIP: refactor", EPOCH + 4 * 86_400),
    ];
    fixture.annotated_tag("v1.0", ids[0], "First release", EPOCH + 3_600);
    fixture.annotated_tag("v1.1", ids[2], "Bug fixes", EPOCH + 2 * 86_400 + 3_600);
    (fixture, ids)
}

/// Whether the `git` executable can be run
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

// ============================================================================
// Configuration helpers
// ============================================================================

/// Parse `args` after the binary name, pointing the config at `repository`
pub fn config_for(repository: &Path, args: &[&str]) -> Config {
    let repository = repository.to_string_lossy().to_string();
    let mut argv = vec!["provenance", "-r", repository.as_str()];
    argv.extend_from_slice(args);
    let config = <Config as clap::Parser>::try_parse_from(argv).expect("parse should succeed");
    config.validate().expect("valid config");
    config
}

/// Restores an environment variable on drop
pub struct EnvGuard {
    key: String,
    original: Option<String>,
}

impl EnvGuard {
    /// Set an environment variable, returning a guard that restores it on drop
    pub fn set(key: &str, value: &str) -> Self {
        let original = std::env::var(key).ok();
        // SAFETY: only the single test in the env test binary touches these variables
        unsafe { std::env::set_var(key, value) };
        Self {
            key: key.to_string(),
            original,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: see `EnvGuard::set`
        unsafe {
            match &self.original {
                Some(val) => std::env::set_var(&self.key, val),
                None => std::env::remove_var(&self.key),
            }
        }
    }
}
