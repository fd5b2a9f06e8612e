// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! `.mailmap` parsing and identity canonicalization
//!
//! Supported line forms (see `git help shortlog`):
//!
//! ```text
//! Proper Name <commit@email>
//! <proper@email> <commit@email>
//! Proper Name <proper@email> <commit@email>
//! Proper Name <proper@email> Commit Name <commit@email>
//! ```
//!
//! Emails match case-insensitively, names match exactly.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::commit::{Commit, Identity, Signature};
use crate::error::GitError;

/// File name looked up in the work tree
pub const MAILMAP_FILE: &str = ".mailmap";

static MAIL_TO_MAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(\S+)>\s+<(\S+)>$").expect("valid regex"));
static MAIL_TO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S.*?)\s+<(\S+)>$").expect("valid regex"));
static MAIL_TO_NAME_AND_MAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S.*?)\s+<(\S+)>\s+<(\S+)>$").expect("valid regex"));
static NAME_AND_MAIL_TO_NAME_AND_MAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S.*?)\s+<(\S+)>\s+(\S.*?)\s+<(\S+)>$").expect("valid regex")
});

/// Canonical identities parsed from a `.mailmap` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMap {
    exists: bool,
    mail_to_mail: HashMap<String, String>,
    mail_to_name: HashMap<String, String>,
    mail_to_identity: HashMap<String, Identity>,
    identity_to_identity: HashMap<(String, String), Identity>,
}

impl MailMap {
    /// An empty mail map that maps every identity to itself
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the contents of a mail map file
    ///
    /// Lines not matching a recognized form are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut map = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(caps) = NAME_AND_MAIL_TO_NAME_AND_MAIL.captures(line) {
                map.identity_to_identity.insert(
                    (caps[3].to_string(), caps[4].to_lowercase()),
                    Identity::new(&caps[1], &caps[2]),
                );
            } else if let Some(caps) = MAIL_TO_NAME_AND_MAIL.captures(line) {
                map.mail_to_identity
                    .insert(caps[3].to_lowercase(), Identity::new(&caps[1], &caps[2]));
            } else if let Some(caps) = MAIL_TO_MAIL.captures(line) {
                map.mail_to_mail
                    .insert(caps[2].to_lowercase(), caps[1].to_string());
            } else if let Some(caps) = MAIL_TO_NAME.captures(line) {
                map.mail_to_name
                    .insert(caps[2].to_lowercase(), caps[1].to_string());
            }
        }

        map.exists = !map.is_empty();
        map
    }

    /// Read `.mailmap` from a work tree
    ///
    /// A missing file yields an empty map; any other read failure is an error.
    ///
    /// # Errors
    ///
    /// Returns `GitError::MailMap` if the file exists but cannot be read.
    pub fn from_work_tree(work_tree: &Path) -> Result<Self, GitError> {
        let path = work_tree.join(MAILMAP_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let map = Self::parse(&content);
                debug!(path = %path.display(), exists = map.exists, "parsed mailmap");
                Ok(map)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::empty()),
            Err(source) => Err(GitError::MailMap { path, source }),
        }
    }

    /// Whether a mail map file was found and contained at least one mapping
    #[must_use]
    pub fn exists(&self) -> bool {
        self.exists
    }

    fn is_empty(&self) -> bool {
        self.mail_to_mail.is_empty()
            && self.mail_to_name.is_empty()
            && self.mail_to_identity.is_empty()
            && self.identity_to_identity.is_empty()
    }

    /// Canonical email for a name/email pair as found in a commit
    #[must_use]
    pub fn canonical_email(&self, name: &str, email: &str) -> String {
        let key = email.to_lowercase();
        if let Some(mail) = self.mail_to_mail.get(&key) {
            return mail.clone();
        }
        if let Some(identity) = self.mail_to_identity.get(&key) {
            return identity.email.clone();
        }
        if let Some(identity) = self.identity_to_identity.get(&(name.to_string(), key)) {
            return identity.email.clone();
        }
        email.to_string()
    }

    /// Canonical name for a name/email pair as found in a commit
    #[must_use]
    pub fn canonical_name(&self, name: &str, email: &str) -> String {
        let key = email.to_lowercase();
        if let Some(proper) = self.mail_to_name.get(&key) {
            return proper.clone();
        }
        if let Some(identity) = self.mail_to_identity.get(&key) {
            return identity.name.clone();
        }
        if let Some(identity) = self.identity_to_identity.get(&(name.to_string(), key)) {
            return identity.name.clone();
        }
        name.to_string()
    }

    /// Canonical identity for a signature
    #[must_use]
    pub fn canonical(&self, signature: &Signature) -> Identity {
        Identity::new(
            self.canonical_name(&signature.name, &signature.email),
            self.canonical_email(&signature.name, &signature.email),
        )
    }

    /// Canonical identity of a commit's author
    #[must_use]
    pub fn canonical_author(&self, commit: &Commit) -> Identity {
        self.canonical(&commit.author)
    }

    /// Canonical identity of a commit's committer
    #[must_use]
    pub fn canonical_committer(&self, commit: &Commit) -> Identity {
        self.canonical(&commit.committer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::tests::sample_commit;
    use similar_asserts::assert_eq;

    const SAMPLE: &str = "\
# comment line
<newmail@example.com> <oldmail@example.com>
Real Name <realmail@example.com>
Real Name <newmail@example.com> <oldmail2@example.com>
Real Name <newmail@example.com> Fake Name <oldmail3@example.com>
this line is not a mapping
";

    #[test]
    fn test_parse_all_forms() {
        let map = MailMap::parse(SAMPLE);
        assert!(map.exists());
        assert_eq!(map.mail_to_mail.len(), 1);
        assert_eq!(map.mail_to_name.len(), 1);
        assert_eq!(map.mail_to_identity.len(), 1);
        assert_eq!(map.identity_to_identity.len(), 1);
    }

    #[test]
    fn test_canonical_email() {
        let map = MailMap::parse(SAMPLE);
        assert_eq!(
            map.canonical_email("Test", "oldmail@example.com"),
            "newmail@example.com"
        );
        assert_eq!(
            map.canonical_email("Test", "oldmail2@example.com"),
            "newmail@example.com"
        );
        assert_eq!(
            map.canonical_email("Fake Name", "oldmail3@example.com"),
            "newmail@example.com"
        );
        assert_eq!(
            map.canonical_email("Test", "unknown@example.com"),
            "unknown@example.com"
        );
    }

    #[test]
    fn test_canonical_name() {
        let map = MailMap::parse(SAMPLE);
        assert_eq!(map.canonical_name("Whoever", "realmail@example.com"), "Real Name");
        assert_eq!(map.canonical_name("Whoever", "oldmail2@example.com"), "Real Name");
        assert_eq!(map.canonical_name("Fake Name", "oldmail3@example.com"), "Real Name");
        assert_eq!(map.canonical_name("Unknown", "oldmail3@example.com"), "Unknown");
    }

    #[test]
    fn test_email_match_is_case_insensitive() {
        let map = MailMap::parse(SAMPLE);
        assert_eq!(map.canonical_name("x", "RealMail@Example.com"), "Real Name");
    }

    #[test]
    fn test_name_and_mail_requires_matching_name() {
        let map = MailMap::parse(SAMPLE);
        assert_eq!(
            map.canonical_email("Other Name", "oldmail3@example.com"),
            "oldmail3@example.com"
        );
    }

    #[test]
    fn test_comments_and_garbage_only_do_not_exist() {
        let map = MailMap::parse("# just a comment\n\nnot a mapping\n");
        assert!(!map.exists());
    }

    #[test]
    fn test_canonical_author_uses_author_fields() {
        let map = MailMap::parse("Canonical Author <test@example.com>\n");
        let commit = sample_commit();
        let author = map.canonical_author(&commit);
        assert_eq!(author.name, "Canonical Author");
        assert_eq!(author.email, "test@example.com");
        let committer = map.canonical_committer(&commit);
        assert_eq!(committer.name, "Test Committer");
    }

    #[test]
    fn test_canonicalization_does_not_mutate_commit() {
        let map = MailMap::parse("Canonical Author <test@example.com>\n");
        let commit = sample_commit();
        let before = commit.clone();
        let _ = map.canonical_author(&commit);
        assert_eq!(commit, before);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let map = MailMap::from_work_tree(dir.path()).expect("missing file is fine");
        assert!(!map.exists());
    }

    #[test]
    fn test_reads_file_from_work_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(MAILMAP_FILE), SAMPLE).expect("write");
        let map = MailMap::from_work_tree(dir.path()).expect("parse");
        assert!(map.exists());
    }

    #[test]
    fn test_unreadable_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory in place of the file cannot be read as a string
        std::fs::create_dir(dir.path().join(MAILMAP_FILE)).expect("mkdir");
        let result = MailMap::from_work_tree(dir.path());
        assert!(matches!(result, Err(GitError::MailMap { .. })));
    }
}
