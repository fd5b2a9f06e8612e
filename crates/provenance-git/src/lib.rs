// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! provenance-git: read-only git repository introspection
//!
//! This library crate answers the questions a build asks about its own
//! source tree: which commit and branch it is on, whether the work tree is
//! dirty, how it describes relative to the nearest tag, and who contributed.
//! Two interchangeable backends sit behind [`GitRepository`]: one on the
//! embedded `git2` library and one driving the `git` executable.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use provenance_git::{Backend, open_repository};
//!
//! let repo = open_repository(&Backend::Library, Path::new("."), None)
//!     .expect("open repo");
//! let head = repo.head_commit().expect("head commit");
//!
//! println!("{} on {}", repo.describe().expect("describe"), repo.branch().expect("branch"));
//! println!("{} - {}", head.id, head.subject());
//! ```

pub mod commit;
pub mod describe;
pub mod description;
pub mod error;
pub mod library;
pub mod mailmap;
pub mod process;
pub mod repository;
pub mod tag;
pub mod walk;

#[cfg(test)]
mod testing;

pub use commit::{Commit, Identity, Signature};
pub use description::{DescribeOptions, TagDescription};
pub use error::{GitError, GitErrorKind};
pub use library::LibraryRepository;
pub use mailmap::MailMap;
pub use process::ProcessRepository;
pub use repository::{Backend, GitRepository, open_repository};
pub use tag::{Tag, TagDetails};
pub use walk::{CommitWalkAction, CountCommits, WalkControl, WalkOptions, WalkSummary};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::{Commit, Identity, Signature};
    pub use crate::description::{DescribeOptions, TagDescription};
    pub use crate::error::GitError;
    pub use crate::repository::{Backend, GitRepository, open_repository};
    pub use crate::tag::Tag;
    pub use crate::walk::{CommitWalkAction, WalkControl, WalkOptions};
}
