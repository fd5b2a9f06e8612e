// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Git tag types
//!
//! Listing tags yields stubs (name, target, kind). The annotation metadata is
//! only read when a backend hydrates the stub through
//! [`GitRepository::load_tag`](crate::GitRepository::load_tag).

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::commit::Identity;

/// Metadata of a hydrated tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDetails {
    /// Tagger date for annotated tags, committer date of the target otherwise
    pub date: DateTime<FixedOffset>,
    /// Who created the annotated tag
    pub tagger: Option<Identity>,
    /// Annotation message with trailing line breaks removed
    pub message: Option<String>,
}

/// A tag pointing (possibly through a tag object) at a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Short ref name, e.g. `v1.0.0`
    pub name: String,
    /// Id of the commit this tag resolves to
    pub target: String,
    /// Whether a tag object exists (as opposed to a bare ref)
    pub annotated: bool,
    /// `None` until the tag is loaded
    details: Option<TagDetails>,
}

impl Tag {
    /// Create an unloaded tag stub
    #[must_use]
    pub fn stub(name: impl Into<String>, target: impl Into<String>, annotated: bool) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            annotated,
            details: None,
        }
    }

    /// Whether the annotation metadata has been read
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.details.is_some()
    }

    /// Hydrated metadata, if loaded
    #[must_use]
    pub fn details(&self) -> Option<&TagDetails> {
        self.details.as_ref()
    }

    /// Creation date, if loaded
    #[must_use]
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.details.as_ref().map(|d| d.date)
    }

    /// Timezone the tag was created in, if loaded
    #[must_use]
    pub fn timezone(&self) -> Option<FixedOffset> {
        self.date().map(|date| *date.offset())
    }

    /// Annotation message, if loaded and annotated
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.message.as_deref())
    }

    /// Tagger identity, if loaded and annotated
    #[must_use]
    pub fn tagger(&self) -> Option<&Identity> {
        self.details.as_ref().and_then(|d| d.tagger.as_ref())
    }

    /// Attach metadata read by a backend; a loaded tag keeps its first details
    pub(crate) fn hydrate(&mut self, details: TagDetails) {
        if self.details.is_none() {
            self.details = Some(details);
        }
    }
}
