//! Core data models used throughout rankfeed.
//!
//! These types represent the raw records, ranked items, and snapshots that
//! flow through the refresh pipeline. Everything here is immutable once
//! constructed; a refresh builds new values instead of editing old ones.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Format used for `generated_at` in every user-facing view.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Raw record produced by a fetcher before ranking.
///
/// The title and link come from the listing entry; `score_text` is the
/// score annotation paired with it positionally, if the entry had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub title: String,
    pub link: String,
    pub score_text: Option<String>,
}

impl RawRecord {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        score_text: Option<impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            score_text: score_text.map(Into::into),
        }
    }
}

/// A ranked listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub score: u32,
}

/// An immutable, fully-ranked list of items plus when it was produced.
///
/// `generation` is assigned by the [`SnapshotStore`](crate::snapshot::SnapshotStore)
/// at install time and increases by one per installed snapshot. The empty
/// snapshot has generation 0 and no timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    items: Vec<Item>,
    generated_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl Snapshot {
    /// The snapshot served before any refresh has succeeded.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            generated_at: None,
            generation: 0,
        }
    }

    /// Builds an uninstalled snapshot. The store assigns its generation.
    pub fn new(items: Vec<Item>, generated_at: DateTime<Utc>) -> Self {
        Self {
            items,
            generated_at: Some(generated_at),
            generation: 0,
        }
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `generated_at` rendered for display, or `"Never"` for the empty snapshot.
    pub fn generated_at_display(&self) -> String {
        match self.generated_at {
            Some(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            None => "Never".to_string(),
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
