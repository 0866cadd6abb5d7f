//! The shared snapshot store.
//!
//! Holds the current [`Snapshot`] behind `RwLock<Arc<_>>`. Writers build a
//! complete snapshot outside the lock and swap the `Arc` in; readers clone
//! the `Arc` out and enumerate it lock-free. Either way the critical section
//! is a pointer copy, so a reader can never observe a half-built list.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::models::{Item, Snapshot};

/// Whether any snapshot has been installed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Empty,
    Populated,
}

impl StoreState {
    /// State implied by `snapshot`: only the never-installed empty snapshot
    /// has generation 0.
    pub fn of(snapshot: &Snapshot) -> Self {
        if snapshot.generation() == 0 {
            StoreState::Empty
        } else {
            StoreState::Populated
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreState::Empty => "empty",
            StoreState::Populated => "populated",
        }
    }
}

/// Process-wide holder of the current snapshot.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
        }
    }

    /// Returns the current snapshot.
    ///
    /// The returned `Arc` stays valid and unchanged even if a `replace`
    /// lands right after this call.
    pub fn read(&self) -> Arc<Snapshot> {
        // The guarded value is always a whole snapshot, so a poisoned lock
        // is still safe to read through.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Builds a snapshot from `items` and installs it. See [`install`](Self::install).
    pub fn replace(&self, items: Vec<Item>, generated_at: DateTime<Utc>) -> Arc<Snapshot> {
        self.install(Snapshot::new(items, generated_at))
    }

    /// Installs `snapshot` as current, stamping it with the next generation.
    ///
    /// Returns the installed snapshot.
    pub fn install(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let installed = Arc::new(snapshot.with_generation(current.generation() + 1));
        *current = Arc::clone(&installed);
        installed
    }

    pub fn state(&self) -> StoreState {
        StoreState::of(&self.read())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn items_tagged(tag: u32, n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item {
                title: format!("gen-{}-{}", tag, i),
                link: format!("https://example.com/{}/{}", tag, i),
                score: tag,
            })
            .collect()
    }

    #[test]
    fn test_starts_empty() {
        let store = SnapshotStore::new();
        assert_eq!(store.state(), StoreState::Empty);
        let snap = store.read();
        assert!(snap.is_empty());
        assert!(snap.generated_at().is_none());
    }

    #[test]
    fn test_replace_then_read_returns_installed() {
        let store = SnapshotStore::new();
        let now = Utc::now();
        let installed = store.replace(items_tagged(150, 3), now);
        let read = store.read();
        assert!(Arc::ptr_eq(&installed, &read));
        assert_eq!(read.items(), items_tagged(150, 3).as_slice());
        assert_eq!(read.generated_at(), Some(now));
        assert_eq!(store.state(), StoreState::Populated);
    }

    #[test]
    fn test_generation_increments() {
        let store = SnapshotStore::new();
        assert_eq!(store.replace(vec![], Utc::now()).generation(), 1);
        assert_eq!(store.replace(vec![], Utc::now()).generation(), 2);
        // An empty ranking still counts as populated.
        assert_eq!(store.state(), StoreState::Populated);
    }

    #[test]
    fn test_state_of_held_snapshot_ignores_later_replace() {
        let store = SnapshotStore::new();
        let held = store.read();
        store.replace(items_tagged(200, 1), Utc::now());
        assert_eq!(StoreState::of(&held), StoreState::Empty);
        assert_eq!(StoreState::of(&store.read()), StoreState::Populated);
        assert_eq!(store.state(), StoreState::Populated);
    }

    #[test]
    fn test_held_snapshot_survives_replace() {
        let store = SnapshotStore::new();
        store.replace(items_tagged(200, 2), Utc::now());
        let held = store.read();
        store.replace(items_tagged(300, 5), Utc::now());
        assert_eq!(held.len(), 2);
        assert!(held.items().iter().all(|i| i.score == 200));
        assert_eq!(store.read().len(), 5);
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_snapshot() {
        let store = Arc::new(SnapshotStore::new());
        store.replace(items_tagged(1, 50), Utc::now());

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for tag in 2..=200u32 {
                    let len = 10 + (tag as usize % 40);
                    store.replace(items_tagged(tag, len), Utc::now());
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut last_generation = 0;
                    for _ in 0..2_000 {
                        let snap = store.read();
                        let tag = snap.items()[0].score;
                        assert!(snap.items().iter().all(|i| i.score == tag));
                        let expected_len = if tag == 1 { 50 } else { 10 + (tag as usize % 40) };
                        assert_eq!(snap.len(), expected_len);
                        assert!(snap.generation() >= last_generation);
                        last_generation = snap.generation();
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.read().generation(), 200);
    }
}
