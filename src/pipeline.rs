//! The refresh pipeline: fetch → rank → install.
//!
//! [`Refresher`] is shared by the scheduler and the on-demand refresh
//! endpoint. Whole pipeline runs are serialized through an async mutex
//! (the gate), not just the final store write, so two fetches never race
//! to decide which result is newer.
//!
//! A caller that has to wait on the gate checks, once it gets in, whether
//! the run ahead of it installed a snapshot. If so it adopts that snapshot
//! instead of fetching again ([`Refresh::Coalesced`]). If the run ahead
//! failed, the waiter performs its own fetch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetch::{FetchError, Fetcher};
use crate::models::Snapshot;
use crate::rank::rank_with_threshold;
use crate::snapshot::SnapshotStore;

/// Why a refresh did not install a new snapshot.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The source answered but yielded no records at all. Distinct from a
    /// listing where every record falls below the threshold.
    #[error("source returned no records")]
    EmptySource,

    #[error("fetch did not complete within {0:?}")]
    Timeout(Duration),
}

impl RefreshError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            RefreshError::Fetch(_) => "fetch_failed",
            RefreshError::EmptySource => "empty_source",
            RefreshError::Timeout(_) => "timeout",
        }
    }
}

/// Outcome of a successful refresh call.
#[derive(Debug, Clone)]
pub enum Refresh {
    /// This call fetched and installed the snapshot.
    Installed(Arc<Snapshot>),
    /// Another run finished while this call waited; its snapshot is returned.
    Coalesced(Arc<Snapshot>),
}

impl Refresh {
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        match self {
            Refresh::Installed(s) | Refresh::Coalesced(s) => s,
        }
    }

    pub fn into_snapshot(self) -> Arc<Snapshot> {
        match self {
            Refresh::Installed(s) | Refresh::Coalesced(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Refresh::Installed(_) => "installed",
            Refresh::Coalesced(_) => "coalesced",
        }
    }
}

/// Runs the refresh pipeline against a shared store.
pub struct Refresher {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<SnapshotStore>,
    gate: Mutex<()>,
    score_threshold: u32,
    fetch_timeout: Duration,
}

impl Refresher {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<SnapshotStore>,
        score_threshold: u32,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            gate: Mutex::new(()),
            score_threshold,
            fetch_timeout,
        }
    }

    pub fn from_config(fetcher: Arc<dyn Fetcher>, store: Arc<SnapshotStore>, config: &Config) -> Self {
        Self::new(
            fetcher,
            store,
            config.ranking.score_threshold,
            config.fetch_timeout(),
        )
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Runs fetch → rank → install, or joins the run already in flight.
    ///
    /// On error the store is left untouched.
    pub async fn refresh(&self) -> Result<Refresh, RefreshError> {
        let seen = self.store.read().generation();
        let _guard = self.gate.lock().await;

        let current = self.store.read();
        if current.generation() != seen {
            debug!(
                generation = current.generation(),
                "refresh coalesced into completed run"
            );
            return Ok(Refresh::Coalesced(current));
        }

        info!(source = self.fetcher.source(), "refreshing");
        let records = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch())
            .await
            .map_err(|_| RefreshError::Timeout(self.fetch_timeout))??;

        if records.is_empty() {
            return Err(RefreshError::EmptySource);
        }

        let fetched = records.len();
        let items = rank_with_threshold(records, self.score_threshold);
        let installed = self.store.replace(items, Utc::now());
        info!(
            fetched,
            kept = installed.len(),
            generation = installed.generation(),
            "snapshot installed"
        );
        Ok(Refresh::Installed(installed))
    }

    /// Like [`refresh`](Self::refresh), but logs a failure instead of
    /// returning it. Used where no caller is waiting on the result.
    pub async fn refresh_logged(&self) -> Option<Refresh> {
        match self.refresh().await {
            Ok(refresh) => Some(refresh),
            Err(e) => {
                warn!(
                    code = e.code(),
                    error = %e,
                    "refresh failed; keeping previous snapshot"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;
    use crate::snapshot::StoreState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns canned records, optionally after a delay, counting calls.
    struct ScriptedFetcher {
        scores: Vec<&'static str>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(scores: Vec<&'static str>) -> Self {
            Self {
                scores,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn slow(scores: Vec<&'static str>, delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new(scores)
            }
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        fn source(&self) -> &str {
            "scripted"
        }

        async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self
                .scores
                .iter()
                .enumerate()
                .map(|(i, s)| RawRecord::new(format!("story {}", i), format!("https://e.com/{}", i), Some(*s)))
                .collect())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl Fetcher for FailingFetcher {
        fn source(&self) -> &str {
            "failing"
        }

        async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
            Err(FetchError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                url: "http://source.invalid".to_string(),
            })
        }
    }

    fn refresher(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Refresher {
        Refresher::new(fetcher, Arc::new(SnapshotStore::new()), 100, timeout)
    }

    #[tokio::test]
    async fn test_refresh_installs_ranked_snapshot() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            "150 points",
            "80 points",
            "300 points",
            "n/a",
        ]));
        let r = refresher(fetcher, Duration::from_secs(5));

        let outcome = r.refresh().await.unwrap();
        assert_eq!(outcome.kind(), "installed");
        let scores: Vec<u32> = outcome.snapshot().items().iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![300, 150]);
        assert!(Arc::ptr_eq(outcome.snapshot(), &r.store().read()));
        assert_eq!(r.store().state(), StoreState::Populated);
    }

    #[tokio::test]
    async fn test_all_below_threshold_installs_empty_snapshot() {
        let r = refresher(
            Arc::new(ScriptedFetcher::new(vec!["5 points", "99 points"])),
            Duration::from_secs(5),
        );
        let outcome = r.refresh().await.unwrap();
        assert!(outcome.snapshot().is_empty());
        assert_eq!(outcome.snapshot().generation(), 1);
        assert_eq!(r.store().state(), StoreState::Populated);
    }

    #[tokio::test]
    async fn test_empty_source_keeps_previous_snapshot() {
        let store = Arc::new(SnapshotStore::new());
        store.replace(vec![], Utc::now());
        let before = store.read();

        let r = Refresher::new(
            Arc::new(ScriptedFetcher::new(vec![])),
            Arc::clone(&store),
            100,
            Duration::from_secs(5),
        );
        let err = r.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::EmptySource));
        assert_eq!(err.code(), "empty_source");
        assert!(Arc::ptr_eq(&before, &store.read()));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_snapshot() {
        let r = refresher(Arc::new(FailingFetcher), Duration::from_secs(5));
        let err = r.refresh().await.unwrap_err();
        assert_eq!(err.code(), "fetch_failed");
        assert_eq!(r.store().state(), StoreState::Empty);
        assert!(r.refresh_logged().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_fetch_times_out() {
        let fetcher = Arc::new(ScriptedFetcher::slow(
            vec!["500 points"],
            Duration::from_secs(30),
        ));
        let r = refresher(fetcher, Duration::from_millis(50));
        let err = r.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::Timeout(_)));
        assert_eq!(r.store().state(), StoreState::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refreshes_fetch_once() {
        let fetcher = Arc::new(ScriptedFetcher::slow(
            vec!["200 points", "400 points"],
            Duration::from_millis(200),
        ));
        let r = Arc::new(refresher(fetcher.clone(), Duration::from_secs(5)));

        let scheduled = {
            let r = Arc::clone(&r);
            tokio::spawn(async move { r.refresh().await })
        };
        // Let the first run take the gate before the second arrives.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let on_demand = r.refresh().await.unwrap();
        let scheduled = scheduled.await.unwrap().unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduled.kind(), "installed");
        assert_eq!(on_demand.kind(), "coalesced");
        assert!(Arc::ptr_eq(scheduled.snapshot(), on_demand.snapshot()));
        assert_eq!(r.store().read().generation(), 1);
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec!["200 points"]));
        let r = refresher(fetcher.clone(), Duration::from_secs(5));
        r.refresh().await.unwrap();
        let second = r.refresh().await.unwrap();
        assert_eq!(second.kind(), "installed");
        assert_eq!(second.snapshot().generation(), 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }
}
