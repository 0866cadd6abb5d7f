//! Periodic background refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::pipeline::Refresher;

/// Spawns the refresh loop.
///
/// The first tick fires immediately, so the pipeline runs once at start and
/// then every `period`. A failed run is logged and left for the next tick;
/// there is no retry in between. Runs until the returned handle is aborted.
pub fn spawn_scheduler(refresher: Arc<Refresher>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "scheduler started");
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            refresher.refresh_logged().await;
        }
    })
}
