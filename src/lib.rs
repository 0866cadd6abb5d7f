//! # rankfeed
//!
//! Periodically fetches a ranked item listing (the Hacker News front page by
//! default), keeps the items scoring above a threshold, and serves consistent
//! paginated views while a background task refreshes the data.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌───────────────┐
//! │  Fetcher  │──▶│  Ranker  │──▶│ SnapshotStore │
//! │ HTTP+HTML │   │ >100, ↓  │   │ RwLock<Arc<>> │
//! └───────────┘   └──────────┘   └──────┬────────┘
//!       ▲                               │ read()
//!       │ refresh()                     ▼
//! ┌─────┴──────────────┐         ┌────────────┐
//! │ Refresher (gate)   │◀────────│   HTTP     │
//! │ Scheduler / POST   │         │ GET / page │
//! └────────────────────┘         └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Defaults and TOML overrides |
//! | [`models`] | Raw records, items, snapshots |
//! | [`fetch`] | Fetcher trait and HTTP fetcher |
//! | [`markup`] | Listing page parser |
//! | [`rank`] | Score threshold and ordering |
//! | [`snapshot`] | Atomic snapshot store |
//! | [`pipeline`] | Serialized fetch → rank → install |
//! | [`scheduler`] | Periodic refresh task |
//! | [`paginate`] | Page slicing |
//! | [`server`] | JSON HTTP API |

pub mod config;
pub mod fetch;
pub mod markup;
pub mod models;
pub mod paginate;
pub mod pipeline;
pub mod rank;
pub mod scheduler;
pub mod server;
pub mod snapshot;
