//! Synchronization engine for the station state.
//!
//! This module implements the moving parts behind the public facade:
//!  - `SyncController`: owns the feeds and publishes consistent snapshots.
//!  - `PollScheduler`: one background task per feed with an adaptive timer.
//!  - `HistoryStore`: durable play history (SQLite, with an in-memory
//!    implementation for tests).
//!  - `reconcile`: merges live feed items with persisted history into the
//!    bounded recent-tracks list.
//!
//! The implementation is split across submodules to keep concerns isolated
//! (configuration, persistence, scheduling, reconciliation).

pub mod config;
pub mod constants;
mod controller;
mod history;
pub mod reconcile;
mod scheduler;

pub use config::{ApiConfig, HistoryConfig, PollingConfig, SyncConfig};
pub use controller::{SnapshotCallback, SyncController, SyncSnapshot};
pub use history::{
    history_store_from_config, save_track, HistoryStore, MemoryHistoryStore, SqliteHistoryStore,
};
pub use scheduler::{FeedHandler, PollScheduler, RearmPolicy};
