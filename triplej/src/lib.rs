//! # triplej - now-playing sync engine for ABC triple j
//!
//! `triplej` keeps a client-side view of an ABC radio station in sync with
//! the public plays and program APIs. It polls the now-playing endpoint at
//! the cadence the server dictates, normalizes the optional-heavy JSON
//! payloads into stable values, persists play history, and publishes a
//! single consistent snapshot (current track, current program, recent
//! tracks).
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use triplej::{MemoryHistoryStore, SyncConfig, SyncController, TripleJClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TripleJClient::new()?;
//!     let store = Arc::new(MemoryHistoryStore::new());
//!     let controller = SyncController::start(client, store, &SyncConfig::default());
//!
//!     controller.subscribe(Arc::new(|snapshot| {
//!         println!(
//!             "{} - {}",
//!             snapshot.current_track.artist, snapshot.current_track.title
//!         );
//!     }))
//!     .await;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(120)).await;
//!     controller.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Polling model
//!
//! The now-playing payload carries a `next_updated` hint telling clients
//! when fresh data will exist. The scheduler re-arms its single timer one
//! second past that hint, floored at two seconds, and falls back to a
//! fixed 30 second interval when the hint is missing or a fetch fails.
//! The recent-plays search and program guide feeds poll on fixed
//! intervals.

pub mod client;
pub mod error;
pub mod models;
pub mod normalize;
pub mod sync;
pub mod timefmt;

pub use client::{ClientBuilder, TripleJClient};
pub use error::{Error, Result};
pub use models::{PersistedTrackRecord, Program, Track};
pub use sync::{
    history_store_from_config, HistoryStore, MemoryHistoryStore, SnapshotCallback,
    SqliteHistoryStore, SyncConfig, SyncController, SyncSnapshot,
};
