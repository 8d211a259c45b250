//! Sync controller facade.
//!
//! Owns the HTTP client, the history store and the three polling feeds
//! (now-playing, recent search, program guide), and publishes a single
//! consistent snapshot of the station state. Consumers read the snapshot
//! on demand or subscribe for change notifications.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::TripleJClient;
use crate::error::Result;
use crate::models::{Program, Track};
use crate::normalize;
use crate::timefmt;

use super::config::SyncConfig;
use super::history::HistoryStore;
use super::reconcile;
use super::scheduler::{FeedHandler, PollScheduler, RearmPolicy};

/// Callback invoked with every published snapshot.
pub type SnapshotCallback = Arc<dyn Fn(&SyncSnapshot) + Send + Sync>;

/// Published station state.
///
/// Always well-formed: before the first successful poll the track and
/// program fields hold loading placeholders, never absent values.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    /// Currently airing item (song, presenter sentinel, or placeholder)
    pub current_track: Track,
    /// Currently scheduled program
    pub current_program: Program,
    /// Recently played tracks, newest first, bounded
    pub recent_tracks: Vec<Track>,
    /// True until the first now-playing poll completes
    pub is_loading: bool,
    /// User-facing message from the most recent failed poll, cleared on
    /// the next success
    pub last_error: Option<String>,
}

impl Default for SyncSnapshot {
    fn default() -> Self {
        Self {
            current_track: Track::placeholder(),
            current_program: Program::placeholder(),
            recent_tracks: Vec::new(),
            is_loading: true,
            last_error: None,
        }
    }
}

struct ControllerInner {
    client: TripleJClient,
    store: Arc<dyn HistoryStore>,
    recent_limit: usize,
    state: RwLock<SyncSnapshot>,
    subscribers: RwLock<Vec<SnapshotCallback>>,
    stopped: AtomicBool,
}

impl ControllerInner {
    /// Mutate the shared state and notify subscribers with the result.
    /// Publishes nothing once the controller has been stopped, so late
    /// fetch results from a dying feed task cannot resurrect state.
    async fn publish<F: FnOnce(&mut SyncSnapshot)>(&self, mutate: F) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        let snapshot = {
            let mut state = self.state.write().await;
            mutate(&mut state);
            state.clone()
        };

        let callbacks: Vec<SnapshotCallback> = self.subscribers.read().await.clone();
        for callback in &callbacks {
            callback(&snapshot);
        }
    }

    async fn publish_error(&self, err: &crate::error::Error) {
        let message = err.status_message();
        self.publish(|state| {
            state.is_loading = false;
            state.last_error = Some(message.clone());
        })
        .await;
    }

    /// Normalize and persist one raw play, preferring the record's own
    /// played time over the save instant.
    async fn persist_play(&self, raw: &crate::models::RawPlay, now: DateTime<Utc>) -> Option<Track> {
        let track = normalize::normalize_track(raw, false, now).ok()?;
        let played_at = raw
            .played_time
            .as_deref()
            .and_then(timefmt::parse_timestamp)
            .unwrap_or(now);
        if let Err(err) = super::history::save_track(self.store.as_ref(), &track, played_at).await {
            debug!("History save failed: {err}");
        }
        Some(track)
    }
}

// ============================================================================
// Feed handlers
// ============================================================================

struct NowPlayingFeed {
    inner: Arc<ControllerInner>,
}

impl NowPlayingFeed {
    async fn try_poll(&self) -> Result<Option<DateTime<Utc>>> {
        let inner = &self.inner;
        let response = inner.client.now_playing().await?;
        let now = Utc::now();

        let hint = response
            .next_updated
            .as_deref()
            .and_then(timefmt::parse_timestamp);

        let current = match &response.now {
            Some(raw) if !raw.is_empty() => normalize::normalize_track(raw, true, now)?,
            _ => Track::presenter_segment(),
        };

        inner
            .publish(|state| {
                state.current_track = current;
                state.is_loading = false;
                state.last_error = None;
            })
            .await;

        // History work runs off the poll path: a slow or failing store
        // must not hold back the current track or the timer re-arm.
        // Persist everything the prev slot carries; the first (most
        // recent) item seeds the merge.
        let task_inner = Arc::clone(inner);
        tokio::spawn(async move {
            let mut live = None;
            for raw in response.prev_items() {
                let track = task_inner.persist_play(raw, now).await;
                if live.is_none() {
                    live = track;
                }
            }

            match reconcile::merged_recent(live, task_inner.store.as_ref(), task_inner.recent_limit)
                .await
            {
                Ok(recent) => {
                    task_inner
                        .publish(|state| {
                            state.recent_tracks = recent;
                        })
                        .await;
                }
                Err(err) => warn!("History read failed, keeping previous recent list: {err}"),
            }
        });

        Ok(hint)
    }
}

#[async_trait]
impl FeedHandler for NowPlayingFeed {
    fn name(&self) -> &'static str {
        "now_playing"
    }

    async fn poll(&mut self) -> Result<Option<DateTime<Utc>>> {
        match self.try_poll().await {
            Ok(hint) => Ok(hint),
            Err(err) => {
                self.inner.publish_error(&err).await;
                Err(err)
            }
        }
    }
}

struct RecentSearchFeed {
    inner: Arc<ControllerInner>,
}

impl RecentSearchFeed {
    async fn try_poll(&self) -> Result<()> {
        let inner = &self.inner;
        let response = inner.client.recent_plays(inner.recent_limit).await?;
        let now = Utc::now();

        let mut live = None;
        for raw in &response.items {
            let track = inner.persist_play(raw, now).await;
            if live.is_none() {
                live = track;
            }
        }

        // Store failures stay local; the previous list remains published.
        let recent = match reconcile::merged_recent(live, inner.store.as_ref(), inner.recent_limit)
            .await
        {
            Ok(recent) => recent,
            Err(err) => {
                warn!("History read failed, keeping previous recent list: {err}");
                return Ok(());
            }
        };

        inner
            .publish(|state| {
                state.recent_tracks = recent;
            })
            .await;

        Ok(())
    }
}

#[async_trait]
impl FeedHandler for RecentSearchFeed {
    fn name(&self) -> &'static str {
        "recent_search"
    }

    async fn poll(&mut self) -> Result<Option<DateTime<Utc>>> {
        match self.try_poll().await {
            Ok(()) => Ok(None),
            Err(err) => {
                self.inner.publish_error(&err).await;
                Err(err)
            }
        }
    }
}

struct ProgramGuideFeed {
    inner: Arc<ControllerInner>,
}

impl ProgramGuideFeed {
    async fn try_poll(&self) -> Result<()> {
        let inner = &self.inner;
        let response = inner.client.program_guide().await?;
        let now = Utc::now();

        // Prefer the record whose window contains now; otherwise the
        // first usable record.
        let program = response
            .items
            .iter()
            .filter(|raw| {
                normalize::program_window(raw)
                    .map(|(from, to)| from <= now && now < to)
                    .unwrap_or(false)
            })
            .chain(response.items.iter())
            .find_map(normalize::normalize_program);

        if let Some(program) = program {
            inner
                .publish(|state| {
                    state.current_program = program;
                })
                .await;
        }

        Ok(())
    }
}

#[async_trait]
impl FeedHandler for ProgramGuideFeed {
    fn name(&self) -> &'static str {
        "program_guide"
    }

    async fn poll(&mut self) -> Result<Option<DateTime<Utc>>> {
        match self.try_poll().await {
            Ok(()) => Ok(None),
            Err(err) => {
                self.inner.publish_error(&err).await;
                Err(err)
            }
        }
    }
}

// ============================================================================
// SyncController
// ============================================================================

/// Facade over the polling feeds and shared state.
pub struct SyncController {
    inner: Arc<ControllerInner>,
    history_max_age_days: i64,
    now_playing: PollScheduler,
    search: PollScheduler,
    guide: PollScheduler,
}

impl SyncController {
    /// Start the three feed schedulers. Each polls once immediately.
    pub fn start(
        client: TripleJClient,
        store: Arc<dyn HistoryStore>,
        config: &SyncConfig,
    ) -> Self {
        info!(station = client.station(), "Starting sync controller");

        let inner = Arc::new(ControllerInner {
            client,
            store,
            recent_limit: config.history.recent_limit.max(1),
            state: RwLock::new(SyncSnapshot::default()),
            subscribers: RwLock::new(Vec::new()),
            stopped: AtomicBool::new(false),
        });

        let now_playing = PollScheduler::spawn(
            NowPlayingFeed {
                inner: Arc::clone(&inner),
            },
            RearmPolicy::Adaptive {
                fallback: config.polling.fallback_interval(),
            },
        );
        let search = PollScheduler::spawn(
            RecentSearchFeed {
                inner: Arc::clone(&inner),
            },
            RearmPolicy::Fixed(config.polling.search_interval()),
        );
        let guide = PollScheduler::spawn(
            ProgramGuideFeed {
                inner: Arc::clone(&inner),
            },
            RearmPolicy::Fixed(config.polling.guide_interval()),
        );

        Self {
            inner,
            history_max_age_days: config.history.max_age_days,
            now_playing,
            search,
            guide,
        }
    }

    /// Current published state.
    pub async fn snapshot(&self) -> SyncSnapshot {
        self.inner.state.read().await.clone()
    }

    /// Register a callback invoked with every published snapshot.
    pub async fn subscribe(&self, callback: SnapshotCallback) {
        self.inner.subscribers.write().await.push(callback);
    }

    /// Poll the now-playing feed immediately, discarding its pending
    /// timer.
    pub async fn refresh_now_playing(&self) {
        self.now_playing.refresh_now().await;
    }

    /// Poll the recent-plays search feed immediately.
    pub async fn refresh_recent(&self) {
        self.search.refresh_now().await;
    }

    /// Poll the program guide feed immediately.
    pub async fn refresh_programs(&self) {
        self.guide.refresh_now().await;
    }

    /// Poll every feed immediately.
    pub async fn refresh_all(&self) {
        self.now_playing.refresh_now().await;
        self.search.refresh_now().await;
        self.guide.refresh_now().await;
    }

    /// Remove persisted tracks older than the configured maximum age.
    /// Returns the number removed.
    pub async fn prune_history(&self) -> Result<usize> {
        let cutoff = Utc::now() - ChronoDuration::days(self.history_max_age_days);
        self.inner.store.prune_older_than(cutoff).await
    }

    /// Stop all feeds. Fetches already in flight complete but publish
    /// nothing.
    pub async fn stop(self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.now_playing.stop().await;
        self.search.stop().await;
        self.guide.stop().await;
        info!("Sync controller stopped");
    }
}
