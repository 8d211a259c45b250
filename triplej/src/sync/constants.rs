//! Timing and limit constants for the sync engine

use std::time::Duration;

/// Floor applied to every computed poll delay, in seconds.
///
/// Protects against a `next_updated` in the past or immediately ahead,
/// which would otherwise produce a tight polling loop.
pub const MIN_POLL_DELAY_SECONDS: u64 = 2;

/// Buffer added past `next_updated` before polling again, in seconds.
///
/// The server hint marks when fresh data *becomes* available; polling at
/// the exact instant tends to re-fetch the stale payload.
pub const REARM_BUFFER_SECONDS: u64 = 1;

/// Poll interval when the server provides no usable `next_updated` hint,
/// and after any failed fetch, in seconds.
pub const FALLBACK_POLL_SECONDS: u64 = 30;

/// Fixed interval of the recent-plays search feed, in seconds.
pub const SEARCH_POLL_SECONDS: u64 = 30;

/// Fixed interval of the program guide feed, in seconds.
pub const PROGRAM_GUIDE_POLL_SECONDS: u64 = 3600;

/// How many persisted records to read back when reconciling history.
pub const HISTORY_MERGE_FETCH_LIMIT: usize = 10;

/// Maximum length of the published recent-tracks list.
pub const RECENT_TRACKS_LIMIT: usize = 5;

/// Persisted records older than this many days are pruned.
pub const HISTORY_DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// Station artwork shown while loading or when a release carries none.
pub const PLACEHOLDER_ARTWORK_URL: &str =
    "https://www.abc.net.au/cm/rimage/11948498-1x1-large.png?v=2";

/// Minimum width (pixels) for a usable square artwork variant.
pub const MIN_ARTWORK_WIDTH: u32 = 400;

/// Minimum poll delay as a [`Duration`]
pub fn min_poll_delay() -> Duration {
    Duration::from_secs(MIN_POLL_DELAY_SECONDS)
}

/// Re-arm buffer as a [`Duration`]
pub fn rearm_buffer() -> Duration {
    Duration::from_secs(REARM_BUFFER_SECONDS)
}

/// Fallback poll interval as a [`Duration`]
pub fn fallback_poll_interval() -> Duration {
    Duration::from_secs(FALLBACK_POLL_SECONDS)
}

/// Search feed interval as a [`Duration`]
pub fn search_poll_interval() -> Duration {
    Duration::from_secs(SEARCH_POLL_SECONDS)
}

/// Program guide interval as a [`Duration`]
pub fn program_guide_poll_interval() -> Duration {
    Duration::from_secs(PROGRAM_GUIDE_POLL_SECONDS)
}
