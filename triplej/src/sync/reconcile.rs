//! Reconciliation of live feed items with persisted history.
//!
//! Produces the bounded recent-tracks list: the freshest feed item (when
//! one exists) merged with history read back from the store, deduplicated
//! by content and ordered by recency.

use chrono::Utc;

use crate::error::Result;
use crate::models::Track;
use crate::timefmt;

use super::constants::HISTORY_MERGE_FETCH_LIMIT;
use super::history::HistoryStore;

/// Merge a zero-or-one live item with stored tracks into the published
/// recent list.
///
/// The live item always survives dedup; stored items matching its content
/// key are dropped, as are later stored duplicates. The result is stably
/// sorted by minutes-ago ordering key (newest first, unrecoverable `HH:MM`
/// displays last) and truncated to `limit`.
pub fn merge(live: Option<Track>, stored: Vec<Track>, limit: usize) -> Vec<Track> {
    let mut merged: Vec<Track> = Vec::with_capacity(stored.len() + 1);

    if let Some(live) = live {
        merged.push(live);
    }

    for track in stored {
        let duplicate = merged
            .iter()
            .any(|existing| existing.dedup_key() == track.dedup_key());
        if !duplicate {
            merged.push(track);
        }
    }

    merged.sort_by_key(|track| timefmt::ordering_key(&track.played_at_display));
    merged.truncate(limit);
    merged
}

/// Read history back and merge it with the given live item.
///
/// Reads more records than the output bound so dedup losses against the
/// live item cannot starve the list.
pub async fn merged_recent(
    live: Option<Track>,
    store: &dyn HistoryStore,
    limit: usize,
) -> Result<Vec<Track>> {
    let now = Utc::now();
    let fetch_limit = HISTORY_MERGE_FETCH_LIMIT.max(limit * 2);
    let stored = store
        .fetch_recent(fetch_limit)
        .await?
        .iter()
        .map(|record| record.to_track(now))
        .collect();

    Ok(merge(live, stored, limit))
}
