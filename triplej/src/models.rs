//! Data models for the ABC plays/program APIs
//!
//! This module contains the canonical values published by the sync engine
//! (`Track`, `Program`, `PersistedTrackRecord`) and the serde structures
//! needed to deserialize the upstream JSON payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sync::constants::PLACEHOLDER_ARTWORK_URL;
use crate::timefmt;

// ============================================================================
// Canonical Values
// ============================================================================

/// A single played (or playing) item, as published to the UI layer.
///
/// Immutable value, recreated on every poll cycle. `id` is a client-side
/// identity (UUID), independent of any display string; the upstream feed
/// exposes no usable primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Stable client-side identity
    pub id: String,
    /// Recording title
    pub title: String,
    /// Primary artist name
    pub artist: String,
    /// Release title (may be empty)
    pub album: String,
    /// Artwork URI (placeholder when the release carries none)
    pub artwork: String,
    /// Precomputed relative-time display string ("Now", "12m ago", ...)
    pub played_at_display: String,
    /// True when the slot is a live presenter break, not a song
    pub is_presenter_segment: bool,
}

impl Track {
    /// Loading sentinel shown before the first successful poll
    pub fn placeholder() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: "Loading...".to_string(),
            artist: "triple j".to_string(),
            album: String::new(),
            artwork: PLACEHOLDER_ARTWORK_URL.to_string(),
            played_at_display: "Now".to_string(),
            is_presenter_segment: false,
        }
    }

    /// Sentinel for a live presenter break (empty/absent `now` payload)
    pub fn presenter_segment() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: "On Air".to_string(),
            artist: "triple j".to_string(),
            album: String::new(),
            artwork: PLACEHOLDER_ARTWORK_URL.to_string(),
            played_at_display: "Now".to_string(),
            is_presenter_segment: true,
        }
    }

    /// Content identity used for reconciliation dedup.
    ///
    /// The live feed and the persisted history have no shared primary key,
    /// so two items are considered the same song when title and artist
    /// match. Two distinct songs with identical title and artist collide
    /// by design.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.title, &self.artist)
    }
}

/// A scheduled program from the guide endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Program title
    pub title: String,
    /// Presenter name (may be empty)
    pub presenter: String,
    /// Program image URI
    pub image: String,
    /// 12-hour wall-clock display of the start time (may be empty)
    pub start_time_display: String,
    /// 12-hour wall-clock display of the end time (may be empty)
    pub end_time_display: String,
    /// Program description (may be empty)
    pub description: String,
}

impl Program {
    /// Sentinel for the unloaded state
    pub fn placeholder() -> Self {
        Self {
            title: "Loading...".to_string(),
            presenter: "triple j".to_string(),
            image: PLACEHOLDER_ARTWORK_URL.to_string(),
            start_time_display: String::new(),
            end_time_display: String::new(),
            description: "Loading program information...".to_string(),
        }
    }
}

/// Durable counterpart of [`Track`] kept by the history store.
///
/// `played_at` is the one piece of ground truth the store keeps; the
/// relative display string is recomputed at every read. At most one record
/// exists per `id`, and presenter segments are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTrackRecord {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork: String,
    /// Absolute time the track was saved
    pub played_at: DateTime<Utc>,
}

impl PersistedTrackRecord {
    /// Snapshot a track at save time
    pub fn from_track(track: &Track, played_at: DateTime<Utc>) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            artwork: track.artwork.clone(),
            played_at,
        }
    }

    /// Convert back to a track with the display string recomputed against
    /// `now`. Records are only ever music tracks.
    pub fn to_track(&self, now: DateTime<Utc>) -> Track {
        Track {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            artwork: self.artwork.clone(),
            played_at_display: timefmt::relative_display(self.played_at, now),
            is_presenter_segment: false,
        }
    }
}

// ============================================================================
// Now-Playing Endpoint
// ============================================================================

/// Response from the `/plays/{station}/now.json` endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NowPlayingResponse {
    /// Currently airing item; absent or semantically empty means the
    /// station is in a live presenter segment
    pub now: Option<RawPlay>,
    /// Just-played item(s); single object or array depending on the feed
    /// variant
    pub prev: Option<PrevSlot>,
    /// Server hint for when fresh data will be available (ISO-8601-ish)
    pub next_updated: Option<String>,
}

impl NowPlayingResponse {
    /// True when the `now` slot signals a presenter break rather than a
    /// song: the field is absent, or present without recording data.
    pub fn is_presenter_segment(&self) -> bool {
        match &self.now {
            None => true,
            Some(play) => play.is_empty(),
        }
    }

    /// Items in the `prev` slot, newest first, regardless of variant.
    pub fn prev_items(&self) -> &[RawPlay] {
        self.prev.as_ref().map(PrevSlot::items).unwrap_or(&[])
    }
}

/// The `prev` slot is a single object on the now-playing feed and an array
/// on the search-style variant; both forms must be accepted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PrevSlot {
    /// Array variant
    Many(Vec<RawPlay>),
    /// Single-object variant
    One(Box<RawPlay>),
}

impl PrevSlot {
    /// View the slot as a slice, whichever variant it is.
    pub fn items(&self) -> &[RawPlay] {
        match self {
            Self::Many(items) => items,
            Self::One(item) => std::slice::from_ref(item),
        }
    }
}

/// One raw track record, shared by the `now`/`prev` slots and the search
/// endpoint's `items`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPlay {
    /// Recording data; its absence makes the record unusable
    pub recording: Option<RawRecording>,
    /// Release (album) data
    pub release: Option<RawRelease>,
    /// When the item was played (ISO-8601-ish string)
    pub played_time: Option<String>,
}

impl RawPlay {
    /// A record without recording data is semantically empty.
    pub fn is_empty(&self) -> bool {
        self.recording.is_none()
    }
}

/// Nested recording object of a track record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRecording {
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
}

impl RawRecording {
    /// First artist entry declared with the `primary` role.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists
            .iter()
            .find(|artist| artist.role.as_deref() == Some("primary"))
            .and_then(|artist| artist.name.as_deref())
    }
}

/// Artist entry with its declared role.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawArtist {
    /// Role of the entry ("primary", "featured", ...)
    #[serde(rename = "type")]
    pub role: Option<String>,
    pub name: Option<String>,
}

/// Release (album) information.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRelease {
    pub title: Option<String>,
    #[serde(default)]
    pub artwork: Vec<RawArtwork>,
}

impl RawRelease {
    /// First 1x1 artwork variant at least `min_width` pixels wide,
    /// scanning artwork entries in order.
    pub fn square_artwork_url(&self, min_width: u32) -> Option<&str> {
        self.artwork
            .iter()
            .flat_map(|artwork| artwork.sizes.iter())
            .find(|size| {
                size.aspect_ratio.as_deref() == Some("1x1")
                    && size.width.unwrap_or(0) >= min_width
                    && size.url.is_some()
            })
            .and_then(|size| size.url.as_deref())
    }
}

/// Artwork entry holding size variants.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawArtwork {
    #[serde(default)]
    pub sizes: Vec<RawArtworkSize>,
}

/// One artwork size variant.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawArtworkSize {
    pub aspect_ratio: Option<String>,
    pub width: Option<u32>,
    pub url: Option<String>,
}

// ============================================================================
// Search Endpoint
// ============================================================================

/// Response from the `/plays/search.json` endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<RawPlay>,
}

// ============================================================================
// Program Guide Endpoint
// ============================================================================

/// Response from the program guide endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GuideResponse {
    #[serde(default)]
    pub items: Vec<RawProgram>,
}

/// One raw program guide record. Records without a title are dropped
/// during normalization.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawProgram {
    pub title: Option<String>,
    #[serde(default)]
    pub hosts: Vec<RawHost>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    /// Program start (ISO-8601-ish string)
    pub from: Option<String>,
    /// Program end (ISO-8601-ish string)
    pub to: Option<String>,
    pub description: Option<String>,
}

/// Program host entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawHost {
    pub name: Option<String>,
}

/// Program image entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawImage {
    pub url: Option<String>,
}
