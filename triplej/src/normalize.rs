//! Normalization of raw API records into canonical values
//!
//! The upstream payloads are optional-heavy: almost every field may be
//! missing and degrades to a documented default. The single hard failure
//! is a track record without its nested recording object - such an item is
//! skipped, never fabricated.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::{Program, RawPlay, RawProgram, Track};
use crate::sync::constants::{MIN_ARTWORK_WIDTH, PLACEHOLDER_ARTWORK_URL};
use crate::timefmt;

/// Title used when the recording carries none
pub const UNKNOWN_TRACK: &str = "Unknown Track";

/// Artist used when no entry has the `primary` role
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Normalize one raw track record.
///
/// `is_now_playing` fixes the display string to `"Now"`; otherwise it is
/// derived from the record's `played_time` relative to `now`, defaulting
/// to `"Just now"` when the field is missing or unparsable.
///
/// Callers are expected to have handled the presenter-segment case (an
/// absent or empty `now` slot) before calling; an empty record here is a
/// parse failure, not a presenter segment.
pub fn normalize_track(raw: &RawPlay, is_now_playing: bool, now: DateTime<Utc>) -> Result<Track> {
    let recording = raw.recording.as_ref().ok_or(Error::MissingRecording)?;

    let title = recording
        .title
        .as_deref()
        .unwrap_or(UNKNOWN_TRACK)
        .to_string();

    let artist = recording
        .primary_artist()
        .unwrap_or(UNKNOWN_ARTIST)
        .to_string();

    let album = raw
        .release
        .as_ref()
        .and_then(|release| release.title.as_deref())
        .unwrap_or("")
        .to_string();

    let artwork = raw
        .release
        .as_ref()
        .and_then(|release| release.square_artwork_url(MIN_ARTWORK_WIDTH))
        .unwrap_or(PLACEHOLDER_ARTWORK_URL)
        .to_string();

    let played_at_display = if is_now_playing {
        "Now".to_string()
    } else {
        raw.played_time
            .as_deref()
            .and_then(timefmt::parse_timestamp)
            .map(|at| timefmt::relative_display(at, now))
            .unwrap_or_else(|| "Just now".to_string())
    };

    Ok(Track {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        artist,
        album,
        artwork,
        played_at_display,
        is_presenter_segment: false,
    })
}

/// Normalize one raw program guide record.
///
/// Records without a title are dropped (`None`); every other missing field
/// degrades to an empty string or the placeholder image.
pub fn normalize_program(raw: &RawProgram) -> Option<Program> {
    let title = raw.title.as_deref()?.to_string();

    let presenter = raw
        .hosts
        .first()
        .and_then(|host| host.name.as_deref())
        .unwrap_or("")
        .to_string();

    let image = raw
        .images
        .first()
        .and_then(|image| image.url.as_deref())
        .unwrap_or(PLACEHOLDER_ARTWORK_URL)
        .to_string();

    let start_time_display = display_time(raw.from.as_deref());
    let end_time_display = display_time(raw.to.as_deref());

    let description = raw.description.as_deref().unwrap_or("").to_string();

    Some(Program {
        title,
        presenter,
        image,
        start_time_display,
        end_time_display,
        description,
    })
}

fn display_time(raw: Option<&str>) -> String {
    raw.and_then(timefmt::parse_timestamp)
        .map(timefmt::twelve_hour_display)
        .unwrap_or_default()
}

/// Parsed `from`/`to` window of a guide record, when both are present.
pub fn program_window(raw: &RawProgram) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let from = raw.from.as_deref().and_then(timefmt::parse_timestamp)?;
    let to = raw.to.as_deref().and_then(timefmt::parse_timestamp)?;
    Some((from, to))
}
