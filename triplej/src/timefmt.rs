//! Relative-time display strings and their inverse ordering keys
//!
//! The plays API reports absolute timestamps; the UI shows short relative
//! strings ("Just now", "12m ago", "14:05"). Encoding is exact, but once
//! only the string form survives, the best we can recover is an integer
//! minutes-ago ordering key. The `HH:MM` form is ambiguous (the day is
//! unknown) and maps to a sentinel that sorts after every known key.

use chrono::{DateTime, Local, Utc};

/// Ordering key for display strings whose age cannot be recovered
/// (`HH:MM` and anything unrecognized). Sorts last.
pub const ORDER_KEY_UNKNOWN: u32 = u32::MAX;

/// Render an absolute timestamp as a short relative display string.
///
/// Thresholds are half-open and evaluated on integer elapsed seconds:
/// under a minute "Just now", under an hour "{m}m ago", under a day
/// "{h}h ago", otherwise the local wall-clock time of `at` as `HH:MM`.
pub fn relative_display(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - at).num_seconds();

    if elapsed < 60 {
        "Just now".to_string()
    } else if elapsed < 3600 {
        format!("{}m ago", elapsed / 60)
    } else if elapsed < 86400 {
        format!("{}h ago", elapsed / 3600)
    } else {
        at.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// Recover an approximate minutes-ago ordering key from a display string.
///
/// "Just now" and "Now" map to 0, "{n}m ago" to n, "{n}h ago" to n*60.
/// Everything else maps to [`ORDER_KEY_UNKNOWN`]; in particular the
/// `HH:MM` form is lossy by design and cannot be ordered.
pub fn ordering_key(display: &str) -> u32 {
    match display {
        "Just now" | "Now" => return 0,
        _ => {}
    }
    if let Some(minutes) = display.strip_suffix("m ago") {
        if let Ok(minutes) = minutes.parse::<u32>() {
            return minutes;
        }
    }
    if let Some(hours) = display.strip_suffix("h ago") {
        if let Ok(hours) = hours.parse::<u32>() {
            return hours.saturating_mul(60);
        }
    }
    ORDER_KEY_UNKNOWN
}

/// Parse an upstream played/next-updated timestamp.
///
/// The feeds have shipped at least three shapes over time: RFC 3339 with
/// fractional seconds, RFC 3339 without, and a legacy form with a
/// colon-less numeric offset (`2030-01-01T10:00:00+1000`). All three are
/// accepted; anything else is `None` and degrades to a default upstream.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.with_timezone(&Utc));
    }
    None
}

/// Format a timestamp as a 12-hour wall-clock display ("6:00 PM") for the
/// program guide.
pub fn twelve_hour_display(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_display_thresholds() {
        let now = base();
        assert_eq!(relative_display(now, now), "Just now");
        assert_eq!(relative_display(now - Duration::seconds(59), now), "Just now");
        assert_eq!(relative_display(now - Duration::seconds(60), now), "1m ago");
        assert_eq!(relative_display(now - Duration::seconds(3599), now), "59m ago");
        assert_eq!(relative_display(now - Duration::seconds(3600), now), "1h ago");
        assert_eq!(relative_display(now - Duration::hours(23), now), "23h ago");

        // Over a day: wall-clock rendering, shape only (local tz dependent)
        let display = relative_display(now - Duration::hours(30), now);
        assert_eq!(display.len(), 5);
        assert_eq!(display.as_bytes()[2], b':');
    }

    #[test]
    fn test_ordering_key_known_forms() {
        assert_eq!(ordering_key("Just now"), 0);
        assert_eq!(ordering_key("Now"), 0);
        assert_eq!(ordering_key("7m ago"), 7);
        assert_eq!(ordering_key("2h ago"), 120);
    }

    #[test]
    fn test_ordering_key_unknown_forms() {
        assert_eq!(ordering_key("14:05"), ORDER_KEY_UNKNOWN);
        assert_eq!(ordering_key(""), ORDER_KEY_UNKNOWN);
        assert_eq!(ordering_key("xm ago"), ORDER_KEY_UNKNOWN);
    }

    #[test]
    fn test_encode_decode_monotonic() {
        // Older timestamps never produce a smaller ordering key.
        let now = base();
        let offsets = [5i64, 70, 600, 3700, 7300, 86000];
        let keys: Vec<u32> = offsets
            .iter()
            .map(|secs| ordering_key(&relative_display(now - Duration::seconds(*secs), now)))
            .collect();
        for pair in keys.windows(2) {
            assert!(pair[0] <= pair[1], "keys not monotonic: {:?}", keys);
        }
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 10).unwrap();
        assert_eq!(parse_timestamp("2030-01-01T00:00:10Z"), Some(expected));
        assert_eq!(parse_timestamp("2030-01-01T00:00:10.500Z").map(|t| t.timestamp()),
                   Some(expected.timestamp()));
        assert_eq!(parse_timestamp("2030-01-01T10:00:10+1000"), Some(expected));
        assert_eq!(parse_timestamp("2030-01-01T10:00:10+10:00"), Some(expected));
        assert_eq!(parse_timestamp("not a timestamp"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
