//! Integration tests for triplej

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use triplej::sync::SyncConfig;
use triplej::{
    Error, HistoryStore, MemoryHistoryStore, PersistedTrackRecord, SyncController, TripleJClient,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn play_json(title: &str, artist: &str, minutes_ago: i64) -> serde_json::Value {
    json!({
        "recording": {
            "title": title,
            "artists": [
                { "type": "featured", "name": "Someone Else" },
                { "type": "primary", "name": artist }
            ]
        },
        "release": {
            "title": "Test Album",
            "artwork": [
                { "sizes": [
                    { "aspect_ratio": "1x1", "width": 700, "url": "https://example.invalid/art.png" }
                ] }
            ]
        },
        "played_time": (Utc::now() - Duration::minutes(minutes_ago)).to_rfc3339()
    })
}

fn guide_json() -> serde_json::Value {
    json!({
        "items": [
            {
                "title": "Breakfast",
                "hosts": [ { "name": "Concetta" } ],
                "images": [ { "url": "https://example.invalid/breakfast.png" } ],
                "from": (Utc::now() - Duration::hours(5)).to_rfc3339(),
                "to": (Utc::now() - Duration::hours(2)).to_rfc3339(),
                "description": "Mornings"
            },
            {
                "title": "Lunch",
                "hosts": [ { "name": "Lewis" } ],
                "images": [ { "url": "https://example.invalid/lunch.png" } ],
                "from": (Utc::now() - Duration::hours(1)).to_rfc3339(),
                "to": (Utc::now() + Duration::hours(1)).to_rfc3339(),
                "description": "Middays"
            }
        ]
    })
}

async fn mock_client(server: &MockServer) -> TripleJClient {
    TripleJClient::builder()
        .api_base(server.uri())
        .guide_base(server.uri())
        .build()
        .unwrap()
}

async fn mount_search_and_guide(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/plays/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/programitems/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(guide_json()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_now_playing_parses_full_payload() {
    let server = MockServer::start().await;

    let next_updated = (Utc::now() + Duration::seconds(90)).to_rfc3339();
    Mock::given(method("GET"))
        .and(path("/plays/triplej/now.json"))
        .and(query_param("tz", "Australia/Sydney"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "now": play_json("Current Song", "Current Artist", 0),
            "prev": play_json("Previous Song", "Previous Artist", 4),
            "next_updated": next_updated
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let response = client.now_playing().await.unwrap();

    assert!(!response.is_presenter_segment());
    let now = response.now.as_ref().unwrap();
    assert_eq!(
        now.recording.as_ref().unwrap().primary_artist(),
        Some("Current Artist")
    );
    assert_eq!(response.prev_items().len(), 1);
    assert_eq!(response.next_updated.as_deref(), Some(next_updated.as_str()));
}

#[tokio::test]
async fn test_error_taxonomy() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plays/triplej/now.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/plays/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/programitems/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;

    assert!(matches!(
        client.now_playing().await,
        Err(Error::Api(_))
    ));
    assert!(matches!(
        client.recent_plays(5).await,
        Err(Error::EmptyBody)
    ));
    assert!(matches!(
        client.program_guide().await,
        Err(Error::Json(_))
    ));
}

#[tokio::test]
async fn test_controller_publishes_track_program_and_history() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plays/triplej/now.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "now": play_json("Current Song", "Current Artist", 0),
            "prev": play_json("Previous Song", "Previous Artist", 4),
            "next_updated": (Utc::now() + Duration::seconds(90)).to_rfc3339()
        })))
        .mount(&server)
        .await;
    mount_search_and_guide(&server).await;

    let client = mock_client(&server).await;
    let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
    let controller = SyncController::start(client, Arc::clone(&store), &SyncConfig::default());

    // Refresh once the initial polls have settled so the final recent
    // list is merged against the fully populated store.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    controller.refresh_now_playing().await;
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let snapshot = controller.snapshot().await;
    controller.stop().await;

    assert!(!snapshot.is_loading);
    assert!(snapshot.last_error.is_none());
    assert_eq!(snapshot.current_track.title, "Current Song");
    assert_eq!(snapshot.current_track.played_at_display, "Now");
    assert!(!snapshot.current_track.is_presenter_segment);

    // The in-window guide record wins over the earlier one.
    assert_eq!(snapshot.current_program.title, "Lunch");
    assert_eq!(snapshot.current_program.presenter, "Lewis");

    // The prev item was persisted and surfaced in the recent list. Each
    // poll persists it under a fresh id, so the store may hold content
    // duplicates; the published list is deduplicated.
    assert_eq!(snapshot.recent_tracks.len(), 1);
    assert_eq!(snapshot.recent_tracks[0].title, "Previous Song");
    assert_eq!(snapshot.recent_tracks[0].played_at_display, "4m ago");

    let persisted = store.fetch_recent(10).await.unwrap();
    assert!(!persisted.is_empty());
    assert!(persisted.iter().all(|record| record.title == "Previous Song"));
}

#[tokio::test]
async fn test_controller_presenter_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plays/triplej/now.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "now": {},
            "next_updated": (Utc::now() + Duration::seconds(30)).to_rfc3339()
        })))
        .mount(&server)
        .await;
    mount_search_and_guide(&server).await;

    let client = mock_client(&server).await;
    let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
    let controller = SyncController::start(client, Arc::clone(&store), &SyncConfig::default());

    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    let snapshot = controller.snapshot().await;
    controller.stop().await;

    assert!(snapshot.current_track.is_presenter_segment);
    assert_eq!(snapshot.current_track.title, "On Air");
    assert!(snapshot.last_error.is_none());

    // Presenter segments never reach the store.
    assert!(store.fetch_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_controller_surfaces_and_clears_errors() {
    let server = MockServer::start().await;

    // First now-playing fetch fails, subsequent ones succeed.
    Mock::given(method("GET"))
        .and(path("/plays/triplej/now.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plays/triplej/now.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "now": play_json("Recovered Song", "Artist", 0),
            "next_updated": (Utc::now() + Duration::seconds(90)).to_rfc3339()
        })))
        .mount(&server)
        .await;
    mount_search_and_guide(&server).await;

    let client = mock_client(&server).await;
    let store = Arc::new(MemoryHistoryStore::new());
    let controller = SyncController::start(client, store, &SyncConfig::default());

    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    let snapshot = controller.snapshot().await;
    assert_eq!(
        snapshot.last_error.as_deref(),
        Some("Server error: 500 Internal Server Error")
    );

    controller.refresh_now_playing().await;
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    let snapshot = controller.snapshot().await;
    controller.stop().await;

    assert!(snapshot.last_error.is_none());
    assert_eq!(snapshot.current_track.title, "Recovered Song");
}

// Store double whose reads always fail.
struct FailingStore;

#[async_trait::async_trait]
impl HistoryStore for FailingStore {
    async fn save(&self, _record: PersistedTrackRecord) -> triplej::Result<()> {
        Ok(())
    }

    async fn fetch_recent(&self, _limit: usize) -> triplej::Result<Vec<PersistedTrackRecord>> {
        Err(Error::store_error("disk unavailable"))
    }

    async fn prune_older_than(&self, _cutoff: DateTime<Utc>) -> triplej::Result<usize> {
        Ok(0)
    }
}

// Store double whose reads never complete within the test.
struct HangingStore;

#[async_trait::async_trait]
impl HistoryStore for HangingStore {
    async fn save(&self, _record: PersistedTrackRecord) -> triplej::Result<()> {
        Ok(())
    }

    async fn fetch_recent(&self, _limit: usize) -> triplej::Result<Vec<PersistedTrackRecord>> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Ok(Vec::new())
    }

    async fn prune_older_than(&self, _cutoff: DateTime<Utc>) -> triplej::Result<usize> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_store_read_failure_does_not_become_sync_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plays/triplej/now.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "now": play_json("Song A", "Artist", 0),
            "prev": play_json("Previous Song", "Previous Artist", 4),
            "next_updated": (Utc::now() + Duration::seconds(90)).to_rfc3339()
        })))
        .mount(&server)
        .await;
    mount_search_and_guide(&server).await;

    let client = mock_client(&server).await;
    let controller = SyncController::start(client, Arc::new(FailingStore), &SyncConfig::default());

    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    let snapshot = controller.snapshot().await;
    controller.stop().await;

    // The fetched track is published; the store failure stays local and
    // never reaches last_error.
    assert!(!snapshot.is_loading);
    assert!(snapshot.last_error.is_none());
    assert_eq!(snapshot.current_track.title, "Song A");
    assert!(snapshot.recent_tracks.is_empty());
}

#[tokio::test]
async fn test_slow_store_does_not_hold_back_current_track() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plays/triplej/now.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "now": play_json("Song B", "Artist", 0),
            "next_updated": (Utc::now() + Duration::seconds(90)).to_rfc3339()
        })))
        .mount(&server)
        .await;

    // Fail the search feed fast so only the now-playing path touches the
    // hanging store.
    Mock::given(method("GET"))
        .and(path("/plays/search.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/programitems/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(guide_json()))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let controller = SyncController::start(client, Arc::new(HangingStore), &SyncConfig::default());

    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    let snapshot = controller.snapshot().await;
    controller.stop().await;

    // The current track is published long before the store read resolves.
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.current_track.title, "Song B");
}

#[tokio::test]
async fn test_search_feed_merges_with_live_dedup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/plays/triplej/now.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "now": play_json("Current Song", "Current Artist", 0),
            "prev": play_json("Shared Song", "Shared Artist", 2),
            "next_updated": (Utc::now() + Duration::seconds(90)).to_rfc3339()
        })))
        .mount(&server)
        .await;

    // The search feed repeats the prev item and adds older plays.
    Mock::given(method("GET"))
        .and(path("/plays/search.json"))
        .and(query_param("station", "triplej"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                play_json("Shared Song", "Shared Artist", 2),
                play_json("Older Song", "Old Artist", 20),
                play_json("Oldest Song", "Old Artist", 50)
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/programitems/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(guide_json()))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let store = Arc::new(MemoryHistoryStore::new());
    let controller = SyncController::start(client, store, &SyncConfig::default());

    // Let the initial polls persist everything, then refresh so the merge
    // sees the full history regardless of initial feed ordering.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    controller.refresh_all().await;
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let snapshot = controller.snapshot().await;
    controller.stop().await;

    let titles: Vec<&str> = snapshot
        .recent_tracks
        .iter()
        .map(|track| track.title.as_str())
        .collect();

    // Deduplicated by content, newest first.
    assert_eq!(titles, vec!["Shared Song", "Older Song", "Oldest Song"]);
    assert_eq!(snapshot.recent_tracks[0].played_at_display, "2m ago");
}
