//! Example: Follow the triple j now-playing feed for two minutes
//!
//! This example demonstrates:
//! - Creating a client and an in-memory history store
//! - Starting the sync controller
//! - Subscribing to snapshot updates
//!
//! Run with: cargo run --example now_playing

use std::sync::Arc;
use triplej::{MemoryHistoryStore, Result, SyncConfig, SyncController, TripleJClient};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("triple j - Now Playing");
    println!("======================\n");

    let client = TripleJClient::new()?;
    let store = Arc::new(MemoryHistoryStore::new());
    let controller = SyncController::start(client, store, &SyncConfig::default());

    controller
        .subscribe(Arc::new(|snapshot| {
            if snapshot.is_loading {
                return;
            }
            if let Some(error) = &snapshot.last_error {
                println!("[{}]", error);
                return;
            }

            let track = &snapshot.current_track;
            if track.is_presenter_segment {
                println!("On air: presenter segment");
            } else {
                println!("Now playing: {} - {}", track.artist, track.title);
                if !track.album.is_empty() {
                    println!("  Album: {}", track.album);
                }
            }

            println!("  Program: {}", snapshot.current_program.title);
            for recent in &snapshot.recent_tracks {
                println!(
                    "  {:>10}  {} - {}",
                    recent.played_at_display, recent.artist, recent.title
                );
            }
            println!();
        }))
        .await;

    tokio::time::sleep(std::time::Duration::from_secs(120)).await;
    controller.stop().await;

    Ok(())
}
