//! Adaptive polling scheduler.
//!
//! Each feed runs on its own background task holding a single armed timer.
//! After every poll the timer is re-armed from the feed's re-arm policy:
//! either a fixed interval, or an adaptive delay derived from the server's
//! next-update hint. Failed polls re-arm on the fallback interval, so a
//! feed never stops polling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::constants;
use crate::error::Result;

/// One polled feed.
#[async_trait]
pub trait FeedHandler: Send + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch and publish once. Returns the server's next-update hint when
    /// the feed carries one.
    async fn poll(&mut self) -> Result<Option<DateTime<Utc>>>;
}

/// How a feed's timer is re-armed after each poll.
#[derive(Debug, Clone, Copy)]
pub enum RearmPolicy {
    /// Delay until just past the server's next-update hint; `fallback`
    /// when the hint is missing, unparsable or already stale.
    Adaptive { fallback: Duration },
    /// Fixed interval regardless of the payload.
    Fixed(Duration),
}

impl RearmPolicy {
    /// Delay applied after a failed poll.
    fn error_delay(&self) -> Duration {
        match self {
            Self::Adaptive { fallback } => *fallback,
            Self::Fixed(interval) => *interval,
        }
    }
}

/// Delay before the next poll, given the hint returned by the last one.
///
/// Adaptive delays target one buffer second past the hint so the server
/// has actually refreshed by the time we fetch, and are floored so a hint
/// in the past cannot produce a tight loop.
pub(crate) fn compute_rearm_delay(
    policy: RearmPolicy,
    hint: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Duration {
    match policy {
        RearmPolicy::Fixed(interval) => interval,
        RearmPolicy::Adaptive { fallback } => match hint {
            Some(hint) => {
                let until_hint = (hint - now).num_seconds().max(0) as u64;
                Duration::from_secs(
                    (until_hint + constants::REARM_BUFFER_SECONDS)
                        .max(constants::MIN_POLL_DELAY_SECONDS),
                )
            }
            None => fallback,
        },
    }
}

/// Commands accepted by a running scheduler task.
#[derive(Debug)]
enum SchedulerCommand {
    RefreshNow,
    Stop,
}

/// Handle to a spawned polling task.
pub struct PollScheduler {
    name: &'static str,
    join_handle: JoinHandle<()>,
    tx: mpsc::Sender<SchedulerCommand>,
}

impl PollScheduler {
    /// Spawn the polling task. The feed is polled once immediately, then
    /// on every timer expiry or manual refresh.
    pub fn spawn<H: FeedHandler>(mut handler: H, policy: RearmPolicy) -> Self {
        let (tx, mut rx) = mpsc::channel(16);
        let name = handler.name();

        let join_handle = tokio::spawn(async move {
            info!(feed = name, "Starting poll scheduler");

            // Armed immediately so the first poll happens on spawn.
            let mut timer: Pin<Box<tokio::time::Sleep>> = Box::pin(sleep(Duration::ZERO));

            loop {
                tokio::select! {
                    cmd = rx.recv() => {
                        match cmd {
                            Some(SchedulerCommand::RefreshNow) => {
                                debug!(feed = name, "Manual refresh");
                                let delay = run_poll(&mut handler, policy).await;
                                timer = Box::pin(sleep(delay));
                            }
                            Some(SchedulerCommand::Stop) | None => break,
                        }
                    }
                    _ = &mut timer => {
                        let delay = run_poll(&mut handler, policy).await;
                        timer = Box::pin(sleep(delay));
                    }
                }
            }

            info!(feed = name, "Poll scheduler stopped");
        });

        Self {
            name,
            join_handle,
            tx,
        }
    }

    /// Poll immediately, discarding the pending timer. The timer is
    /// re-armed from the fresh response, so at most one poll is ever
    /// outstanding.
    pub async fn refresh_now(&self) {
        let _ = self.tx.send(SchedulerCommand::RefreshNow).await;
    }

    /// Stop the task and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.tx.send(SchedulerCommand::Stop).await;
        if let Err(err) = self.join_handle.await {
            warn!(feed = self.name, "Scheduler join error: {err}");
        }
    }
}

async fn run_poll<H: FeedHandler>(handler: &mut H, policy: RearmPolicy) -> Duration {
    match handler.poll().await {
        Ok(hint) => {
            let delay = compute_rearm_delay(policy, hint, Utc::now());
            debug!(feed = handler.name(), ?delay, "Re-arming after poll");
            delay
        }
        Err(err) => {
            warn!(feed = handler.name(), "Poll failed: {err}");
            policy.error_delay()
        }
    }
}
