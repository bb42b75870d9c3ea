//! Sync coordinator.
//!
//! Decides whether a sync request may start an ingestion pass and runs
//! approved passes in the background. Two states, `Idle` and `Running`:
//!
//! ```text
//!          request_sync() && stale
//!   Idle ─────────────────────────▶ Running
//!    ▲                                 │
//!    └──── pass finished (ok or err) ──┘
//! ```
//!
//! A request is a no-op unless the coordinator is idle and the last
//! successful pass is older than the staleness window (or there has never
//! been one). Callers are never told which way the decision went.
//!
//! State lives in a [`tokio::sync::watch`] channel. The idle check and the
//! switch to running happen inside one `send_if_modified` call, so two
//! concurrent requests can never both start a pass.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::ingest::IngestionPipeline;

/// Snapshot of the coordinator state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub running: bool,
    /// Set only when a pass reaches the last page.
    pub last_completed_at: Option<DateTime<Utc>>,
    /// Error of the most recent pass, cleared by the next successful one.
    pub last_error: Option<String>,
}

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    pipeline: Arc<IngestionPipeline>,
    clock: Arc<dyn Clock>,
    staleness: Duration,
    state: watch::Sender<SyncStatus>,
}

impl SyncCoordinator {
    pub fn new(
        pipeline: Arc<IngestionPipeline>,
        clock: Arc<dyn Clock>,
        staleness: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SyncStatus::default());
        Self {
            inner: Arc::new(Inner {
                pipeline,
                clock,
                staleness,
                state,
            }),
        }
    }

    /// Starts a background pass if idle and stale; otherwise does nothing.
    ///
    /// Returns immediately either way. Must be called from within a tokio
    /// runtime.
    pub fn request_sync(&self) {
        let now = self.inner.clock.now();
        let staleness = self.inner.staleness;

        let started = self.inner.state.send_if_modified(|status| {
            if status.running || !is_stale(status.last_completed_at, now, staleness) {
                return false;
            }
            status.running = true;
            true
        });

        if !started {
            debug!("Sync request ignored: pass running or index fresh");
            return;
        }

        info!("Starting sync pass");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_pass().await });
    }

    pub fn status(&self) -> SyncStatus {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.state.subscribe()
    }
}

impl Inner {
    async fn run_pass(&self) {
        let mut guard = RunningGuard {
            state: &self.state,
            armed: true,
        };

        let outcome = self.pipeline.run_once().await;
        let finished_at = self.clock.now();

        self.state.send_modify(|status| {
            status.running = false;
            match &outcome {
                Ok(_) => {
                    status.last_completed_at = Some(finished_at);
                    status.last_error = None;
                }
                Err(err) => status.last_error = Some(err.to_string()),
            }
        });
        guard.armed = false;

        if let Err(err) = outcome {
            error!(error = %err, "Sync pass failed");
        }
    }
}

/// Returns the coordinator to idle if a pass unwinds before finishing.
struct RunningGuard<'a> {
    state: &'a watch::Sender<SyncStatus>,
    armed: bool,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|status| {
                status.running = false;
                status.last_error = Some("sync pass panicked".to_string());
            });
        }
    }
}

fn is_stale(
    last_completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    match last_completed_at {
        None => true,
        Some(at) => now - at > window,
    }
}
