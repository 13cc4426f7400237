// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Presence agent: check-in lifecycle and scheduler ownership.
//!
//! One agent per process, constructed at startup and passed by reference.
//! Adding the first venue starts the ping scheduler task and registers
//! the background tasks with the host; removing the last venue stops
//! both. The scheduler task also exits on its own when it observes an
//! empty venue set, so the two paths converge.

use crate::error::Result;
use crate::host::{BackgroundTaskHost, TASK_BACKGROUND_LOCATION, TASK_BACKGROUND_PING};
use crate::models::{LocationFix, VenueEventEntry, VenueEventSession};
use crate::services::{BackgroundLocationProcessor, LocationSampler, PingScheduler, SessionStore};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Running scheduler task plus its shutdown signal.
struct SchedulerTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Coordinates check-ins, the scheduler task, and background monitoring.
pub struct PresenceAgent {
    sessions: SessionStore,
    scheduler: PingScheduler,
    background: BackgroundLocationProcessor,
    sampler: LocationSampler,
    task_host: Arc<dyn BackgroundTaskHost>,
    running: Mutex<Option<SchedulerTask>>,
}

impl PresenceAgent {
    pub fn new(
        sessions: SessionStore,
        scheduler: PingScheduler,
        background: BackgroundLocationProcessor,
        sampler: LocationSampler,
        task_host: Arc<dyn BackgroundTaskHost>,
    ) -> Self {
        Self {
            sessions,
            scheduler,
            background,
            sampler,
            task_host,
            running: Mutex::new(None),
        }
    }

    /// Check into a venue from a scanned QR code.
    ///
    /// This is the one path where errors propagate to the caller: a
    /// check-in the user just performed must not fail silently.
    pub async fn check_in(&self, session: VenueEventSession) -> Result<()> {
        let venue_id = session.venue_id.clone();
        let count = self.sessions.add_venue_session(session)?;

        if count == 1 {
            self.start_monitoring().await;
        } else {
            // Already running: fold the new venue into the next batch now
            self.scheduler.ping_trigger().notify_one();
        }

        tracing::info!(venue_id = %venue_id, "Checked in");
        Ok(())
    }

    /// Check out of a venue.
    pub async fn check_out(&self, venue_id: &str) -> Result<()> {
        let remaining = self.sessions.remove_venue_session(venue_id)?;
        if remaining == 0 {
            self.stop_monitoring().await;
        }
        tracing::info!(venue_id, remaining, "Checked out");
        Ok(())
    }

    /// Venues currently tracked.
    pub fn active_venues(&self) -> Vec<VenueEventEntry> {
        self.sessions.get_active_venues()
    }

    /// Whether the scheduler task is currently running.
    pub async fn is_monitoring(&self) -> bool {
        let running = self.running.lock().await;
        running.as_ref().is_some_and(|t| !t.handle.is_finished())
    }

    /// Host background-location callback entry point.
    pub fn on_background_locations(&self, fixes: Vec<LocationFix>) {
        self.background.process_locations(fixes);
    }

    /// Resume monitoring for sessions restored from a previous process.
    pub async fn resume_if_needed(&self) {
        if self.sessions.active_count() > 0 && !self.is_monitoring().await {
            tracing::info!(
                venues = self.sessions.active_count(),
                "Resuming monitoring for restored sessions"
            );
            self.start_monitoring().await;
        }
    }

    /// Stop the scheduler and unregister background tasks (shutdown path).
    pub async fn shutdown(&self) {
        self.stop_monitoring().await;
    }

    async fn start_monitoring(&self) {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return;
        }

        // Background task registration is best-effort: a denied location
        // permission disables background monitoring but leaves the
        // foreground scheduler intact.
        for task in [TASK_BACKGROUND_LOCATION, TASK_BACKGROUND_PING] {
            if let Err(e) = self.task_host.register(task) {
                tracing::warn!(task, error = %e, "Background task registration failed");
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = self.scheduler.clone();
        let handle = tokio::spawn(async move {
            scheduler.run(shutdown_rx).await;
        });

        *running = Some(SchedulerTask {
            handle,
            shutdown: shutdown_tx,
        });
        tracing::info!("Venue monitoring started");
    }

    async fn stop_monitoring(&self) {
        let mut running = self.running.lock().await;
        let Some(task) = running.take() else {
            return;
        };

        // An Err here means the scheduler already exited on its own
        let _ = task.shutdown.send(true);
        if let Err(e) = task.handle.await {
            if e.is_panic() {
                tracing::error!(error = %e, "Scheduler task panicked");
            }
        }

        for task_name in [TASK_BACKGROUND_LOCATION, TASK_BACKGROUND_PING] {
            if let Err(e) = self.task_host.unregister(task_name) {
                tracing::warn!(task = task_name, error = %e, "Task unregistration failed");
            }
        }

        // Stale fixes must not seed movement detection on the next check-in
        self.sampler.reset();
        tracing::info!("Venue monitoring stopped");
    }
}

impl std::fmt::Debug for PresenceAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceAgent")
            .field("active_venues", &self.sessions.active_count())
            .finish()
    }
}
