// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ping scheduler: the periodic presence loop.
//!
//! One tokio task per agent. Each tick gathers a fresh [`PingContext`],
//! decides whether to contact the remote endpoint, batches all active
//! venues into a single call, applies the results to the session store,
//! drives notifications, and re-arms itself with the recomputed interval.
//!
//! Failure never escapes the tick: a transport error falls back to a
//! fixed 120s interval and the loop keeps running. Degraded connectivity
//! widens the cadence, it does not stop presence tracking.

use crate::error::AppError;
use crate::host::PowerMonitor;
use crate::models::{
    AppLifecycle, PingContext, PingStats, VenuePingEntry, VenuePingRequest, WireLocation,
};
use crate::services::interval::{
    compute_ping_interval, should_perform_ping, BASE_INTERVAL_SECS, FALLBACK_INTERVAL_SECS,
};
use crate::services::notifications::NotificationBridge;
use crate::services::ping_client::PingTransport;
use crate::services::session_store::{PingOutcome, SessionStore};
use crate::services::LocationSampler;
use crate::store::{keys, KvStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// Distance at which a paused venue triggers a "you're close" alert.
const PROXIMITY_ALERT_M: f64 = 150.0;

/// Record persisted under `last_venue_ping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LastPingRecord {
    at: DateTime<Utc>,
    venue_count: usize,
}

/// Periodic presence ping driver.
#[derive(Clone)]
pub struct PingScheduler {
    sessions: SessionStore,
    sampler: LocationSampler,
    transport: Arc<dyn PingTransport>,
    notifications: NotificationBridge,
    power: Arc<dyn PowerMonitor>,
    app_state: watch::Receiver<AppLifecycle>,
    kv: KvStore,
    session_id: String,
    /// Off-schedule ping requests (background movement, manual refresh)
    ping_requested: Arc<Notify>,
}

impl PingScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: SessionStore,
        sampler: LocationSampler,
        transport: Arc<dyn PingTransport>,
        notifications: NotificationBridge,
        power: Arc<dyn PowerMonitor>,
        app_state: watch::Receiver<AppLifecycle>,
        kv: KvStore,
        session_id: String,
        ping_requested: Arc<Notify>,
    ) -> Self {
        Self {
            sessions,
            sampler,
            transport,
            notifications,
            power,
            app_state,
            kv,
            session_id,
            ping_requested,
        }
    }

    /// Run the scheduler until shutdown is signaled or the last venue is
    /// removed.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Ping scheduler started");
        let mut interval = Duration::from_secs(BASE_INTERVAL_SECS as u64);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.ping_requested.notified() => {
                    tracing::debug!("Off-schedule ping requested");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            if self.sessions.active_count() == 0 {
                tracing::info!("No active venues, scheduler stopping");
                break;
            }

            interval = self.perform_venue_ping().await;
        }

        tracing::info!("Ping scheduler stopped");
    }

    /// One scheduler tick. Returns the interval until the next tick;
    /// never errors.
    pub async fn perform_venue_ping(&self) -> Duration {
        let now = Utc::now();

        // Grace-expired venues go first so they are not pinged again
        for venue_id in self.sessions.prune_expired(now) {
            tracing::debug!(venue_id = %venue_id, "Pruned before ping");
        }

        let context = self.gather_context().await;
        let nearest = self.sessions.nearest_venue_distance();
        let last_ping = self
            .kv
            .get::<LastPingRecord>(keys::LAST_VENUE_PING)
            .ok()
            .flatten()
            .map(|r| r.at);

        if !should_perform_ping(&context, last_ping, now) {
            let next = compute_ping_interval(&context, nearest);
            tracing::debug!(
                battery = context.battery_level,
                accuracy = context.average_accuracy,
                next_secs = next.as_secs(),
                "Ping skipped"
            );
            self.update_stats(|s| s.record_skip(next.as_secs()));
            return next;
        }

        let location = match &context.last_location {
            Some(fix) => WireLocation::from(fix),
            None => {
                // No usable fix yet; re-arm and wait for one
                let next = compute_ping_interval(&context, nearest);
                tracing::debug!(next_secs = next.as_secs(), "No location fix, ping deferred");
                self.update_stats(|s| s.record_skip(next.as_secs()));
                return next;
            }
        };

        // Venues in their removal grace period are no longer reported
        let venues: Vec<VenuePingEntry> = self
            .sessions
            .get_active_venues()
            .into_iter()
            .filter(|entry| entry.status == crate::models::VenueStatus::Active)
            .map(|entry| VenuePingEntry {
                venue_id: entry.session.venue_id,
                location: location.clone(),
            })
            .collect();

        if venues.is_empty() {
            let next = compute_ping_interval(&context, nearest);
            self.update_stats(|s| s.record_skip(next.as_secs()));
            return next;
        }

        let request = VenuePingRequest {
            venues,
            battery_level: context.battery_level,
            movement_speed: context.movement_speed,
            session_id: self.session_id.clone(),
        };

        match self.transport.send_ping(&request).await {
            Ok(response) => {
                for result in &response.results {
                    let was_active = self
                        .sessions
                        .get(&result.venue_id)
                        .map(|e| e.session.is_active)
                        .unwrap_or(false);

                    let outcome = self.sessions.apply_ping_result(result, now);
                    if outcome == PingOutcome::UnknownVenue {
                        continue;
                    }

                    if let Some(entry) = self.sessions.get(&result.venue_id) {
                        self.notifications
                            .send_venue_status_notification(&entry, was_active, result);
                        self.notifications
                            .schedule_venue_transition_notifications(&entry, result);

                        // Paused but hovering near the geofence: nudge once
                        if !entry.session.is_active {
                            if let Some(distance) = result.distance {
                                if distance <= PROXIMITY_ALERT_M {
                                    self.notifications.send_proximity_alert(
                                        &entry.session.venue_id,
                                        &entry.session.venue_name,
                                        distance,
                                    );
                                }
                            }
                        }
                    }

                    if outcome == PingOutcome::RemovalScheduled {
                        self.sessions
                            .schedule_grace_removal(result.venue_id.clone());
                    }
                }

                let nearest = self.sessions.nearest_venue_distance();
                let next = compute_ping_interval(&context, nearest);

                if let Err(e) = self.kv.set(
                    keys::LAST_VENUE_PING,
                    &LastPingRecord {
                        at: now,
                        venue_count: request.venues.len(),
                    },
                ) {
                    tracing::error!(error = %e, "Failed to persist last ping record");
                }
                self.update_stats(|s| s.record_success(now, next.as_secs()));

                tracing::info!(
                    venues = request.venues.len(),
                    results = response.results.len(),
                    next_secs = next.as_secs(),
                    "Ping completed"
                );
                next
            }
            Err(e) => {
                self.log_transport_failure(&e);
                self.update_stats(|s| s.record_failure(now, FALLBACK_INTERVAL_SECS));
                Duration::from_secs(FALLBACK_INTERVAL_SECS)
            }
        }
    }

    /// Handle to request an off-schedule ping.
    pub fn ping_trigger(&self) -> Arc<Notify> {
        self.ping_requested.clone()
    }

    /// Build the ephemeral per-ping context from the sampler, battery,
    /// and app lifecycle. Location failures degrade to "no fix" rather
    /// than aborting the tick.
    async fn gather_context(&self) -> PingContext {
        if let Err(e) = self.sampler.sample().await {
            tracing::debug!(error = %e, "Location sample unavailable");
        }

        let summary = self.sampler.summarize();
        PingContext {
            battery_level: self.power.battery_level(),
            is_moving: summary.is_moving,
            app_state: *self.app_state.borrow(),
            last_location: summary.last_fix,
            movement_speed: summary.movement_speed,
            average_accuracy: summary.average_accuracy,
        }
    }

    fn update_stats(&self, apply: impl FnOnce(&mut PingStats)) {
        let mut stats = self
            .kv
            .get::<PingStats>(keys::VENUE_PING_STATS)
            .ok()
            .flatten()
            .unwrap_or_default();
        apply(&mut stats);
        if let Err(e) = self.kv.set(keys::VENUE_PING_STATS, &stats) {
            tracing::error!(error = %e, "Failed to persist ping stats");
        }
    }

    fn log_transport_failure(&self, error: &AppError) {
        tracing::warn!(
            error = %error,
            fallback_secs = FALLBACK_INTERVAL_SECS,
            "Ping failed, falling back to fixed interval"
        );
    }
}
