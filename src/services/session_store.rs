// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Active venue session store.
//!
//! Holds the set of venues the user is currently checked into, keyed by
//! venue ID, and mirrors every mutation to the local key-value store so
//! sessions survive process restart. A venue that the server marks
//! inactive (with the profile hidden) is not dropped immediately: it gets
//! a 30s grace deadline, pruned either by the scheduler tick or by a
//! spawned grace timer, whichever fires first.

use crate::error::{AppError, Result};
use crate::models::{
    PresenceState, VenueEventEntry, VenueEventSession, VenuePingResult, VenueStatus,
};
use crate::store::{keys, KvStore};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Grace period before an inactive venue is removed.
pub const REMOVAL_GRACE_SECS: i64 = 30;

/// Outcome of applying one ping result to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
    /// No state change reported by the server
    Unchanged,
    /// Presence flipped to active
    BecameActive,
    /// Presence paused (user drifting out of the geofence)
    BecamePaused,
    /// Venue went inactive with the profile hidden; removal scheduled
    RemovalScheduled,
    /// Result referenced a venue we no longer track
    UnknownVenue,
}

/// Store for active venue check-ins.
#[derive(Clone)]
pub struct SessionStore {
    venues: Arc<DashMap<String, VenueEventEntry>>,
    kv: KvStore,
}

impl SessionStore {
    /// Create a store over the given key-value backend, restoring any
    /// sessions persisted by a previous process.
    pub fn load(kv: KvStore) -> Result<Self> {
        let venues: Arc<DashMap<String, VenueEventEntry>> = Arc::new(DashMap::new());

        if let Some(persisted) =
            kv.get::<HashMap<String, VenueEventEntry>>(keys::ACTIVE_VENUE_SESSIONS)?
        {
            for (venue_id, entry) in persisted {
                // Left/expired entries from a dead process are not revived
                if entry.status == VenueStatus::Active {
                    venues.insert(venue_id, entry);
                }
            }
            tracing::info!(count = venues.len(), "Restored venue sessions");
        }

        Ok(Self { venues, kv })
    }

    /// Add a venue session from a QR check-in.
    ///
    /// Returns the number of active venues after the add. Errors here are
    /// propagated (explicit session creation is the one path that throws).
    pub fn add_venue_session(&self, session: VenueEventSession) -> Result<usize> {
        let venue_id = session.venue_id.clone();
        if venue_id.is_empty() {
            return Err(AppError::BadRequest("venue_id must not be empty".to_string()));
        }

        self.venues
            .insert(venue_id.clone(), VenueEventEntry::new(session));
        self.persist()?;

        let count = self.venues.len();
        tracing::info!(venue_id = %venue_id, active = count, "Venue session added");
        Ok(count)
    }

    /// Remove a venue session (user left or session pruned).
    ///
    /// Returns the number of venues remaining, or `NotFound` when the
    /// venue was not tracked.
    pub fn remove_venue_session(&self, venue_id: &str) -> Result<usize> {
        if self.venues.remove(venue_id).is_none() {
            return Err(AppError::NotFound(format!("venue {}", venue_id)));
        }
        self.persist()?;

        let count = self.venues.len();
        tracing::info!(venue_id, active = count, "Venue session removed");
        Ok(count)
    }

    /// Snapshot of all tracked venues.
    pub fn get_active_venues(&self) -> Vec<VenueEventEntry> {
        self.venues.iter().map(|e| e.value().clone()).collect()
    }

    /// Number of tracked venues.
    pub fn active_count(&self) -> usize {
        self.venues.len()
    }

    pub fn get(&self, venue_id: &str) -> Option<VenueEventEntry> {
        self.venues.get(venue_id).map(|e| e.value().clone())
    }

    /// Distance to the nearest venue, from the last ping results.
    pub fn nearest_venue_distance(&self) -> Option<f64> {
        self.venues
            .iter()
            .filter_map(|e| e.value().last_distance_m)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Apply one server result to the corresponding entry.
    ///
    /// Updates `last_ping_at` and the cached distance on every result;
    /// when the server reports a state change to inactive with the
    /// profile hidden, stamps the 30s grace deadline instead of removing
    /// immediately.
    pub fn apply_ping_result(&self, result: &VenuePingResult, now: DateTime<Utc>) -> PingOutcome {
        let mut entry = match self.venues.get_mut(&result.venue_id) {
            Some(e) => e,
            None => {
                tracing::warn!(venue_id = %result.venue_id, "Ping result for untracked venue");
                return PingOutcome::UnknownVenue;
            }
        };

        entry.last_ping_at = Some(now);
        if result.distance.is_some() {
            entry.last_distance_m = result.distance;
        }

        let outcome = if !result.state_changed {
            PingOutcome::Unchanged
        } else {
            match result.current_state {
                PresenceState::Active => {
                    entry.session.is_active = true;
                    entry.status = VenueStatus::Active;
                    entry.grace_deadline = None;
                    PingOutcome::BecameActive
                }
                PresenceState::Paused => {
                    entry.session.is_active = false;
                    PingOutcome::BecamePaused
                }
                PresenceState::Inactive => {
                    entry.session.is_active = false;
                    if !result.profile_visible {
                        entry.status = VenueStatus::Expired;
                        entry.grace_deadline =
                            Some(now + ChronoDuration::seconds(REMOVAL_GRACE_SECS));
                        PingOutcome::RemovalScheduled
                    } else {
                        PingOutcome::Unchanged
                    }
                }
            }
        };

        drop(entry);
        if let Err(e) = self.persist() {
            tracing::error!(error = %e, "Failed to persist session update");
        }
        outcome
    }

    /// Remove entries whose grace deadline has passed.
    ///
    /// Returns the IDs of the venues that were pruned.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> Vec<String> {
        let expired: Vec<String> = self
            .venues
            .iter()
            .filter(|e| {
                e.value()
                    .grace_deadline
                    .is_some_and(|deadline| now >= deadline)
            })
            .map(|e| e.key().clone())
            .collect();

        for venue_id in &expired {
            self.venues.remove(venue_id);
            tracing::info!(venue_id = %venue_id, "Venue session pruned after grace period");
        }

        if !expired.is_empty() {
            if let Err(e) = self.persist() {
                tracing::error!(error = %e, "Failed to persist after prune");
            }
        }
        expired
    }

    /// Spawn a timer that removes the given venue once its grace period
    /// elapses, so removal lands inside the window even when the ping
    /// interval is long. A venue reactivated in the meantime is left
    /// alone.
    pub fn schedule_grace_removal(&self, venue_id: String) {
        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(REMOVAL_GRACE_SECS as u64)).await;
            let still_expired = store
                .get(&venue_id)
                .is_some_and(|e| e.status == VenueStatus::Expired);
            if still_expired {
                if let Err(e) = store.remove_venue_session(&venue_id) {
                    tracing::debug!(venue_id = %venue_id, error = %e, "Grace removal raced");
                } else {
                    tracing::info!(venue_id = %venue_id, "Venue removed after grace period");
                }
            }
        });
    }

    /// Mirror the venue map to the key-value store.
    fn persist(&self) -> Result<()> {
        let snapshot: HashMap<String, VenueEventEntry> = self
            .venues
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        self.kv.set(keys::ACTIVE_VENUE_SESSIONS, &snapshot)
    }
}
