// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turns venue state transitions into local notifications.
//!
//! Delivery goes through the host's [`NotificationSink`]; this service
//! owns only the transition logic and deduplication. Proximity alerts are
//! sent at most once per venue per process lifetime until
//! `clear_proximity_flags` is called.

use crate::host::NotificationSink;
use crate::models::{PresenceState, VenueEventEntry, VenuePingResult};
use dashmap::DashSet;
use std::sync::Arc;

/// Bridge from presence transitions to host notifications.
#[derive(Clone)]
pub struct NotificationBridge {
    sink: Arc<dyn NotificationSink>,
    /// Venues that already received a proximity alert this process
    proximity_alerted: Arc<DashSet<String>>,
}

impl NotificationBridge {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            proximity_alerted: Arc::new(DashSet::new()),
        }
    }

    /// Notify on an is-active flip. `was_active` is the entry's active
    /// flag before the ping result was applied; nothing fires when the
    /// flag did not change.
    pub fn send_venue_status_notification(
        &self,
        entry: &VenueEventEntry,
        was_active: bool,
        result: &VenuePingResult,
    ) {
        let is_active = result.current_state == PresenceState::Active;
        if is_active == was_active {
            return;
        }

        let venue = &entry.session.venue_name;
        let (title, body) = if is_active {
            (
                format!("You're live at {}", venue),
                "Your profile is visible to people here.".to_string(),
            )
        } else {
            (
                format!("Paused at {}", venue),
                result
                    .user_message
                    .clone()
                    .unwrap_or_else(|| "Your profile is hidden until you're back.".to_string()),
            )
        };

        tracing::debug!(venue_id = %entry.session.venue_id, is_active, "Status notification");
        self.sink.deliver(&title, &body);
    }

    /// Alert the user they are near a checked-in venue. Deduplicated per
    /// venue for the life of the process.
    pub fn send_proximity_alert(&self, venue_id: &str, venue_name: &str, distance_m: f64) {
        if !self.proximity_alerted.insert(venue_id.to_string()) {
            tracing::debug!(venue_id, "Proximity alert suppressed (already sent)");
            return;
        }

        self.sink.deliver(
            &format!("{} is nearby", venue_name),
            &format!("About {:.0}m away — check in to go live.", distance_m),
        );
    }

    /// Notifications for paused/inactive transitions reported by a ping.
    pub fn schedule_venue_transition_notifications(
        &self,
        entry: &VenueEventEntry,
        result: &VenuePingResult,
    ) {
        if !result.state_changed {
            return;
        }

        let venue = &entry.session.venue_name;
        match result.current_state {
            PresenceState::Paused => {
                self.sink.deliver(
                    &format!("Leaving {}?", venue),
                    result
                        .user_message
                        .as_deref()
                        .unwrap_or("Head back to stay visible."),
                );
            }
            PresenceState::Inactive => {
                self.sink.deliver(
                    &format!("Session ended at {}", venue),
                    result
                        .user_message
                        .as_deref()
                        .unwrap_or("Scan the QR code again next time you're here."),
                );
            }
            PresenceState::Active => {} // covered by the status notification
        }
    }

    /// Reset proximity deduplication (e.g. on a new day or app restart
    /// policy decided by the host).
    pub fn clear_proximity_flags(&self) {
        self.proximity_alerted.clear();
    }
}
