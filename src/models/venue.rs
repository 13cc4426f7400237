// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Venue check-in session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A venue the user checked into by scanning a QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueEventSession {
    pub venue_id: String,
    pub qr_code_id: String,
    pub event_name: String,
    pub venue_name: String,
    pub joined_at: DateTime<Utc>,
    /// Rotating nonce from the QR payload, when the venue uses one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_nonce: Option<String>,
    pub is_active: bool,
}

/// Lifecycle status of a stored venue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueStatus {
    Active,
    Expired,
    Left,
}

/// Store-level record for a venue check-in, as persisted under
/// `active_venue_sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueEventEntry {
    pub session: VenueEventSession,
    pub last_ping_at: Option<DateTime<Utc>>,
    pub status: VenueStatus,
    /// Distance to the venue reported by the last ping result (meters)
    pub last_distance_m: Option<f64>,
    /// When set, the entry is in its removal grace period and will be
    /// pruned once this deadline passes.
    pub grace_deadline: Option<DateTime<Utc>>,
}

impl VenueEventEntry {
    pub fn new(session: VenueEventSession) -> Self {
        Self {
            session,
            last_ping_at: None,
            status: VenueStatus::Active,
            last_distance_m: None,
            grace_deadline: None,
        }
    }

    /// Whether this entry is the current (live) check-in for its venue.
    pub fn is_current(&self) -> bool {
        self.status == VenueStatus::Active && self.session.is_active
    }
}
