// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ping context and the venueLocationPing wire format.
//!
//! The remote endpoint speaks camelCase JSON; everything here that crosses
//! the wire carries `rename_all = "camelCase"`.

use crate::models::LocationFix;
use serde::{Deserialize, Serialize};

/// Foreground/background state of the embedding app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycle {
    Foreground,
    Background,
}

/// Ephemeral per-ping context. Recomputed before every ping decision and
/// never persisted.
#[derive(Debug, Clone)]
pub struct PingContext {
    /// Battery charge in percent [0, 100]
    pub battery_level: f64,
    pub is_moving: bool,
    pub app_state: AppLifecycle,
    pub last_location: Option<LocationFix>,
    /// Estimated movement speed over the recent fix window (m/s)
    pub movement_speed: f64,
    /// Mean horizontal accuracy over the recent fix window (meters)
    pub average_accuracy: f64,
}

/// Presence state returned by the remote endpoint for one venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    Active,
    Paused,
    Inactive,
}

/// One venue's position report inside a ping batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenuePingEntry {
    pub venue_id: String,
    pub location: WireLocation,
}

/// Wire shape of a location: `{lat, lng, accuracy}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireLocation {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: f64,
}

impl From<&LocationFix> for WireLocation {
    fn from(fix: &LocationFix) -> Self {
        Self {
            lat: fix.latitude,
            lng: fix.longitude,
            accuracy: fix.accuracy_m,
        }
    }
}

/// Request body for the venueLocationPing Cloud Function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenuePingRequest {
    pub venues: Vec<VenuePingEntry>,
    pub battery_level: f64,
    pub movement_speed: f64,
    pub session_id: String,
}

/// Per-venue result from the remote endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenuePingResult {
    pub venue_id: String,
    pub success: bool,
    pub current_state: PresenceState,
    pub state_changed: bool,
    pub profile_visible: bool,
    /// Server-suggested next interval in seconds (advisory; the local
    /// heuristic still clamps)
    pub next_ping_interval: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    /// Distance to the venue in meters, when the server computed one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// Top-level response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenuePingResponse {
    pub success: bool,
    pub results: Vec<VenuePingResult>,
}
