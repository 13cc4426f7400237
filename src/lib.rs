// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Venue-Presence: client-side venue presence tracking for Hooked Hours.
//!
//! This crate implements the device-side half of venue presence: an
//! adaptive ping scheduler that reports location batches to the remote
//! `venueLocationPing` endpoint, a persistent store of active venue
//! check-ins, and a notification bridge for presence transitions. The
//! geofence decision itself lives server-side; this crate decides when
//! to ask, keeps session state across restarts, and reacts to answers.

pub mod agent;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod services;
pub mod store;

pub use agent::PresenceAgent;
pub use error::{AppError, Result};
