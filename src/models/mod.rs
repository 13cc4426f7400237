// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the presence subsystem.

pub mod location;
pub mod ping;
pub mod stats;
pub mod venue;

pub use location::LocationFix;
pub use ping::{
    AppLifecycle, PingContext, PresenceState, VenuePingEntry, VenuePingRequest, VenuePingResponse,
    VenuePingResult, WireLocation,
};
pub use stats::PingStats;
pub use venue::{VenueEventEntry, VenueEventSession, VenueStatus};
