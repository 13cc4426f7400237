// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - presence subsystem logic.

pub mod background;
pub mod interval;
pub mod location;
pub mod notifications;
pub mod ping_client;
pub mod scheduler;
pub mod session_store;

pub use background::BackgroundLocationProcessor;
pub use location::{LocationSampler, MovementSummary};
pub use notifications::NotificationBridge;
pub use ping_client::{PingClient, PingTransport};
pub use scheduler::PingScheduler;
pub use session_store::{PingOutcome, SessionStore};
