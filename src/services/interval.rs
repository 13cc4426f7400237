// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Adaptive ping interval heuristic.
//!
//! Pure functions of [`PingContext`], kept free of timers and I/O so the
//! battery/movement behavior can be tested directly.
//!
//! The interval adapts multiplicatively from a 60s base:
//! low battery and background operation widen it, movement and venue
//! proximity tighten it, and the result is always clamped to [20s, 600s].

use crate::models::{AppLifecycle, PingContext};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

/// Base ping cadence before any adjustment.
pub const BASE_INTERVAL_SECS: f64 = 60.0;

/// Hard bounds on the computed interval.
pub const MIN_INTERVAL_SECS: f64 = 20.0;
pub const MAX_INTERVAL_SECS: f64 = 600.0;

/// Interval used when the remote call fails.
pub const FALLBACK_INTERVAL_SECS: u64 = 120;

/// Battery floor below which pinging is suspended entirely.
const BATTERY_SUSPEND_PCT: f64 = 10.0;

/// Minimum time between pings while backgrounded and stationary.
const BACKGROUND_IDLE_MIN_GAP_SECS: i64 = 5 * 60;

/// Accuracy beyond which a ping would be meaningless to the geofence.
const ACCURACY_SKIP_THRESHOLD_M: f64 = 200.0;

/// Venue distance beyond which the cadence relaxes.
const FAR_FROM_VENUE_M: f64 = 200.0;

/// Accuracy beyond which the cadence relaxes (poor GPS environment).
const POOR_ACCURACY_M: f64 = 100.0;

/// Decide whether this tick should contact the remote endpoint at all.
///
/// Skips when:
/// - battery is below 10%
/// - the app is backgrounded, the device is stationary, and fewer than
///   five minutes have passed since the last ping
/// - average accuracy is worse than 200m (the server could not trust
///   the geofence result anyway)
pub fn should_perform_ping(
    context: &PingContext,
    last_ping_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    if context.battery_level < BATTERY_SUSPEND_PCT {
        return false;
    }

    if context.app_state == AppLifecycle::Background && !context.is_moving {
        let recently_pinged = last_ping_at.is_some_and(|at| {
            now - at < ChronoDuration::seconds(BACKGROUND_IDLE_MIN_GAP_SECS)
        });
        if recently_pinged {
            return false;
        }
    }

    if context.average_accuracy > ACCURACY_SKIP_THRESHOLD_M {
        return false;
    }

    true
}

/// Compute the next ping interval from the current context and the
/// distance to the nearest active venue (from the last ping results).
pub fn compute_ping_interval(context: &PingContext, nearest_venue_m: Option<f64>) -> Duration {
    let mut secs = BASE_INTERVAL_SECS;

    if context.battery_level < 20.0 {
        secs *= 2.5;
    } else if context.battery_level < 50.0 {
        secs *= 1.5;
    }

    secs *= if context.is_moving { 0.7 } else { 1.3 };

    if context.app_state == AppLifecycle::Background {
        secs *= 1.8;
    }

    if nearest_venue_m.is_some_and(|d| d > FAR_FROM_VENUE_M) {
        secs *= 1.4;
    }

    if context.average_accuracy > POOR_ACCURACY_M {
        secs *= 1.2;
    }

    Duration::from_secs_f64(secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS))
}
