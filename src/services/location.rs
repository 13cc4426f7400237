// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPS fix sampling and derived-signal computation.
//!
//! The sampler sits between the host's [`LocationProvider`] and the ping
//! scheduler. It rejects implausible fixes, keeps a short window of recent
//! fixes, and derives the signals the interval heuristic needs: movement
//! speed and average accuracy.

use crate::error::Result;
use crate::host::LocationProvider;
use crate::models::LocationFix;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Fixes with a worse accuracy radius than this are dropped outright.
const ACCURACY_REJECT_THRESHOLD_M: f64 = 500.0;

/// How many recent fixes feed the derived signals.
const FIX_WINDOW: usize = 8;

/// Speed above which the device counts as moving (slow walk).
const MOVING_SPEED_THRESHOLD_MPS: f64 = 0.5;

/// Derived signals over the recent fix window.
#[derive(Debug, Clone)]
pub struct MovementSummary {
    pub last_fix: Option<LocationFix>,
    pub movement_speed: f64,
    pub average_accuracy: f64,
    pub is_moving: bool,
}

/// Samples fixes from the host and maintains the recent-fix window.
#[derive(Clone)]
pub struct LocationSampler {
    provider: Arc<dyn LocationProvider>,
    window: Arc<Mutex<VecDeque<LocationFix>>>,
}

impl LocationSampler {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self {
            provider,
            window: Arc::new(Mutex::new(VecDeque::with_capacity(FIX_WINDOW))),
        }
    }

    /// Pull one fix from the host and fold it into the window.
    ///
    /// Returns the accepted fix, or `None` when the fix failed the
    /// accuracy filter. Provider errors propagate; the scheduler treats
    /// them as "no location this tick".
    pub async fn sample(&self) -> Result<Option<LocationFix>> {
        let fix = self.provider.current_fix().await?;
        Ok(self.ingest(fix))
    }

    /// Fold an externally supplied fix (background callback) into the
    /// window, applying the same accuracy filter as `sample`.
    pub fn ingest(&self, fix: LocationFix) -> Option<LocationFix> {
        if fix.accuracy_m > ACCURACY_REJECT_THRESHOLD_M {
            tracing::debug!(
                accuracy = fix.accuracy_m,
                "Dropping fix beyond accuracy threshold"
            );
            return None;
        }

        let mut window = self.window.lock().expect("fix window lock poisoned");
        if window.len() == FIX_WINDOW {
            window.pop_front();
        }
        window.push_back(fix.clone());
        Some(fix)
    }

    /// Compute movement speed, average accuracy, and the moving flag from
    /// the current window.
    pub fn summarize(&self) -> MovementSummary {
        let window = self.window.lock().expect("fix window lock poisoned");

        let last_fix = window.back().cloned();

        let average_accuracy = if window.is_empty() {
            0.0
        } else {
            window.iter().map(|f| f.accuracy_m).sum::<f64>() / window.len() as f64
        };

        let movement_speed = derive_speed(&window);
        let is_moving = movement_speed > MOVING_SPEED_THRESHOLD_MPS;

        MovementSummary {
            last_fix,
            movement_speed,
            average_accuracy,
            is_moving,
        }
    }

    /// Drop the fix window (used when monitoring stops).
    pub fn reset(&self) {
        self.window.lock().expect("fix window lock poisoned").clear();
    }
}

/// Speed estimate over the window. Prefers the receiver-reported speed of
/// the newest fix; falls back to haversine distance over elapsed time
/// between the two newest fixes.
fn derive_speed(window: &VecDeque<LocationFix>) -> f64 {
    let newest = match window.back() {
        Some(f) => f,
        None => return 0.0,
    };

    if let Some(speed) = newest.speed_mps {
        return speed.max(0.0);
    }

    let len = window.len();
    if len < 2 {
        return 0.0;
    }
    let previous = &window[len - 2];

    let elapsed = (newest.recorded_at - previous.recorded_at).num_milliseconds() as f64 / 1000.0;
    if elapsed <= 0.0 {
        return 0.0;
    }

    newest.distance_to(previous) / elapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn fix(lat: f64, lng: f64, accuracy: f64, age_secs: i64) -> LocationFix {
        LocationFix {
            latitude: lat,
            longitude: lng,
            accuracy_m: accuracy,
            speed_mps: None,
            recorded_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    struct NoProvider;

    #[async_trait::async_trait]
    impl LocationProvider for NoProvider {
        async fn current_fix(&self) -> Result<LocationFix> {
            Err(crate::error::AppError::Location("no fix".to_string()))
        }
    }

    fn sampler() -> LocationSampler {
        LocationSampler::new(Arc::new(NoProvider))
    }

    #[test]
    fn test_rejects_inaccurate_fix() {
        let s = sampler();
        assert!(s.ingest(fix(37.0, -122.0, 600.0, 0)).is_none());
        assert!(s.summarize().last_fix.is_none());
    }

    #[test]
    fn test_average_accuracy_over_window() {
        let s = sampler();
        s.ingest(fix(37.0, -122.0, 10.0, 20));
        s.ingest(fix(37.0, -122.0, 30.0, 10));
        let summary = s.summarize();
        assert!((summary.average_accuracy - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_stationary_fixes_not_moving() {
        let s = sampler();
        s.ingest(fix(37.7749, -122.4194, 10.0, 30));
        s.ingest(fix(37.7749, -122.4194, 10.0, 0));
        let summary = s.summarize();
        assert!(!summary.is_moving);
        assert!(summary.movement_speed < MOVING_SPEED_THRESHOLD_MPS);
    }

    #[test]
    fn test_derived_speed_from_displacement() {
        let s = sampler();
        // ~111 m of latitude in 60 s → just under 2 m/s
        s.ingest(fix(37.0000, -122.0, 10.0, 60));
        s.ingest(fix(37.0010, -122.0, 10.0, 0));
        let summary = s.summarize();
        assert!(summary.is_moving);
        assert!((1.0..3.0).contains(&summary.movement_speed));
    }

    #[test]
    fn test_receiver_speed_preferred() {
        let s = sampler();
        let mut f = fix(37.0, -122.0, 10.0, 0);
        f.speed_mps = Some(4.2);
        s.ingest(f);
        let summary = s.summarize();
        assert!((summary.movement_speed - 4.2).abs() < 1e-9);
        assert!(summary.is_moving);
    }

    #[test]
    fn test_window_bounded() {
        let s = sampler();
        for i in 0..20 {
            s.ingest(fix(37.0, -122.0, 10.0 + i as f64, 20 - i));
        }
        let window = s.window.lock().unwrap();
        assert_eq!(window.len(), FIX_WINDOW);
    }
}
