// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background location callback processing.
//!
//! The host's background task scheduler delivers batches of fixes under
//! the `venue-background-location` task while the app is suspended. The
//! OS may fire the callback again before a slow batch finishes, so an
//! atomic in-flight flag drops overlapping invocations instead of
//! queueing them. Each processed batch is snapshotted to the
//! `venue_background_state` key, and a large displacement since the last
//! reported position requests an off-schedule ping.

use crate::models::LocationFix;
use crate::services::LocationSampler;
use crate::store::{keys, KvStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Displacement since the last ping that warrants an immediate re-check.
const SIGNIFICANT_MOVE_M: f64 = 100.0;

/// Snapshot persisted under `venue_background_state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundState {
    pub last_fix: Option<LocationFix>,
    pub processed_at: DateTime<Utc>,
    pub batches_processed: u64,
    pub fixes_dropped: u64,
}

/// Processes background location batches from the host.
#[derive(Clone)]
pub struct BackgroundLocationProcessor {
    sampler: LocationSampler,
    kv: KvStore,
    ping_requested: Arc<Notify>,
    is_processing: Arc<AtomicBool>,
}

impl BackgroundLocationProcessor {
    pub fn new(sampler: LocationSampler, kv: KvStore, ping_requested: Arc<Notify>) -> Self {
        Self {
            sampler,
            kv,
            ping_requested,
            is_processing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Entry point for the `venue-background-location` callback.
    ///
    /// Returns `false` when the batch was dropped because a previous
    /// invocation is still in flight.
    pub fn process_locations(&self, fixes: Vec<LocationFix>) -> bool {
        if self
            .is_processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(
                batch = fixes.len(),
                "Background batch dropped, previous invocation still running"
            );
            return false;
        }

        let before = self.sampler.summarize().last_fix;

        let mut accepted = 0u64;
        let mut dropped = 0u64;
        let batch = fixes.len();
        for fix in fixes {
            if self.sampler.ingest(fix).is_some() {
                accepted += 1;
            } else {
                dropped += 1;
            }
        }

        let after = self.sampler.summarize().last_fix;

        // Persist the snapshot; a failure here is logged, not fatal
        let mut state = self
            .kv
            .get::<BackgroundState>(keys::VENUE_BACKGROUND_STATE)
            .ok()
            .flatten()
            .unwrap_or(BackgroundState {
                last_fix: None,
                processed_at: Utc::now(),
                batches_processed: 0,
                fixes_dropped: 0,
            });
        state.last_fix = after.clone();
        state.processed_at = Utc::now();
        state.batches_processed += 1;
        state.fixes_dropped += dropped;
        if let Err(e) = self.kv.set(keys::VENUE_BACKGROUND_STATE, &state) {
            tracing::error!(error = %e, "Failed to persist background state");
        }

        // Significant movement while backgrounded: ask the scheduler to
        // ping now instead of waiting out a widened interval.
        if let (Some(prev), Some(curr)) = (&before, &after) {
            let moved = prev.distance_to(curr);
            if moved > SIGNIFICANT_MOVE_M {
                tracing::debug!(moved_m = moved, "Significant background movement");
                self.ping_requested.notify_one();
            }
        }

        tracing::debug!(batch, accepted, dropped, "Background batch processed");

        self.is_processing.store(false, Ordering::Release);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::host::LocationProvider;

    struct NoProvider;

    #[async_trait::async_trait]
    impl LocationProvider for NoProvider {
        async fn current_fix(&self) -> Result<LocationFix> {
            Err(crate::error::AppError::Location("no fix".to_string()))
        }
    }

    fn fix(lat: f64, lng: f64, accuracy: f64) -> LocationFix {
        LocationFix {
            latitude: lat,
            longitude: lng,
            accuracy_m: accuracy,
            speed_mps: None,
            recorded_at: Utc::now(),
        }
    }

    fn processor(kv: KvStore) -> BackgroundLocationProcessor {
        let sampler = LocationSampler::new(Arc::new(NoProvider));
        BackgroundLocationProcessor::new(sampler, kv, Arc::new(Notify::new()))
    }

    #[test]
    fn test_batch_persists_snapshot() {
        let kv = KvStore::new_in_memory();
        let p = processor(kv.clone());

        assert!(p.process_locations(vec![fix(37.0, -122.0, 10.0), fix(37.0, -122.0, 800.0)]));

        let state: BackgroundState = kv
            .get(keys::VENUE_BACKGROUND_STATE)
            .unwrap()
            .expect("snapshot written");
        assert_eq!(state.batches_processed, 1);
        assert_eq!(state.fixes_dropped, 1);
        assert!(state.last_fix.is_some());
    }

    #[test]
    fn test_reentrant_invocation_dropped() {
        let kv = KvStore::new_in_memory();
        let p = processor(kv);

        // Simulate an in-flight invocation
        p.is_processing.store(true, Ordering::Release);
        assert!(!p.process_locations(vec![fix(37.0, -122.0, 10.0)]));

        p.is_processing.store(false, Ordering::Release);
        assert!(p.process_locations(vec![fix(37.0, -122.0, 10.0)]));
    }

    #[tokio::test]
    async fn test_significant_move_requests_ping() {
        let kv = KvStore::new_in_memory();
        let sampler = LocationSampler::new(Arc::new(NoProvider));
        let notify = Arc::new(Notify::new());
        let p = BackgroundLocationProcessor::new(sampler, kv, notify.clone());

        let notified = notify.clone();
        let waiter = tokio::spawn(async move { notified.notified().await });

        // Seed position, then move ~1km
        p.process_locations(vec![fix(37.0000, -122.0, 10.0)]);
        p.process_locations(vec![fix(37.0100, -122.0, 10.0)]);

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("ping should be requested after a large move")
            .unwrap();
    }
}
