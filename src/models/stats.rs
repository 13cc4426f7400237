//! Ping statistics aggregate for diagnostics.
//!
//! Updated on every scheduler tick and persisted under the
//! `venue_ping_stats` key, so a restarted process keeps its counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Running counters for the ping scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingStats {
    #[serde(default)]
    pub total_pings: u64,
    #[serde(default)]
    pub successful_pings: u64,
    #[serde(default)]
    pub failed_pings: u64,
    /// Ticks where `should_perform_ping` declined to contact the endpoint
    #[serde(default)]
    pub skipped_pings: u64,
    #[serde(default)]
    pub last_ping_at: Option<DateTime<Utc>>,
    /// Interval the scheduler last armed itself with (seconds)
    #[serde(default)]
    pub last_interval_secs: u64,
}

impl Default for PingStats {
    fn default() -> Self {
        Self {
            total_pings: 0,
            successful_pings: 0,
            failed_pings: 0,
            skipped_pings: 0,
            last_ping_at: None,
            last_interval_secs: 0,
        }
    }
}

impl PingStats {
    pub fn record_success(&mut self, now: DateTime<Utc>, interval_secs: u64) {
        self.total_pings += 1;
        self.successful_pings += 1;
        self.last_ping_at = Some(now);
        self.last_interval_secs = interval_secs;
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>, interval_secs: u64) {
        self.total_pings += 1;
        self.failed_pings += 1;
        self.last_ping_at = Some(now);
        self.last_interval_secs = interval_secs;
    }

    pub fn record_skip(&mut self, interval_secs: u64) {
        self.skipped_pings += 1;
        self.last_interval_secs = interval_secs;
    }
}
