// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Host runtime collaborator interfaces.
//!
//! The GPS receiver, battery readout, notification center, and background
//! task scheduler belong to the embedding host, not to this crate. Each is
//! a trait the host implements; the concrete types here are the ones the
//! headless agent binary wires in on Linux.

use crate::error::{AppError, Result};
use crate::models::LocationFix;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

/// Background task names registered with the host scheduler.
pub const TASK_BACKGROUND_LOCATION: &str = "venue-background-location";
pub const TASK_BACKGROUND_PING: &str = "venue-background-ping";

/// Source of device GPS fixes.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Obtain the most recent fix, or an error when no fix is available
    /// (permission denied, receiver cold, feed missing).
    async fn current_fix(&self) -> Result<LocationFix>;
}

/// Battery charge readout.
pub trait PowerMonitor: Send + Sync {
    /// Battery charge in percent [0, 100].
    fn battery_level(&self) -> f64;
}

/// Local notification delivery.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, title: &str, body: &str);
}

/// OS background task registration.
///
/// Registration failures are reported but non-fatal: foreground pinging
/// keeps working without background callbacks.
pub trait BackgroundTaskHost: Send + Sync {
    fn register(&self, task_name: &str) -> Result<()>;
    fn unregister(&self, task_name: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Concrete implementations for the headless agent
// ─────────────────────────────────────────────────────────────────────────────

/// Reads the latest fix from a JSON file the host keeps updated.
pub struct FileFeedLocationProvider {
    path: PathBuf,
}

impl FileFeedLocationProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl LocationProvider for FileFeedLocationProvider {
    async fn current_fix(&self) -> Result<LocationFix> {
        let path = self.path.clone();
        let data = tokio::task::spawn_blocking(move || fs::read_to_string(&path))
            .await
            .map_err(|e| AppError::Location(format!("feed read join: {}", e)))?
            .map_err(|e| AppError::Location(format!("feed read: {}", e)))?;
        serde_json::from_str(&data).map_err(|e| AppError::Location(format!("feed parse: {}", e)))
    }
}

/// Reads battery capacity from sysfs (`/sys/class/power_supply/.../capacity`).
///
/// Hosts without a battery (or with an unreadable sysfs node) report 100%,
/// which keeps the scheduler at its baseline cadence.
pub struct SysfsPowerMonitor {
    capacity_path: PathBuf,
}

impl SysfsPowerMonitor {
    pub fn new(capacity_path: PathBuf) -> Self {
        Self { capacity_path }
    }
}

impl PowerMonitor for SysfsPowerMonitor {
    fn battery_level(&self) -> f64 {
        fs::read_to_string(&self.capacity_path)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(100.0)
    }
}

/// Delivers notifications as structured log events.
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn deliver(&self, title: &str, body: &str) {
        tracing::info!(title, body, "Local notification");
    }
}

/// Task host for environments without an OS background scheduler; records
/// registrations in the log and succeeds.
pub struct NoopTaskHost;

impl BackgroundTaskHost for NoopTaskHost {
    fn register(&self, task_name: &str) -> Result<()> {
        tracing::debug!(task = task_name, "Background task registered (noop host)");
        Ok(())
    }

    fn unregister(&self, task_name: &str) -> Result<()> {
        tracing::debug!(task = task_name, "Background task unregistered (noop host)");
        Ok(())
    }
}
