// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared fakes and wiring helpers for integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};
use venue_presence::error::{AppError, Result};
use venue_presence::host::{BackgroundTaskHost, LocationProvider, NotificationSink, PowerMonitor};
use venue_presence::models::{
    AppLifecycle, LocationFix, PresenceState, VenueEventSession, VenuePingRequest,
    VenuePingResponse, VenuePingResult,
};
use venue_presence::services::{
    BackgroundLocationProcessor, LocationSampler, NotificationBridge, PingScheduler, PingTransport,
    SessionStore,
};
use venue_presence::config::Config;
use venue_presence::store::KvStore;
use venue_presence::PresenceAgent;

/// Transport fake that counts calls and replays scripted responses.
/// When the script is empty it answers every venue with an unchanged
/// active state.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<VenuePingResponse>>>,
    pub calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn push_response(&self, response: VenuePingResponse) {
        self.script.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_failure(&self) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(AppError::PingApi("scripted failure".to_string())));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PingTransport for ScriptedTransport {
    async fn send_ping(&self, request: &VenuePingRequest) -> Result<VenuePingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }

        Ok(VenuePingResponse {
            success: true,
            results: request
                .venues
                .iter()
                .map(|v| VenuePingResult {
                    venue_id: v.venue_id.clone(),
                    success: true,
                    current_state: PresenceState::Active,
                    state_changed: false,
                    profile_visible: true,
                    next_ping_interval: 60,
                    user_message: None,
                    distance: Some(25.0),
                    accuracy: Some(10.0),
                })
                .collect(),
        })
    }
}

/// Location provider fake serving a settable fix.
pub struct StaticLocationProvider {
    fix: Mutex<Option<LocationFix>>,
}

impl StaticLocationProvider {
    pub fn new(fix: LocationFix) -> Arc<Self> {
        Arc::new(Self {
            fix: Mutex::new(Some(fix)),
        })
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn current_fix(&self) -> Result<LocationFix> {
        self.fix
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::Location("no fix available".to_string()))
    }
}

pub struct FixedPower(pub f64);

impl PowerMonitor for FixedPower {
    fn battery_level(&self) -> f64 {
        self.0
    }
}

pub struct CountingSink {
    pub delivered: AtomicUsize,
}

impl CountingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            delivered: AtomicUsize::new(0),
        })
    }
}

impl NotificationSink for CountingSink {
    fn deliver(&self, _title: &str, _body: &str) {
        self.delivered.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct RecordingTaskHost {
    pub registered: Mutex<Vec<String>>,
    pub unregistered: Mutex<Vec<String>>,
}

impl RecordingTaskHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            registered: Mutex::new(Vec::new()),
            unregistered: Mutex::new(Vec::new()),
        })
    }
}

impl BackgroundTaskHost for RecordingTaskHost {
    fn register(&self, task_name: &str) -> Result<()> {
        self.registered.lock().unwrap().push(task_name.to_string());
        Ok(())
    }

    fn unregister(&self, task_name: &str) -> Result<()> {
        self.unregistered
            .lock()
            .unwrap()
            .push(task_name.to_string());
        Ok(())
    }
}

/// A fix inside a typical venue geofence.
#[allow(dead_code)]
pub fn mission_fix() -> LocationFix {
    LocationFix {
        latitude: 37.7599,
        longitude: -122.4148,
        accuracy_m: 12.0,
        speed_mps: Some(0.0),
        recorded_at: Utc::now(),
    }
}

#[allow(dead_code)]
pub fn test_session(venue_id: &str) -> VenueEventSession {
    VenueEventSession {
        venue_id: venue_id.to_string(),
        qr_code_id: format!("qr-{}", venue_id),
        event_name: "Hooked Hours".to_string(),
        venue_name: format!("Venue {}", venue_id),
        joined_at: Utc::now(),
        session_nonce: Some("nonce-1".to_string()),
        is_active: true,
    }
}

/// Fully wired test harness over in-memory storage and fakes.
pub struct TestHarness {
    pub agent: Arc<PresenceAgent>,
    pub sessions: SessionStore,
    pub scheduler: PingScheduler,
    pub sampler: LocationSampler,
    pub transport: Arc<ScriptedTransport>,
    pub sink: Arc<CountingSink>,
    pub task_host: Arc<RecordingTaskHost>,
    pub kv: KvStore,
    pub app_state_tx: watch::Sender<AppLifecycle>,
}

#[allow(dead_code)]
pub fn harness() -> TestHarness {
    harness_with_battery(90.0)
}

#[allow(dead_code)]
pub fn harness_with_battery(battery: f64) -> TestHarness {
    let config = Config::test_default();
    let kv = KvStore::new_in_memory();
    let sessions = SessionStore::load(kv.clone()).expect("session store");
    let transport = ScriptedTransport::new();
    let sink = CountingSink::new();
    let task_host = RecordingTaskHost::new();

    let sampler = LocationSampler::new(StaticLocationProvider::new(mission_fix()));
    let notifications = NotificationBridge::new(sink.clone());
    let (app_state_tx, app_state_rx) = watch::channel(AppLifecycle::Foreground);
    let ping_requested = Arc::new(Notify::new());

    let scheduler = PingScheduler::new(
        sessions.clone(),
        sampler.clone(),
        transport.clone(),
        notifications,
        Arc::new(FixedPower(battery)),
        app_state_rx,
        kv.clone(),
        config.session_id,
        ping_requested.clone(),
    );

    let background = BackgroundLocationProcessor::new(sampler.clone(), kv.clone(), ping_requested);

    let agent = Arc::new(PresenceAgent::new(
        sessions.clone(),
        scheduler.clone(),
        background,
        sampler.clone(),
        task_host.clone(),
    ));

    TestHarness {
        agent,
        sessions,
        scheduler,
        sampler,
        transport,
        sink,
        task_host,
        kv,
        app_state_tx,
    }
}
