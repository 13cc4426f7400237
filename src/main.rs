// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Venue-Presence Agent
//!
//! Headless presence agent: restores persisted venue sessions, runs the
//! adaptive ping scheduler against the venueLocationPing endpoint, and
//! emits presence notifications through the tracing sink. An initial
//! check-in can be supplied via VENUE_ID / VENUE_NAME / QR_CODE_ID for
//! single-venue deployments (kiosk hosts, integration environments).

use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use venue_presence::{
    config::Config,
    host::{
        FileFeedLocationProvider, NoopTaskHost, SysfsPowerMonitor, TracingNotificationSink,
    },
    models::{AppLifecycle, VenueEventSession},
    services::{
        BackgroundLocationProcessor, LocationSampler, NotificationBridge, PingClient,
        PingScheduler, SessionStore,
    },
    store::KvStore,
    PresenceAgent,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        endpoint = %config.ping_endpoint_url,
        session_id = %config.session_id,
        "Starting venue-presence agent"
    );

    // Open the local state store
    let kv = KvStore::open(&config.state_dir).expect("Failed to open state store");

    // Restore any persisted venue sessions
    let sessions = SessionStore::load(kv.clone()).expect("Failed to load session store");

    // Host collaborators for a headless Linux deployment
    let location_provider = Arc::new(FileFeedLocationProvider::new(
        config.location_feed_path.clone(),
    ));
    let power = Arc::new(SysfsPowerMonitor::new(config.battery_capacity_path.clone()));
    let sink = Arc::new(TracingNotificationSink);
    let task_host = Arc::new(NoopTaskHost);

    let sampler = LocationSampler::new(location_provider);
    let notifications = NotificationBridge::new(sink);
    let transport = Arc::new(PingClient::new(config.ping_endpoint_url.clone()));

    // A headless agent has no UI, so it is always "foreground"
    let (_app_state_tx, app_state_rx) = watch::channel(AppLifecycle::Foreground);
    let ping_requested = Arc::new(Notify::new());

    let scheduler = PingScheduler::new(
        sessions.clone(),
        sampler.clone(),
        transport,
        notifications,
        power,
        app_state_rx,
        kv.clone(),
        config.session_id.clone(),
        ping_requested.clone(),
    );

    let background = BackgroundLocationProcessor::new(sampler.clone(), kv, ping_requested);

    let agent = Arc::new(PresenceAgent::new(
        sessions,
        scheduler,
        background,
        sampler,
        task_host,
    ));

    // Optional initial check-in from the environment
    if let Ok(venue_id) = std::env::var("VENUE_ID") {
        let session = VenueEventSession {
            venue_id: venue_id.clone(),
            qr_code_id: std::env::var("QR_CODE_ID").unwrap_or_default(),
            event_name: std::env::var("EVENT_NAME").unwrap_or_else(|_| "Hooked Hours".to_string()),
            venue_name: std::env::var("VENUE_NAME").unwrap_or_else(|_| venue_id.clone()),
            joined_at: chrono::Utc::now(),
            session_nonce: None,
            is_active: true,
        };
        agent.check_in(session).await?;
    }

    // Sessions restored from disk also need a running scheduler
    agent.resume_if_needed().await;

    tracing::info!("Agent running, Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down");
    agent.shutdown().await;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("venue_presence=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
