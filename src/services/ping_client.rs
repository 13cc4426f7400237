// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the venueLocationPing Cloud Function.
//!
//! Handles:
//! - Batched presence pings for all active venues
//! - Rate limit and auth error classification
//! - A transport trait seam so the scheduler can be tested without a server

use crate::error::AppError;
use crate::models::{VenuePingRequest, VenuePingResponse};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Request timeout for a single ping call. The scheduler's fallback
/// interval is 120s, so a ping must resolve well inside that.
const PING_TIMEOUT_SECS: u64 = 30;

/// Transport seam for the remote ping endpoint.
#[async_trait]
pub trait PingTransport: Send + Sync {
    async fn send_ping(&self, request: &VenuePingRequest) -> Result<VenuePingResponse, AppError>;
}

/// Production transport over HTTPS.
#[derive(Clone)]
pub struct PingClient {
    http: reqwest::Client,
    endpoint_url: String,
}

impl PingClient {
    /// Create a new client for the given venueLocationPing URL.
    pub fn new(endpoint_url: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(PING_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            endpoint_url,
        }
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Ping endpoint rate limit hit (429)");
                return Err(AppError::PingApi("rate_limited".to_string()));
            }

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AppError::PingApi(format!("auth rejected: {}", status)));
            }

            return Err(AppError::PingApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::PingApi(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl PingTransport for PingClient {
    async fn send_ping(&self, request: &VenuePingRequest) -> Result<VenuePingResponse, AppError> {
        let response = self
            .http
            .post(&self.endpoint_url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::PingApi(e.to_string()))?;

        let parsed: VenuePingResponse = self.check_response_json(response).await?;

        if !parsed.success {
            return Err(AppError::PingApi("endpoint reported failure".to_string()));
        }

        Ok(parsed)
    }
}
