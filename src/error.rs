// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! Most failures in the presence subsystem are caught and logged at the
//! scheduler boundary rather than propagated; these types cover the seams
//! where errors do flow (session creation, persistence, the remote ping
//! transport).

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Ping endpoint error: {0}")]
    PingApi(String),

    #[error("Local store error: {0}")]
    Storage(String),

    #[error("Location provider error: {0}")]
    Location(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error came from the remote ping endpoint. These widen
    /// the ping interval instead of surfacing to the caller.
    pub fn is_ping_api_error(&self) -> bool {
        matches!(self, AppError::PingApi(_))
    }
}

/// Result type alias for services
pub type Result<T> = std::result::Result<T, AppError>;
