//! Agent configuration loaded from environment variables.
//!
//! The agent is configured once at startup; there is no runtime reload.
//! A `.env` file is honored for local development.

use std::env;
use std::path::PathBuf;

/// Agent configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the venueLocationPing Cloud Function
    pub ping_endpoint_url: String,
    /// Directory for the flat key-value state store
    pub state_dir: PathBuf,
    /// Stable session identifier sent with every ping batch
    pub session_id: String,
    /// Path the host writes the latest GPS fix to (JSON `LocationFix`)
    pub location_feed_path: PathBuf,
    /// sysfs battery capacity file (Linux hosts)
    pub battery_capacity_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            ping_endpoint_url: env::var("PING_ENDPOINT_URL")
                .map_err(|_| ConfigError::Missing("PING_ENDPOINT_URL"))?,
            state_dir: env::var("STATE_DIR")
                .unwrap_or_else(|_| ".venue-presence".to_string())
                .into(),
            session_id: env::var("SESSION_ID")
                .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string()),
            location_feed_path: env::var("LOCATION_FEED_PATH")
                .unwrap_or_else(|_| ".venue-presence/location.json".to_string())
                .into(),
            battery_capacity_path: env::var("BATTERY_CAPACITY_PATH")
                .unwrap_or_else(|_| "/sys/class/power_supply/BAT0/capacity".to_string())
                .into(),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            ping_endpoint_url: "http://localhost:9999/venueLocationPing".to_string(),
            state_dir: ".venue-presence-test".into(),
            session_id: "test-session".to_string(),
            location_feed_path: ".venue-presence-test/location.json".into(),
            battery_capacity_path: "/dev/null".into(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("PING_ENDPOINT_URL", "https://example.test/ping");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.ping_endpoint_url, "https://example.test/ping");
        assert_eq!(config.state_dir, PathBuf::from(".venue-presence"));
        // SESSION_ID is optional; a v4 UUID is generated when unset
        assert!(!config.session_id.is_empty());
    }

    #[test]
    fn test_default_avoids_real_endpoints_and_paths() {
        let config = Config::test_default();

        assert!(config.ping_endpoint_url.starts_with("http://localhost"));
        assert_eq!(config.session_id, "test-session");
        assert_ne!(config.state_dir, PathBuf::from(".venue-presence"));
    }
}
