//! Local persistence layer (flat key-value store).

pub mod kv;

pub use kv::KvStore;

/// Persistence keys as constants.
pub mod keys {
    pub const ACTIVE_VENUE_SESSIONS: &str = "active_venue_sessions";
    pub const LAST_VENUE_PING: &str = "last_venue_ping";
    pub const VENUE_PING_STATS: &str = "venue_ping_stats";
    /// Snapshot written by the background location processor
    pub const VENUE_BACKGROUND_STATE: &str = "venue_background_state";
}
