//! Core domain logic for the notifeed notification feed.
//! This crate owns the read/delete state machine and the live feed queries.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, FeedConfig, DEFAULT_NUM_TO_FETCH, MAX_FETCH_LIMIT, MIN_FETCH_LIMIT};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::notification::{
    NewNotification, Notification, NotificationId, NotificationLevel, NotificationPayload,
    NotificationValidationError, Recipient,
};
pub use repo::notification_repo::{
    FeedFilter, FeedQuery, NotificationRepository, RepoError, RepoResult,
    SqliteNotificationRepository,
};
pub use service::feed_service::{resolve_fetch_limit, FeedError, FeedPage, FeedResult, FeedService};

/// Minimal health-check API for linkage smoke checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
