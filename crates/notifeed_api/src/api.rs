//! Request-level feed API for transport adapters.
//!
//! # Responsibility
//! - Resolve the recipient through the configured `AccessGuard`.
//! - Decode slugs and raw query values before calling into the core.
//! - Shape results into the JSON records clients poll for.
//!
//! # Invariants
//! - No feed call runs for an unauthenticated context.
//! - Malformed slugs, foreign ids and missing ids all yield `ApiError::NotFound`.
//! - Never panics for expected request input.

use crate::guard::AccessGuard;
use crate::serializer::{DefaultNotificationSerializer, NotificationSerializer};
use crate::slug::slug_to_id;
use log::{debug, warn};
use notifeed_core::{
    init_logging as init_logging_inner, FeedConfig, FeedError, FeedPage, FeedResult,
    FeedService, NotificationId, Recipient, SqliteNotificationRepository,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ApiResult<T> = Result<T, ApiError>;

/// Initializes feed logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// Safe to call repeatedly with the same `level + log_dir`. A different
/// level or directory after the first success returns an error.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    init_logging_inner(level, log_dir)
}

/// Boundary error, one variant per client-visible outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Guard found no authenticated recipient.
    Unauthenticated,
    /// Slug did not decode, or no such notification for this recipient.
    NotFound,
    /// Storage failure; message is for logs, not for clients.
    Internal(String),
}

impl ApiError {
    /// HTTP-style status code for transport adapters.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::NotFound => 404,
            Self::Internal(_) => 500,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::NotFound => write!(f, "not found"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for ApiError {}

impl From<FeedError> for ApiError {
    fn from(value: FeedError) -> Self {
        match value {
            FeedError::NotFound(_) => Self::NotFound,
            FeedError::Repo(err) => Self::Internal(err.to_string()),
        }
    }
}

/// `{"detail": ...}` acknowledgement for mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detail {
    pub detail: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreadCount {
    pub unread_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllCount {
    pub all_count: u64,
}

/// Raw live-list query values, exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Requested page size; leniently resolved by the core.
    pub max: Option<String>,
    /// Any non-empty value requests mark-on-fetch.
    pub mark_as_read: Option<String>,
}

impl ListParams {
    /// Collects known keys from decoded query pairs. Later duplicates win.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key {
                "max" => params.max = Some(value.to_string()),
                "mark_as_read" => params.mark_as_read = Some(value.to_string()),
                _ => {}
            }
        }
        params
    }

    pub fn wants_mark_as_read(&self) -> bool {
        self.mark_as_read
            .as_deref()
            .is_some_and(|value| !value.is_empty())
    }
}

/// Feed endpoints bound to one guard, config and serializer.
pub struct FeedApi<G: AccessGuard> {
    guard: G,
    config: FeedConfig,
    serializer: Arc<dyn NotificationSerializer>,
}

impl<G: AccessGuard> FeedApi<G> {
    /// Creates an API using `DefaultNotificationSerializer`.
    pub fn new(guard: G, config: FeedConfig) -> Self {
        Self {
            guard,
            config,
            serializer: Arc::new(DefaultNotificationSerializer),
        }
    }

    /// Replaces the list-item serializer.
    pub fn with_serializer(mut self, serializer: impl NotificationSerializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn mark_all_as_read(&self, conn: &Connection, ctx: &G::Context) -> ApiResult<Detail> {
        self.with_feed_service(conn, ctx, "mark_all_as_read", |feed, recipient| {
            feed.mark_all_as_read(recipient)
        })?;
        Ok(Detail {
            detail: "All marked as read.",
        })
    }

    pub fn mark_as_read(&self, conn: &Connection, ctx: &G::Context, slug: &str) -> ApiResult<Detail> {
        self.with_slug(conn, ctx, slug, "mark_as_read", |feed, id, recipient| {
            feed.mark_as_read(id, recipient)
        })?;
        Ok(Detail {
            detail: "Mark as read.",
        })
    }

    pub fn mark_as_unread(
        &self,
        conn: &Connection,
        ctx: &G::Context,
        slug: &str,
    ) -> ApiResult<Detail> {
        self.with_slug(conn, ctx, slug, "mark_as_unread", |feed, id, recipient| {
            feed.mark_as_unread(id, recipient)
        })?;
        Ok(Detail {
            detail: "Mark as unread.",
        })
    }

    /// Deletes per `FeedConfig::soft_delete`; the reply is the same either way.
    pub fn delete(&self, conn: &Connection, ctx: &G::Context, slug: &str) -> ApiResult<Detail> {
        self.with_slug(conn, ctx, slug, "delete", |feed, id, recipient| {
            feed.delete(id, recipient)
        })?;
        Ok(Detail {
            detail: "Mark as deleted.",
        })
    }

    pub fn live_unread_notification_count(
        &self,
        conn: &Connection,
        ctx: &G::Context,
    ) -> ApiResult<UnreadCount> {
        let unread_count = self.with_feed_service(conn, ctx, "unread_count", |feed, recipient| {
            feed.count_unread(recipient)
        })?;
        Ok(UnreadCount { unread_count })
    }

    pub fn live_all_notification_count(
        &self,
        conn: &Connection,
        ctx: &G::Context,
    ) -> ApiResult<AllCount> {
        let all_count = self.with_feed_service(conn, ctx, "all_count", |feed, recipient| {
            feed.count_all(recipient)
        })?;
        Ok(AllCount { all_count })
    }

    /// Newest unread items; marks them read when `params` asks for it.
    pub fn live_unread_notification_list(
        &self,
        conn: &Connection,
        ctx: &G::Context,
        params: &ListParams,
    ) -> ApiResult<Vec<Value>> {
        let page = self.with_feed_service(conn, ctx, "unread_list", |feed, recipient| {
            feed.list_unread(recipient, params.max.as_deref(), params.wants_mark_as_read())
        })?;
        Ok(self.serialize_page(&page))
    }

    /// Newest active items of any read state.
    pub fn live_all_notification_list(
        &self,
        conn: &Connection,
        ctx: &G::Context,
        params: &ListParams,
    ) -> ApiResult<Vec<Value>> {
        let page = self.with_feed_service(conn, ctx, "all_list", |feed, recipient| {
            feed.list_all(recipient, params.max.as_deref(), params.wants_mark_as_read())
        })?;
        Ok(self.serialize_page(&page))
    }

    fn serialize_page(&self, page: &FeedPage) -> Vec<Value> {
        page.items
            .iter()
            .map(|item| self.serializer.serialize(item))
            .collect()
    }

    fn with_slug<T>(
        &self,
        conn: &Connection,
        ctx: &G::Context,
        slug: &str,
        op: &'static str,
        f: impl FnOnce(
            &FeedService<SqliteNotificationRepository<'_>>,
            NotificationId,
            &Recipient,
        ) -> FeedResult<T>,
    ) -> ApiResult<T> {
        self.with_feed_service(conn, ctx, op, |feed, recipient| {
            let Some(id) = slug_to_id(slug) else {
                debug!("event=api_call module=api status=error op={op} error=invalid_slug");
                // Same outcome as an unknown id.
                return Err(FeedError::NotFound(NotificationId::new(0)));
            };
            f(feed, id, recipient)
        })
    }

    fn with_feed_service<T>(
        &self,
        conn: &Connection,
        ctx: &G::Context,
        op: &'static str,
        f: impl FnOnce(&FeedService<SqliteNotificationRepository<'_>>, &Recipient) -> FeedResult<T>,
    ) -> ApiResult<T> {
        let Some(recipient) = self.guard.resolve_recipient(ctx) else {
            debug!("event=api_call module=api status=rejected op={op} reason=unauthenticated");
            return Err(ApiError::Unauthenticated);
        };

        let repo = SqliteNotificationRepository::try_new(conn).map_err(|err| {
            warn!("event=api_call module=api status=error op={op} error={err}");
            ApiError::Internal(format!("feed repo init failed: {err}"))
        })?;
        let feed = FeedService::new(repo, self.config);

        f(&feed, &recipient).map_err(|err| {
            let api_err = ApiError::from(err);
            if let ApiError::Internal(message) = &api_err {
                warn!("event=api_call module=api status=error op={op} error={message}");
            }
            api_err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{init_logging, ApiError, ListParams};
    use notifeed_core::{FeedError, NotificationId, RepoError};

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info", "").unwrap_err();
        assert!(error.contains("log_dir"));
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose", "/tmp/notifeed-logs").unwrap_err();
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn init_logging_rejects_relative_log_dir() {
        assert!(init_logging("info", "tmp/logs").is_err());
    }

    #[test]
    fn status_codes_follow_http_conventions() {
        assert_eq!(ApiError::Unauthenticated.status_code(), 401);
        assert_eq!(ApiError::NotFound.status_code(), 404);
        assert_eq!(ApiError::Internal("x".to_string()).status_code(), 500);
    }

    #[test]
    fn feed_errors_map_to_boundary_outcomes() {
        let not_found = ApiError::from(FeedError::NotFound(NotificationId::new(4)));
        assert_eq!(not_found, ApiError::NotFound);

        let missing_table = ApiError::from(FeedError::Repo(RepoError::MissingRequiredTable(
            "notifications",
        )));
        assert_eq!(missing_table.status_code(), 500);
    }

    #[test]
    fn list_params_take_last_value_and_require_non_empty_flag() {
        let params = ListParams::from_pairs([("max", "3"), ("other", "x"), ("max", "7")]);
        assert_eq!(params.max.as_deref(), Some("7"));
        assert!(!params.wants_mark_as_read());

        let empty_flag = ListParams::from_pairs([("mark_as_read", "")]);
        assert!(!empty_flag.wants_mark_as_read());

        let flag = ListParams::from_pairs([("mark_as_read", "true")]);
        assert!(flag.wants_mark_as_read());
    }
}
