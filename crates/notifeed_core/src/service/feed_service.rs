//! Feed use-case service: live queries and read/delete transitions.
//!
//! # Responsibility
//! - Resolve live-list limits leniently against `FeedConfig::num_to_fetch`.
//! - Route delete to tombstone or hard removal based on `FeedConfig`.
//! - Translate store misses into the single `FeedError::NotFound` outcome.
//!
//! # Invariants
//! - Every operation is scoped to the authenticated `Recipient` it receives.
//! - Bad limit input never errors; it falls back to the configured default.
//! - Listing mutates read state only when the caller opts in.

use crate::config::{FeedConfig, MAX_FETCH_LIMIT, MIN_FETCH_LIMIT};
use crate::model::notification::{Notification, NotificationId, Recipient};
use crate::repo::notification_repo::{
    FeedFilter, FeedQuery, NotificationRepository, RepoError,
};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FeedResult<T> = Result<T, FeedError>;

/// Service error for feed use-cases.
#[derive(Debug)]
pub enum FeedError {
    /// Id is absent or owned by another recipient; the two are not distinguished.
    NotFound(NotificationId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "notification not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for FeedError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// One live-list response.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    /// Newest first, in the state observed before any mark-on-fetch.
    pub items: Vec<Notification>,
    /// Effective limit after leniency resolution.
    pub applied_limit: u32,
}

/// Feed facade over a notification repository.
pub struct FeedService<R: NotificationRepository> {
    repo: R,
    config: FeedConfig,
}

impl<R: NotificationRepository> FeedService<R> {
    /// Creates a service with fixed configuration.
    pub fn new(repo: R, config: FeedConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Gets one notification owned by `recipient`.
    ///
    /// Soft-deleted records are returned with `deleted = true`; only absent
    /// or foreign ids are `NotFound`.
    pub fn get(&self, id: NotificationId, recipient: &Recipient) -> FeedResult<Notification> {
        Ok(self.repo.get(id, recipient, true)?)
    }

    /// Marks one notification read. Re-marking is a successful no-op.
    pub fn mark_as_read(&self, id: NotificationId, recipient: &Recipient) -> FeedResult<()> {
        self.set_unread(id, recipient, false, "mark_as_read")
    }

    /// Marks one notification unread. Re-marking is a successful no-op.
    pub fn mark_as_unread(&self, id: NotificationId, recipient: &Recipient) -> FeedResult<()> {
        self.set_unread(id, recipient, true, "mark_as_unread")
    }

    /// Marks every active notification read in one write.
    ///
    /// Returns how many notifications changed; zero is still success.
    pub fn mark_all_as_read(&self, recipient: &Recipient) -> FeedResult<usize> {
        let changed = self.repo.set_all_unread(recipient, false)?;
        info!("event=feed_mark_all module=service status=ok op=mark_all_as_read changed={changed}");
        Ok(changed)
    }

    /// Marks every active notification unread in one write.
    pub fn mark_all_as_unread(&self, recipient: &Recipient) -> FeedResult<usize> {
        let changed = self.repo.set_all_unread(recipient, true)?;
        info!(
            "event=feed_mark_all module=service status=ok op=mark_all_as_unread changed={changed}"
        );
        Ok(changed)
    }

    /// Deletes one notification: tombstone when soft delete is on, else removal.
    ///
    /// Repeating a soft delete succeeds.
    pub fn delete(&self, id: NotificationId, recipient: &Recipient) -> FeedResult<()> {
        let (mode, result) = if self.config.soft_delete {
            ("soft", self.repo.soft_delete(id, recipient))
        } else {
            ("hard", self.repo.hard_delete(id, recipient))
        };

        match result {
            Ok(()) => {
                info!("event=feed_delete module=service status=ok mode={mode} id={id}");
                Ok(())
            }
            Err(err) => {
                debug!("event=feed_delete module=service status=error mode={mode} id={id} error={err}");
                Err(err.into())
            }
        }
    }

    pub fn count_unread(&self, recipient: &Recipient) -> FeedResult<u64> {
        Ok(self.repo.count(recipient, FeedFilter::Unread)?)
    }

    pub fn count_read(&self, recipient: &Recipient) -> FeedResult<u64> {
        Ok(self.repo.count(recipient, FeedFilter::Read)?)
    }

    pub fn count_all(&self, recipient: &Recipient) -> FeedResult<u64> {
        Ok(self.repo.count(recipient, FeedFilter::All)?)
    }

    /// Lists unread notifications, optionally marking the returned page read.
    pub fn list_unread(
        &self,
        recipient: &Recipient,
        limit: Option<&str>,
        mark_as_read: bool,
    ) -> FeedResult<FeedPage> {
        self.list(recipient, FeedFilter::Unread, limit, mark_as_read)
    }

    /// Lists all active notifications, optionally marking the unread ones read.
    pub fn list_all(
        &self,
        recipient: &Recipient,
        limit: Option<&str>,
        mark_as_read: bool,
    ) -> FeedResult<FeedPage> {
        self.list(recipient, FeedFilter::All, limit, mark_as_read)
    }

    /// Lists already-read notifications.
    pub fn list_read(&self, recipient: &Recipient, limit: Option<&str>) -> FeedResult<FeedPage> {
        self.list(recipient, FeedFilter::Read, limit, false)
    }

    fn list(
        &self,
        recipient: &Recipient,
        filter: FeedFilter,
        limit: Option<&str>,
        mark_as_read: bool,
    ) -> FeedResult<FeedPage> {
        let applied_limit = resolve_fetch_limit(limit, self.config.num_to_fetch);
        let query = FeedQuery {
            filter,
            limit: applied_limit,
            mark_as_read,
        };
        let items = self.repo.list_feed(recipient, &query)?;
        debug!(
            "event=feed_list module=service status=ok filter={} limit={} mark_as_read={} returned={}",
            filter.as_str(),
            applied_limit,
            mark_as_read,
            items.len()
        );

        Ok(FeedPage {
            items,
            applied_limit,
        })
    }

    fn set_unread(
        &self,
        id: NotificationId,
        recipient: &Recipient,
        unread: bool,
        op: &'static str,
    ) -> FeedResult<()> {
        match self.repo.set_unread(id, recipient, unread) {
            Ok(()) => {
                debug!("event=feed_mark module=service status=ok op={op} id={id}");
                Ok(())
            }
            Err(err) => {
                debug!("event=feed_mark module=service status=error op={op} id={id} error={err}");
                Err(err.into())
            }
        }
    }
}

/// Resolves a caller-supplied live-list limit.
///
/// Rules:
/// - absent -> `default`
/// - not an integer (after trimming whitespace) -> `default`
/// - outside `1..=100` -> `default`
/// - otherwise the parsed value
///
/// Integers take an optional sign and single `_` separators between digit
/// groups, so `"1_0"` is 10.
pub fn resolve_fetch_limit(requested: Option<&str>, default: u32) -> u32 {
    let Some(raw) = requested else {
        return default;
    };

    match parse_limit(raw) {
        Some(value) if (i64::from(MIN_FETCH_LIMIT)..=i64::from(MAX_FETCH_LIMIT)).contains(&value) => {
            u32::try_from(value).unwrap_or(default)
        }
        _ => {
            debug!("event=fetch_limit module=service status=fallback default={default}");
            default
        }
    }
}

fn parse_limit(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (negative, body) = if let Some(rest) = trimmed.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = trimmed.strip_prefix('+') {
        (false, rest)
    } else {
        (false, trimmed)
    };

    let mut digits = String::with_capacity(body.len());
    for group in body.split('_') {
        if group.is_empty() || !group.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }

    let value = digits.parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::resolve_fetch_limit;

    #[test]
    fn absent_limit_uses_default() {
        assert_eq!(resolve_fetch_limit(None, 10), 10);
    }

    #[test]
    fn unparseable_limit_uses_default() {
        assert_eq!(resolve_fetch_limit(Some("abc"), 10), 10);
        assert_eq!(resolve_fetch_limit(Some(""), 10), 10);
        assert_eq!(resolve_fetch_limit(Some("5.0"), 10), 10);
        assert_eq!(resolve_fetch_limit(Some("99999999999999999999999"), 10), 10);
    }

    #[test]
    fn out_of_range_limit_uses_default() {
        assert_eq!(resolve_fetch_limit(Some("0"), 7), 7);
        assert_eq!(resolve_fetch_limit(Some("101"), 7), 7);
        assert_eq!(resolve_fetch_limit(Some("-3"), 7), 7);
    }

    #[test]
    fn boundary_limits_are_honored() {
        assert_eq!(resolve_fetch_limit(Some("1"), 10), 1);
        assert_eq!(resolve_fetch_limit(Some("100"), 10), 100);
        assert_eq!(resolve_fetch_limit(Some(" 42 "), 10), 42);
        assert_eq!(resolve_fetch_limit(Some("+5"), 10), 5);
    }

    #[test]
    fn underscore_grouped_limit_is_accepted() {
        assert_eq!(resolve_fetch_limit(Some("1_0"), 4), 10);
        assert_eq!(resolve_fetch_limit(Some(" 1_0_0 "), 4), 100);
        assert_eq!(resolve_fetch_limit(Some("+2_5"), 4), 25);
    }

    #[test]
    fn misplaced_underscores_use_default() {
        for raw in ["_10", "10_", "1__0", "_", "-_5", "1_0.0"] {
            assert_eq!(resolve_fetch_limit(Some(raw), 4), 4, "limit `{raw}`");
        }
    }
}
