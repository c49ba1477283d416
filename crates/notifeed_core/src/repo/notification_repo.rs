//! Notification store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide recipient-scoped point lookups, counts and feed pages.
//! - Apply read-state and deletion transitions as single SQL writes.
//!
//! # Invariants
//! - Every statement binds `recipient`; a row owned by someone else behaves
//!   exactly like a missing row (`NotFound`).
//! - Feed queries and counts never see `deleted = 1` rows; point
//!   transitions still reach them.
//! - Feed order is `created_at DESC, id DESC`.
//! - Mark-on-fetch selects and updates inside one `BEGIN IMMEDIATE`
//!   transaction, so the returned page and persisted state agree.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::notification::{
    NewNotification, Notification, NotificationId, NotificationLevel, NotificationPayload,
    NotificationValidationError, Recipient,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    recipient,
    unread,
    deleted,
    created_at,
    actor,
    verb,
    target,
    action_object,
    description,
    level,
    data
FROM notifications";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "recipient",
    "unread",
    "deleted",
    "created_at",
    "actor",
    "verb",
    "target",
    "action_object",
    "description",
    "level",
    "data",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for notification persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NotificationValidationError),
    Db(DbError),
    /// Absent, or owned by another recipient. Deliberately one variant.
    NotFound(NotificationId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "notification not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted notification data: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "notification repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "notification repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "notification repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NotificationValidationError> for RepoError {
    fn from(value: NotificationValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read-state slice of a recipient feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    Unread,
    Read,
    All,
}

impl FeedFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
            Self::All => "all",
        }
    }

    fn sql_clause(self) -> &'static str {
        match self {
            Self::Unread => " AND unread = 1",
            Self::Read => " AND unread = 0",
            Self::All => "",
        }
    }
}

/// Page request for one recipient feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    pub filter: FeedFilter,
    /// Already-resolved page size.
    pub limit: u32,
    /// Flip every unread row of the returned page to read, atomically.
    pub mark_as_read: bool,
}

/// Repository interface for the notification store.
pub trait NotificationRepository {
    /// Stores a producer notification and returns the persisted record.
    fn insert(&self, notification: &NewNotification) -> RepoResult<Notification>;
    /// Loads one notification owned by `recipient`.
    ///
    /// `include_deleted` exposes soft-deleted tombstones to store-level callers.
    fn get(
        &self,
        id: NotificationId,
        recipient: &Recipient,
        include_deleted: bool,
    ) -> RepoResult<Notification>;
    /// Counts active notifications matching `filter`.
    fn count(&self, recipient: &Recipient, filter: FeedFilter) -> RepoResult<u64>;
    /// Returns one feed page, newest first; reports pre-transition state.
    fn list_feed(&self, recipient: &Recipient, query: &FeedQuery)
        -> RepoResult<Vec<Notification>>;
    /// Sets read state of one owned notification, tombstoned or not. Idempotent.
    fn set_unread(&self, id: NotificationId, recipient: &Recipient, unread: bool)
        -> RepoResult<()>;
    /// Sets read state of every active notification in one statement.
    ///
    /// Returns the number of rows whose state changed.
    fn set_all_unread(&self, recipient: &Recipient, unread: bool) -> RepoResult<usize>;
    /// Tombstones one owned notification. Re-tombstoning succeeds.
    fn soft_delete(&self, id: NotificationId, recipient: &Recipient) -> RepoResult<()>;
    /// Removes one owned notification permanently, tombstone included.
    fn hard_delete(&self, id: NotificationId, recipient: &Recipient) -> RepoResult<()>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    /// Creates a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn insert(&self, notification: &NewNotification) -> RepoResult<Notification> {
        notification.validate()?;

        let payload = &notification.payload;
        let data = payload
            .data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| RepoError::InvalidData(format!("unserializable data: {err}")))?;

        self.conn.execute(
            "INSERT INTO notifications (
                recipient,
                created_at,
                actor,
                verb,
                target,
                action_object,
                description,
                level,
                data
            ) VALUES (
                ?1,
                COALESCE(?2, strftime('%s', 'now') * 1000),
                ?3, ?4, ?5, ?6, ?7, ?8, ?9
            );",
            params![
                notification.recipient.as_str(),
                notification.created_at,
                payload.actor.as_str(),
                payload.verb.as_str(),
                payload.target.as_deref(),
                payload.action_object.as_deref(),
                payload.description.as_deref(),
                payload.level.as_str(),
                data,
            ],
        )?;

        let id = NotificationId::new(self.conn.last_insert_rowid());
        self.get(id, &notification.recipient, true)
    }

    fn get(
        &self,
        id: NotificationId,
        recipient: &Recipient,
        include_deleted: bool,
    ) -> RepoResult<Notification> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE id = ?1
               AND recipient = ?2
               AND (?3 = 1 OR deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![
            id.get(),
            recipient.as_str(),
            bool_to_int(include_deleted)
        ])?;
        match rows.next()? {
            Some(row) => parse_notification_row(row),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn count(&self, recipient: &Recipient, filter: FeedFilter) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*)
                 FROM notifications
                 WHERE recipient = ?1
                   AND deleted = 0{};",
                filter.sql_clause()
            ),
            [recipient.as_str()],
            |row| row.get(0),
        )?;

        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn list_feed(
        &self,
        recipient: &Recipient,
        query: &FeedQuery,
    ) -> RepoResult<Vec<Notification>> {
        if !query.mark_as_read {
            return select_feed_page(self.conn, recipient, query);
        }

        // Take the write lock before reading so no concurrent mark can slip
        // between the page read and the bulk flip.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let page = select_feed_page(&tx, recipient, query)?;
        mark_page_read(&tx, recipient, &page)?;
        tx.commit()?;

        Ok(page)
    }

    fn set_unread(
        &self,
        id: NotificationId,
        recipient: &Recipient,
        unread: bool,
    ) -> RepoResult<()> {
        // SQLite counts matched rows, so an already-read row still reports 1.
        let changed = self.conn.execute(
            "UPDATE notifications
             SET unread = ?3
             WHERE id = ?1
               AND recipient = ?2;",
            params![id.get(), recipient.as_str(), bool_to_int(unread)],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn set_all_unread(&self, recipient: &Recipient, unread: bool) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notifications
             SET unread = ?2
             WHERE recipient = ?1
               AND deleted = 0
               AND unread <> ?2;",
            params![recipient.as_str(), bool_to_int(unread)],
        )?;

        Ok(changed)
    }

    fn soft_delete(&self, id: NotificationId, recipient: &Recipient) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications
             SET deleted = 1
             WHERE id = ?1
               AND recipient = ?2;",
            params![id.get(), recipient.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn hard_delete(&self, id: NotificationId, recipient: &Recipient) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notifications
             WHERE id = ?1
               AND recipient = ?2;",
            params![id.get(), recipient.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn select_feed_page(
    conn: &Connection,
    recipient: &Recipient,
    query: &FeedQuery,
) -> RepoResult<Vec<Notification>> {
    let mut stmt = conn.prepare(&format!(
        "{NOTIFICATION_SELECT_SQL}
         WHERE recipient = ?1
           AND deleted = 0{}
         ORDER BY created_at DESC, id DESC
         LIMIT ?2;",
        query.filter.sql_clause()
    ))?;

    let mut rows = stmt.query(params![recipient.as_str(), i64::from(query.limit)])?;
    let mut page = Vec::new();
    while let Some(row) = rows.next()? {
        page.push(parse_notification_row(row)?);
    }

    Ok(page)
}

fn mark_page_read(
    conn: &Connection,
    recipient: &Recipient,
    page: &[Notification],
) -> RepoResult<usize> {
    let unread_ids: Vec<i64> = page
        .iter()
        .filter(|notification| notification.unread)
        .map(|notification| notification.id.get())
        .collect();
    if unread_ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; unread_ids.len()].join(", ");
    let mut bind_values = Vec::with_capacity(unread_ids.len() + 1);
    bind_values.push(Value::Text(recipient.as_str().to_string()));
    bind_values.extend(unread_ids.into_iter().map(Value::Integer));

    let changed = conn.execute(
        &format!(
            "UPDATE notifications
             SET unread = 0
             WHERE recipient = ?
               AND deleted = 0
               AND id IN ({placeholders});"
        ),
        params_from_iter(bind_values),
    )?;

    Ok(changed)
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let level_text: String = row.get("level")?;
    let level = NotificationLevel::parse(&level_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid level `{level_text}` in notifications.level"
        ))
    })?;

    let data = match row.get::<_, Option<String>>("data")? {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|err| {
            RepoError::InvalidData(format!("invalid json in notifications.data: {err}"))
        })?),
        None => None,
    };

    Ok(Notification {
        id: NotificationId::new(row.get("id")?),
        recipient: Recipient::new(row.get::<_, String>("recipient")?),
        unread: parse_flag(row, "unread")?,
        deleted: parse_flag(row, "deleted")?,
        created_at: row.get("created_at")?,
        payload: NotificationPayload {
            actor: row.get("actor")?,
            verb: row.get("verb")?,
            target: row.get("target")?,
            action_object: row.get("action_object")?,
            description: row.get("description")?,
            level,
            data,
        },
    })
}

fn parse_flag(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` in notifications.{column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "notifications")? {
        return Err(RepoError::MissingRequiredTable("notifications"));
    }

    for &column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "notifications", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notifications",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{bool_to_int, FeedFilter};

    #[test]
    fn filter_clauses_cover_read_axis() {
        assert_eq!(FeedFilter::Unread.sql_clause(), " AND unread = 1");
        assert_eq!(FeedFilter::Read.sql_clause(), " AND unread = 0");
        assert!(FeedFilter::All.sql_clause().is_empty());
    }

    #[test]
    fn bool_to_int_maps_sqlite_flags() {
        assert_eq!(bool_to_int(true), 1);
        assert_eq!(bool_to_int(false), 0);
    }
}
