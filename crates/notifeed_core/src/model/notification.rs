//! Notification domain model.
//!
//! # Responsibility
//! - Define the canonical per-recipient notification record.
//! - Define the producer-side input shape used when a notification is stored.
//!
//! # Invariants
//! - `id` and `recipient` never change after creation.
//! - A freshly stored notification is `unread=true` and `deleted=false`.
//! - `payload` is opaque to the core: stored and returned unmodified.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical notification identifier (SQLite rowid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(i64);

impl NotificationId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated identity a notification is addressed to.
///
/// Core APIs accept this type only; callers obtain it from an access guard
/// after authentication, never from request input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(String);

impl Recipient {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Recipient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Severity hint attached by producers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    #[default]
    Info,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Stable storage/wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Parses a stored level value; unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Opaque data attached to a notification (actor, verb, target, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Who or what triggered the notification.
    pub actor: String,
    /// Short phrase describing the action, e.g. `commented on`.
    pub verb: String,
    pub target: Option<String>,
    pub action_object: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub level: NotificationLevel,
    /// Free-form producer data, kept as JSON.
    pub data: Option<serde_json::Value>,
}

impl NotificationPayload {
    pub fn new(actor: impl Into<String>, verb: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            verb: verb.into(),
            ..Self::default()
        }
    }
}

/// Stored notification as seen by one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: Recipient,
    pub unread: bool,
    /// Soft-delete tombstone. Only ever set when soft delete is enabled.
    pub deleted: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub payload: NotificationPayload,
}

impl Notification {
    /// Returns whether this notification is visible to feed queries.
    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

/// Producer input for storing one notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient: Recipient,
    pub payload: NotificationPayload,
    /// Explicit creation time for imports; store clock is used when `None`.
    pub created_at: Option<i64>,
}

impl NewNotification {
    pub fn new(recipient: Recipient, payload: NotificationPayload) -> Self {
        Self {
            recipient,
            payload,
            created_at: None,
        }
    }

    /// Sets an explicit creation timestamp in epoch milliseconds.
    pub fn created_at(mut self, epoch_ms: i64) -> Self {
        self.created_at = Some(epoch_ms);
        self
    }

    /// Validates producer input before it reaches storage.
    ///
    /// # Errors
    /// - `EmptyRecipient` when recipient identity is blank.
    /// - `EmptyActor` / `EmptyVerb` when required payload fields are blank.
    pub fn validate(&self) -> Result<(), NotificationValidationError> {
        if self.recipient.as_str().trim().is_empty() {
            return Err(NotificationValidationError::EmptyRecipient);
        }
        if self.payload.actor.trim().is_empty() {
            return Err(NotificationValidationError::EmptyActor);
        }
        if self.payload.verb.trim().is_empty() {
            return Err(NotificationValidationError::EmptyVerb);
        }
        Ok(())
    }
}

/// Producer input validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    EmptyRecipient,
    EmptyActor,
    EmptyVerb,
}

impl Display for NotificationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRecipient => write!(f, "notification recipient must not be empty"),
            Self::EmptyActor => write!(f, "notification actor must not be empty"),
            Self::EmptyVerb => write!(f, "notification verb must not be empty"),
        }
    }
}

impl Error for NotificationValidationError {}
