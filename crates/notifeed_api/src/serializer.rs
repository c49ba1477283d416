//! Output shaping for live-list items.

use crate::slug::id_to_slug;
use notifeed_core::Notification;
use serde_json::{json, Value};

/// Converts one notification into the record returned to clients.
///
/// Chosen once when the boundary is built. Closures and plain `fn` items
/// with the matching signature implement it.
pub trait NotificationSerializer: Send + Sync {
    fn serialize(&self, notification: &Notification) -> Value;
}

impl<F> NotificationSerializer for F
where
    F: Fn(&Notification) -> Value + Send + Sync,
{
    fn serialize(&self, notification: &Notification) -> Value {
        self(notification)
    }
}

/// Flat record of every stored field plus the external slug.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNotificationSerializer;

impl NotificationSerializer for DefaultNotificationSerializer {
    fn serialize(&self, notification: &Notification) -> Value {
        let payload = &notification.payload;
        json!({
            "id": notification.id.get(),
            "slug": id_to_slug(notification.id),
            "recipient": notification.recipient.as_str(),
            "actor": payload.actor,
            "verb": payload.verb,
            "target": payload.target,
            "action_object": payload.action_object,
            "description": payload.description,
            "level": payload.level.as_str(),
            "unread": notification.unread,
            "deleted": notification.deleted,
            "timestamp": notification.created_at,
            "data": payload.data,
        })
    }
}
