//! Request boundary for the notifeed feed.
//! Adapts authenticated requests, slugs and raw query values to `notifeed_core`.

pub mod api;
pub mod guard;
pub mod serializer;
pub mod slug;

pub use api::{
    init_logging, AllCount, ApiError, ApiResult, Detail, FeedApi, ListParams, UnreadCount,
};
pub use guard::{AccessGuard, RequestContext, SessionGuard};
pub use serializer::{DefaultNotificationSerializer, NotificationSerializer};
pub use slug::{id_to_slug, slug_to_id, SLUG_OFFSET};
