//! External slug encoding for notification ids.
//!
//! # Invariants
//! - `slug_to_id(id_to_slug(id)) == Some(id)` for every positive id.
//! - Malformed slugs decode to `None`; callers report that as not-found.

use notifeed_core::NotificationId;
use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed offset applied to canonical ids before exposing them.
pub const SLUG_OFFSET: i64 = 110_909;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid slug regex"));

/// Encodes a canonical id as its external slug.
///
/// Computed in `i128`, so every `i64` id encodes without overflow.
pub fn id_to_slug(id: NotificationId) -> String {
    (i128::from(id.get()) + i128::from(SLUG_OFFSET)).to_string()
}

/// Decodes an external slug back to a canonical id.
///
/// Returns `None` for empty, non-digit, out-of-range, or sub-offset slugs.
pub fn slug_to_id(slug: &str) -> Option<NotificationId> {
    if !SLUG_RE.is_match(slug) {
        return None;
    }

    let raw = slug.parse::<i128>().ok()?;
    let id = i64::try_from(raw - i128::from(SLUG_OFFSET)).ok()?;
    (id >= 1).then(|| NotificationId::new(id))
}
