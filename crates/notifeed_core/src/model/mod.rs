//! Notification feed domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by feed business logic.
//!
//! # Invariants
//! - Every notification is owned by exactly one `Recipient`.
//! - Read state and deletion state are independent axes.

pub mod notification;
