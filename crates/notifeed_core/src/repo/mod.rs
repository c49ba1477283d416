//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define recipient-scoped data access contracts for the notification store.
//! - Isolate SQLite query details from feed orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `NewNotification::validate()` first.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod notification_repo;
