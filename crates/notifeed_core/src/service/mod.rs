//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into feed-level APIs.
//! - Keep boundary layers decoupled from storage details.

pub mod feed_service;
