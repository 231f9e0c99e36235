//! Database layer for researchtrail
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for queries
//! - Append-only tool-usage event log
//! - Derived progress-entry cache (always recomputable from the log)

pub mod repo;
pub mod schema;

pub use repo::{DailyUsage, Database, EventFilter, NewToolUsage};
