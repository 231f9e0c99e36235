//! # researchtrail-core
//!
//! Core library for researchtrail - a research workflow progress tracker.
//!
//! This library provides:
//! - Domain types for projects, sessions, and tool-usage events
//! - A static research taxonomy (acts, categories, tools)
//! - SQLite storage for the append-only usage-event log
//! - Analytics passes: progress, patterns, recommendations, milestones
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Taxonomy:** static classification ground truth, fixed at compile time
//! - **Event log:** immutable tool-usage records in SQLite (source of truth)
//! - **Derived:** progress entries, patterns, recommendations, milestones
//!   (all recomputable from the log; the progress table is only a cache)
//!
//! ## Example
//!
//! ```rust,no_run
//! use researchtrail_core::{AnalyticsConfig, Config, UsageTracker};
//!
//! let config = Config::load().expect("failed to load config");
//! let tracker = UsageTracker::open(&Config::database_path(), config.analytics)
//!     .expect("failed to open database");
//! let report = tracker.progress_report("my-project").expect("query failed");
//! println!("{:.1}% overall", report.overall_percentage);
//! ```

// Re-export commonly used items at the crate root
pub use config::{AnalyticsConfig, Config};
pub use db::{Database, EventFilter, NewToolUsage};
pub use error::{Error, Result};
pub use tracker::{RecordedUsage, UsageTracker};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod taxonomy;
pub mod tracker;
pub mod types;
