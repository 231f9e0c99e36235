//! Analytics for researchtrail
//!
//! Pure computations over snapshots of the usage-event log:
//! - [`progress`]: per-category and per-act completion percentages
//! - [`patterns`]: recent-window access-pattern classification
//! - [`recommend`]: ranked next-tool recommendations and gap detection
//! - [`milestones`]: idempotent threshold-crossing detectors
//!
//! Nothing in this module touches the database; callers query the store and
//! pass the results in. That keeps every function deterministic and the
//! milestone detectors idempotent over an unchanged log.

pub mod milestones;
pub mod patterns;
pub mod progress;
pub mod recommend;

pub use milestones::detect_milestones;
pub use patterns::{analyze_recent_tools, UsagePattern};
pub use progress::{
    act_completion, category_completion, progress_report, ActCompletion, CategoryCompletion,
    ProgressReport,
};
pub use recommend::{
    contextual_recommendations, detect_workflow_gaps, recommend_next_tools, AlternativePath,
    ContextualGuidance, Priority, Recommendation, WorkflowGap,
};
