//! Core domain types for researchtrail
//!
//! These types form the canonical data model for research-activity tracking.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Project** | Top-level container a research effort lives in |
//! | **Session** | A period of work inside a Project |
//! | **Research Act** | Top-level phase of the research lifecycle |
//! | **Research Category** | Named subdivision of an act, owning a set of tools |
//! | **Tool Usage Event** | Immutable record of one tool invocation |
//! | **Progress Entry** | Derived completion state for one (act, category) pair |
//! | **Milestone** | A detected threshold crossing in progress or usage |
//!
//! Progress entries are a cache: they are always recomputable from the
//! tool-usage event log and are never treated as a source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Research acts
// ============================================

/// Top-level phases of the research lifecycle, in canonical order.
///
/// The order matters: workflow-gap detection treats an earlier act with no
/// activity as skipped whenever a later act has activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchAct {
    Conceptualization,
    DesignPlanning,
    KnowledgeAcquisition,
    AnalysisSynthesis,
    ValidationRefinement,
    Communication,
}

impl ResearchAct {
    /// All acts in canonical lifecycle order.
    pub const ALL: [ResearchAct; 6] = [
        ResearchAct::Conceptualization,
        ResearchAct::DesignPlanning,
        ResearchAct::KnowledgeAcquisition,
        ResearchAct::AnalysisSynthesis,
        ResearchAct::ValidationRefinement,
        ResearchAct::Communication,
    ];

    /// Position of this act in the canonical order.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|a| a == self).unwrap_or(0)
    }

    /// Returns the identifier used in database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchAct::Conceptualization => "conceptualization",
            ResearchAct::DesignPlanning => "design_planning",
            ResearchAct::KnowledgeAcquisition => "knowledge_acquisition",
            ResearchAct::AnalysisSynthesis => "analysis_synthesis",
            ResearchAct::ValidationRefinement => "validation_refinement",
            ResearchAct::Communication => "communication",
        }
    }

    /// Human-friendly name for reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            ResearchAct::Conceptualization => "Conceptualization",
            ResearchAct::DesignPlanning => "Design & Planning",
            ResearchAct::KnowledgeAcquisition => "Knowledge Acquisition",
            ResearchAct::AnalysisSynthesis => "Analysis & Synthesis",
            ResearchAct::ValidationRefinement => "Validation & Refinement",
            ResearchAct::Communication => "Communication",
        }
    }
}

impl std::fmt::Display for ResearchAct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResearchAct {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conceptualization" => Ok(ResearchAct::Conceptualization),
            "design_planning" => Ok(ResearchAct::DesignPlanning),
            "knowledge_acquisition" => Ok(ResearchAct::KnowledgeAcquisition),
            "analysis_synthesis" => Ok(ResearchAct::AnalysisSynthesis),
            "validation_refinement" => Ok(ResearchAct::ValidationRefinement),
            "communication" => Ok(ResearchAct::Communication),
            _ => Err(format!("unknown research act: {}", s)),
        }
    }
}

// ============================================
// Completion status
// ============================================

/// Completion state of a category or act, derived purely from the percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::NotStarted => "not_started",
            CompletionStatus::InProgress => "in_progress",
            CompletionStatus::Completed => "completed",
        }
    }

    /// Derive status from a completion percentage in [0, 100].
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 100.0 {
            CompletionStatus::Completed
        } else if pct > 0.0 {
            CompletionStatus::InProgress
        } else {
            CompletionStatus::NotStarted
        }
    }
}

impl std::str::FromStr for CompletionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(CompletionStatus::NotStarted),
            "in_progress" => Ok(CompletionStatus::InProgress),
            "completed" => Ok(CompletionStatus::Completed),
            _ => Err(format!("unknown completion status: {}", s)),
        }
    }
}

// ============================================
// Project
// ============================================

/// Top-level container for a research effort.
///
/// `domain` is display-only and plays no part in classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: String,
    /// Human-friendly name (optional)
    pub name: Option<String>,
    /// Research domain, for display only
    pub domain: Option<String>,
    /// When this project was created
    pub created_at: DateTime<Utc>,
    /// Most recent activity timestamp
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Extensible metadata
    pub metadata: serde_json::Value,
}

// ============================================
// Session
// ============================================

/// A period of work inside a project.
///
/// A session accumulates zero or more tool-usage events and remains
/// open-ended (`ended_at` is `None`) while active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session
    pub id: String,
    /// Project this session belongs to
    pub project_id: String,
    /// Act the session is currently working in (advanced as tools are used)
    pub current_research_act: Option<ResearchAct>,
    /// Free-text description of what the session is about
    pub research_focus: Option<String>,
    /// When the session started
    pub started_at: DateTime<Utc>,
    /// When the session ended (None while active)
    pub ended_at: Option<DateTime<Utc>>,
    /// Extensible metadata
    pub metadata: serde_json::Value,
}

impl Session {
    /// Whether this session is still open.
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

// ============================================
// Tool usage events
// ============================================

/// One row per tool invocation. Immutable once written; the store is
/// append-only with no updates or deletes.
///
/// `research_act` and `research_category` are denormalized from the taxonomy
/// lookup at write time. Tools the taxonomy does not know stay unclassified
/// (`None`) and are excluded from progress math, which is a normal condition,
/// not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUsageEvent {
    /// Database ID (auto-incremented)
    pub id: i64,
    /// Session this event belongs to
    pub session_id: String,
    /// Name of the tool that was invoked
    pub tool_name: String,
    /// Act the tool belongs to, if classified
    pub research_act: Option<ResearchAct>,
    /// Category key the tool belongs to, if classified
    pub research_category: Option<String>,
    /// Whether the invocation succeeded
    pub success: bool,
    /// Truncated summary of the tool result
    pub result_summary: Option<String>,
    /// Execution time in milliseconds (>= 0)
    pub execution_time_ms: i64,
    /// When the invocation happened
    pub recorded_at: DateTime<Utc>,
}

// ============================================
// Progress entries (derived)
// ============================================

/// Derived completion state for one (act, category) pair within a project.
///
/// Invariant: `completion_percentage` equals 100 times the share of the
/// category's tool set covered by distinct tools used, rounded to one
/// decimal; `status` is a pure function of the percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Project this entry belongs to
    pub project_id: String,
    /// Act this entry covers
    pub research_act: ResearchAct,
    /// Category key this entry covers
    pub research_category: String,
    /// Completion percentage in [0, 100], one decimal place
    pub completion_percentage: f64,
    /// Distinct category tools already used, in taxonomy order
    pub tools_used: Vec<String>,
    /// Number of tools the category defines
    pub total_tools: usize,
    /// Derived status
    pub status: CompletionStatus,
    /// When this entry was computed
    pub computed_at: DateTime<Utc>,
}

// ============================================
// Milestones
// ============================================

/// A detected threshold crossing in progress, usage count, or velocity.
///
/// `id` is the milestone's identity (act name, usage bucket, ...) and is
/// stable for a given log state: running a detector twice on unchanged data
/// yields the same ids. De-duplicating already-celebrated milestones across
/// calls is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Stable identity, e.g. "act:conceptualization" or "usage:25"
    pub id: String,
    /// Short celebratory title
    pub title: String,
    /// Emoji icon for display
    pub icon: String,
    /// Why this milestone matters
    pub significance: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_act_order_and_roundtrip() {
        for (i, act) in ResearchAct::ALL.iter().enumerate() {
            assert_eq!(act.index(), i);
            let parsed: ResearchAct = act.as_str().parse().unwrap();
            assert_eq!(parsed, *act);
        }
        assert!(ResearchAct::Conceptualization.index() < ResearchAct::Communication.index());
    }

    #[test]
    fn test_status_from_percentage() {
        assert_eq!(
            CompletionStatus::from_percentage(0.0),
            CompletionStatus::NotStarted
        );
        assert_eq!(
            CompletionStatus::from_percentage(33.3),
            CompletionStatus::InProgress
        );
        assert_eq!(
            CompletionStatus::from_percentage(100.0),
            CompletionStatus::Completed
        );
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            CompletionStatus::NotStarted,
            CompletionStatus::InProgress,
            CompletionStatus::Completed,
        ] {
            let parsed: CompletionStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
