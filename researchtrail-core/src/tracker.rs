//! High-level facade tying the event store to the analytics passes.
//!
//! [`UsageTracker`] is what callers hold: it appends usage events, refreshes
//! the derived progress cache after every write, and serves progress,
//! guidance, and milestone queries from one place.

use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::analytics::{
    contextual_recommendations, detect_milestones, progress_report, ContextualGuidance,
    ProgressReport,
};
use crate::config::AnalyticsConfig;
use crate::db::{DailyUsage, Database, NewToolUsage};
use crate::error::{Error, Result};
use crate::taxonomy;
use crate::types::{Milestone, Project, ProgressEntry, Session};

/// Outcome of recording one tool invocation.
#[derive(Debug)]
pub struct RecordedUsage {
    /// Row id of the appended event
    pub event_id: i64,
    /// Progress snapshot after the write
    pub progress: ProgressReport,
    /// Milestones detected on the updated history
    pub milestones: Vec<Milestone>,
}

pub struct UsageTracker {
    db: Database,
    config: AnalyticsConfig,
}

impl UsageTracker {
    /// Wrap an already-migrated database.
    pub fn new(db: Database, config: AnalyticsConfig) -> Self {
        Self { db, config }
    }

    /// Open (or create) a database file and run migrations.
    pub fn open(path: &PathBuf, config: AnalyticsConfig) -> Result<Self> {
        let db = Database::open(path)?;
        db.migrate()?;
        Ok(Self::new(db, config))
    }

    /// In-memory tracker for tests.
    pub fn open_in_memory(config: AnalyticsConfig) -> Result<Self> {
        let db = Database::open_in_memory()?;
        db.migrate()?;
        Ok(Self::new(db, config))
    }

    /// Direct access to the underlying store.
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ============================================
    // Project and session lifecycle
    // ============================================

    /// Create a new project with a generated id.
    pub fn create_project(&self, name: Option<String>, domain: Option<String>) -> Result<Project> {
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name,
            domain,
            created_at: Utc::now(),
            last_activity_at: None,
            metadata: serde_json::json!({}),
        };
        self.db.upsert_project(&project)?;
        tracing::info!(project_id = %project.id, "created project");
        Ok(project)
    }

    /// Start a new session under an existing project.
    pub fn start_session(&self, project_id: &str, focus: Option<String>) -> Result<Session> {
        if self.db.get_project(project_id)?.is_none() {
            return Err(Error::ProjectNotFound(project_id.to_string()));
        }

        let session = Session {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            current_research_act: None,
            research_focus: focus,
            started_at: Utc::now(),
            ended_at: None,
            metadata: serde_json::json!({}),
        };
        self.db.upsert_session(&session)?;
        tracing::info!(session_id = %session.id, project_id, "started session");
        Ok(session)
    }

    /// Close an active session.
    pub fn end_session(&self, session_id: &str) -> Result<Session> {
        let mut session = self
            .db
            .get_session(session_id)?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        let now = Utc::now();
        self.db.end_session(session_id, now)?;
        session.ended_at = Some(now);
        Ok(session)
    }

    // ============================================
    // Recording and derived state
    // ============================================

    /// Append one usage event and refresh everything derived from it.
    ///
    /// The owning session's current act follows the event's classification,
    /// the project's last-activity timestamp is bumped, the progress cache is
    /// recomputed, and milestone detection runs on the updated history.
    pub fn record_tool_usage(&self, usage: &NewToolUsage) -> Result<RecordedUsage> {
        let session = self
            .db
            .get_session(&usage.session_id)?
            .ok_or_else(|| Error::SessionNotFound(usage.session_id.clone()))?;

        let event_id = self.db.append_event(usage)?;
        tracing::debug!(
            event_id,
            tool = %usage.tool_name,
            session_id = %usage.session_id,
            "recorded tool usage"
        );

        if let Some(context) = taxonomy::tool_context(&usage.tool_name) {
            self.db.update_session_act(&session.id, context.act)?;
        }
        self.db.touch_project(&session.project_id, usage.recorded_at)?;

        let (tools, total, per_day) = self.history(&session.project_id)?;
        let progress = progress_report(tools.iter().map(String::as_str), total);
        self.write_progress_cache(&session.project_id, &progress)?;

        let milestones = detect_milestones(
            tools.iter().map(String::as_str),
            total,
            &per_day,
            &self.config,
        );

        Ok(RecordedUsage {
            event_id,
            progress,
            milestones,
        })
    }

    /// Recompute the progress report for a project from its event log.
    pub fn progress_report(&self, project_id: &str) -> Result<ProgressReport> {
        self.require_project(project_id)?;
        let (tools, total, _) = self.history(project_id)?;
        Ok(progress_report(tools.iter().map(String::as_str), total))
    }

    /// Contextual next-tool guidance for a project.
    ///
    /// When `last_tool_used` is not given, the newest event in the recent
    /// window anchors the context.
    pub fn contextual_guidance(
        &self,
        project_id: &str,
        last_tool_used: Option<&str>,
        depth: Option<usize>,
    ) -> Result<ContextualGuidance> {
        self.require_project(project_id)?;

        let tools = self.db.distinct_project_tools(project_id)?;
        let recent = self
            .db
            .recent_project_events(project_id, self.config.recent_window)?;
        let recent_names: Vec<&str> = recent.iter().map(|e| e.tool_name.as_str()).collect();

        let last = last_tool_used.or_else(|| recent_names.last().copied());
        let depth = depth.unwrap_or(self.config.recommendation_depth);

        Ok(contextual_recommendations(
            tools.iter().map(String::as_str),
            &recent_names,
            last,
            depth,
        ))
    }

    /// Milestones detectable on the project's current history.
    ///
    /// Detectors are pure, so unchanged history yields the same set; callers
    /// that notify should de-duplicate by [`Milestone::id`].
    pub fn milestones(&self, project_id: &str) -> Result<Vec<Milestone>> {
        self.require_project(project_id)?;
        let (tools, total, per_day) = self.history(project_id)?;
        Ok(detect_milestones(
            tools.iter().map(String::as_str),
            total,
            &per_day,
            &self.config,
        ))
    }

    /// Per-day usage counts, oldest first.
    pub fn activity_per_day(&self, project_id: &str) -> Result<Vec<DailyUsage>> {
        self.require_project(project_id)?;
        self.db.project_events_per_day(project_id)
    }

    fn require_project(&self, project_id: &str) -> Result<()> {
        if self.db.get_project(project_id)?.is_none() {
            return Err(Error::ProjectNotFound(project_id.to_string()));
        }
        Ok(())
    }

    fn history(&self, project_id: &str) -> Result<(Vec<String>, i64, Vec<DailyUsage>)> {
        let tools = self.db.distinct_project_tools(project_id)?;
        let total = self.db.count_project_events(project_id)?;
        let per_day = self.db.project_events_per_day(project_id)?;
        Ok((tools, total, per_day))
    }

    fn write_progress_cache(&self, project_id: &str, progress: &ProgressReport) -> Result<()> {
        let computed_at = Utc::now();
        let entries: Vec<ProgressEntry> = progress
            .acts
            .iter()
            .flat_map(|act| act.categories.iter())
            .map(|category| ProgressEntry {
                project_id: project_id.to_string(),
                research_act: category.research_act,
                research_category: category.research_category.clone(),
                completion_percentage: category.completion_percentage,
                tools_used: category.tools_used.clone(),
                total_tools: category.total_tools,
                status: category.status,
                computed_at,
            })
            .collect();
        self.db.replace_progress_entries(project_id, &entries)
    }
}
