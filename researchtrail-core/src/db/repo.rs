//! Database repository layer
//!
//! Provides query and insert operations for projects, sessions, the
//! append-only tool-usage event log, and the derived progress cache.

use crate::error::{Error, Result};
use crate::taxonomy;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Mutex;

/// Result summaries are truncated at write time to keep event rows small.
const RESULT_SUMMARY_MAX_CHARS: usize = 200;

/// Input for appending one usage event.
///
/// Act and category are not part of the input: they are denormalized from
/// the taxonomy lookup when the row is written.
#[derive(Debug, Clone)]
pub struct NewToolUsage {
    pub session_id: String,
    pub tool_name: String,
    pub success: bool,
    pub result_summary: Option<String>,
    pub execution_time_ms: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Filter for querying usage events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restrict to one session
    pub session_id: Option<String>,
    /// Restrict to all sessions of one project
    pub project_id: Option<String>,
    /// Only events recorded at or after this time
    pub since: Option<DateTime<Utc>>,
    /// Maximum number of events (taken from the start of the ordered result)
    pub limit: Option<usize>,
}

/// Tool-usage count for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyUsage {
    pub day: NaiveDate,
    pub count: i64,
}

/// Database handle with a single pooled connection
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Project operations
    // ============================================

    /// Insert or update a project
    pub fn upsert_project(&self, project: &Project) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO projects (id, name, domain, created_at, last_activity_at, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                domain = excluded.domain,
                last_activity_at = excluded.last_activity_at,
                metadata = excluded.metadata
            "#,
            params![
                project.id,
                project.name,
                project.domain,
                project.created_at.to_rfc3339(),
                project.last_activity_at.map(|t| t.to_rfc3339()),
                project.metadata.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Get a project by ID
    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM projects WHERE id = ?", [id], |row| {
            Self::row_to_project(row)
        })
        .optional()
        .map_err(Error::from)
    }

    /// List all projects, most recently active first
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM projects ORDER BY last_activity_at DESC NULLS LAST")?;

        let projects = stmt
            .query_map([], Self::row_to_project)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    /// Bump a project's last-activity timestamp
    pub fn touch_project(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE projects SET last_activity_at = ?1 WHERE id = ?2",
            params![at.to_rfc3339(), id],
        )?;
        Ok(())
    }

    fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
        let created_at_str: String = row.get("created_at")?;
        let last_activity_str: Option<String> = row.get("last_activity_at")?;
        let metadata_str: String = row.get("metadata")?;

        Ok(Project {
            id: row.get("id")?,
            name: row.get("name")?,
            domain: row.get("domain")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            last_activity_at: last_activity_str
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::json!({})),
        })
    }

    // ============================================
    // Session operations
    // ============================================

    /// Insert or update a session
    pub fn upsert_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO sessions (id, project_id, current_research_act, research_focus,
                                  started_at, ended_at, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                current_research_act = excluded.current_research_act,
                research_focus = excluded.research_focus,
                ended_at = excluded.ended_at,
                metadata = excluded.metadata
            "#,
            params![
                session.id,
                session.project_id,
                session.current_research_act.map(|a| a.as_str()),
                session.research_focus,
                session.started_at.to_rfc3339(),
                session.ended_at.map(|t| t.to_rfc3339()),
                session.metadata.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Get a session by ID
    pub fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM sessions WHERE id = ?", [id], |row| {
            Self::row_to_session(row)
        })
        .optional()
        .map_err(Error::from)
    }

    /// List sessions for a project, newest first
    pub fn list_project_sessions(&self, project_id: &str) -> Result<Vec<Session>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM sessions WHERE project_id = ? ORDER BY started_at DESC")?;

        let sessions = stmt
            .query_map([project_id], Self::row_to_session)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Advance the act a session is currently working in
    pub fn update_session_act(&self, session_id: &str, act: ResearchAct) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sessions SET current_research_act = ?1 WHERE id = ?2",
            params![act.as_str(), session_id],
        )?;
        Ok(())
    }

    /// Close a session
    pub fn end_session(&self, session_id: &str, ended_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sessions SET ended_at = ?1 WHERE id = ?2",
            params![ended_at.to_rfc3339(), session_id],
        )?;
        Ok(())
    }

    fn row_to_session(row: &Row) -> rusqlite::Result<Session> {
        let act_str: Option<String> = row.get("current_research_act")?;
        let started_at_str: String = row.get("started_at")?;
        let ended_at_str: Option<String> = row.get("ended_at")?;
        let metadata_str: String = row.get("metadata")?;

        Ok(Session {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            current_research_act: act_str.and_then(|s| s.parse().ok()),
            research_focus: row.get("research_focus")?,
            started_at: DateTime::parse_from_rfc3339(&started_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            ended_at: ended_at_str
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::json!({})),
        })
    }

    // ============================================
    // Usage event operations (append-only)
    // ============================================

    /// Append one usage event to the log.
    ///
    /// Act and category are denormalized from the taxonomy lookup; unknown
    /// tools are stored unclassified. The result summary is truncated to
    /// keep rows small. Each write is a single atomic insert.
    pub fn append_event(&self, usage: &NewToolUsage) -> Result<i64> {
        let context = taxonomy::tool_context(&usage.tool_name);
        let summary = usage.result_summary.as_deref().map(truncate_summary);

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO tool_usage_events (session_id, tool_name, research_act,
                                           research_category, success, result_summary,
                                           execution_time_ms, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                usage.session_id,
                usage.tool_name,
                context.as_ref().map(|c| c.act.as_str()),
                context.as_ref().map(|c| c.category),
                usage.success,
                summary,
                usage.execution_time_ms.max(0),
                usage.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Query usage events, ordered oldest-first by recorded time.
    ///
    /// When a limit is set, the *newest* matching events are returned (still
    /// oldest-first), which is what recent-window consumers need.
    pub fn query_events(&self, filter: &EventFilter) -> Result<Vec<ToolUsageEvent>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from(
            "SELECT e.* FROM tool_usage_events e \
             JOIN sessions s ON s.id = e.session_id WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(session_id) = &filter.session_id {
            sql.push_str(" AND e.session_id = ?");
            params.push(Box::new(session_id.clone()));
        }

        if let Some(project_id) = &filter.project_id {
            sql.push_str(" AND s.project_id = ?");
            params.push(Box::new(project_id.clone()));
        }

        if let Some(since) = &filter.since {
            sql.push_str(" AND e.recorded_at >= ?");
            params.push(Box::new(since.to_rfc3339()));
        }

        if let Some(limit) = filter.limit {
            // Take the newest N, then flip back to oldest-first.
            sql = format!(
                "SELECT * FROM ({} ORDER BY e.recorded_at DESC, e.id DESC LIMIT {}) \
                 ORDER BY recorded_at ASC, id ASC",
                sql, limit
            );
        } else {
            sql.push_str(" ORDER BY e.recorded_at ASC, e.id ASC");
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(params_refs.as_slice(), Self::row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    /// The N most recent events for a project, oldest-first.
    pub fn recent_project_events(&self, project_id: &str, n: usize) -> Result<Vec<ToolUsageEvent>> {
        self.query_events(&EventFilter {
            project_id: Some(project_id.to_string()),
            limit: Some(n),
            ..Default::default()
        })
    }

    /// Distinct tool names used across a project, in first-use order.
    pub fn distinct_project_tools(&self, project_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT e.tool_name, MIN(e.id) as first_id
            FROM tool_usage_events e
            JOIN sessions s ON s.id = e.session_id
            WHERE s.project_id = ?
            GROUP BY e.tool_name
            ORDER BY first_id ASC
            "#,
        )?;

        let tools: Vec<String> = stmt
            .query_map([project_id], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        Ok(tools)
    }

    /// Total usage-event count for a project
    pub fn count_project_events(&self, project_id: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM tool_usage_events e
            JOIN sessions s ON s.id = e.session_id
            WHERE s.project_id = ?
            "#,
            [project_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Usage-event counts per UTC calendar day for a project, oldest-first.
    ///
    /// Feeds both the velocity milestone detector and activity summaries.
    pub fn project_events_per_day(&self, project_id: &str) -> Result<Vec<DailyUsage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT date(e.recorded_at) as day, COUNT(*) as uses
            FROM tool_usage_events e
            JOIN sessions s ON s.id = e.session_id
            WHERE s.project_id = ?
            GROUP BY day
            ORDER BY day ASC
            "#,
        )?;

        let rows = stmt
            .query_map([project_id], |row| {
                let day: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((day, count))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let usage = rows
            .into_iter()
            .filter_map(|(day, count)| {
                NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .ok()
                    .map(|day| DailyUsage { day, count })
            })
            .collect();

        Ok(usage)
    }

    fn row_to_event(row: &Row) -> rusqlite::Result<ToolUsageEvent> {
        let act_str: Option<String> = row.get("research_act")?;
        let recorded_at_str: String = row.get("recorded_at")?;

        Ok(ToolUsageEvent {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            tool_name: row.get("tool_name")?,
            research_act: act_str.and_then(|s| s.parse().ok()),
            research_category: row.get("research_category")?,
            success: row.get("success")?,
            result_summary: row.get("result_summary")?,
            execution_time_ms: row.get("execution_time_ms")?,
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    // ============================================
    // Progress cache operations (derived)
    // ============================================

    /// Replace the derived progress entries for a project in one transaction.
    pub fn replace_progress_entries(
        &self,
        project_id: &str,
        entries: &[ProgressEntry],
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM progress_entries WHERE project_id = ?",
            [project_id],
        )?;

        for entry in entries {
            tx.execute(
                r#"
                INSERT INTO progress_entries (project_id, research_act, research_category,
                                              completion_percentage, tools_used, total_tools,
                                              status, computed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    entry.project_id,
                    entry.research_act.as_str(),
                    entry.research_category,
                    entry.completion_percentage,
                    serde_json::to_string(&entry.tools_used)?,
                    entry.total_tools as i64,
                    entry.status.as_str(),
                    entry.computed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Read the cached progress entries for a project, in taxonomy order.
    pub fn get_progress_entries(&self, project_id: &str) -> Result<Vec<ProgressEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM progress_entries WHERE project_id = ? \
             ORDER BY research_act, research_category",
        )?;

        let entries = stmt
            .query_map([project_id], Self::row_to_progress_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn row_to_progress_entry(row: &Row) -> rusqlite::Result<ProgressEntry> {
        let act_str: String = row.get("research_act")?;
        let status_str: String = row.get("status")?;
        let tools_str: String = row.get("tools_used")?;
        let computed_at_str: String = row.get("computed_at")?;
        let total_tools: i64 = row.get("total_tools")?;

        Ok(ProgressEntry {
            project_id: row.get("project_id")?,
            research_act: act_str.parse().unwrap_or(ResearchAct::Conceptualization),
            research_category: row.get("research_category")?,
            completion_percentage: row.get("completion_percentage")?,
            tools_used: serde_json::from_str(&tools_str).unwrap_or_default(),
            total_tools: total_tools.max(0) as usize,
            status: status_str.parse().unwrap_or(CompletionStatus::NotStarted),
            computed_at: DateTime::parse_from_rfc3339(&computed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

fn truncate_summary(summary: &str) -> String {
    if summary.chars().count() <= RESULT_SUMMARY_MAX_CHARS {
        summary.to_string()
    } else {
        let cut: String = summary.chars().take(RESULT_SUMMARY_MAX_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}
