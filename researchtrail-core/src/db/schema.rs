//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    -- ============================================
    -- Canonical (append-only log + owners)
    -- ============================================

    CREATE TABLE IF NOT EXISTS projects (
        id               TEXT PRIMARY KEY,
        name             TEXT,
        domain           TEXT,               -- display only, never classification
        created_at       DATETIME NOT NULL,
        last_activity_at DATETIME,
        metadata         JSON
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id                   TEXT PRIMARY KEY,
        project_id           TEXT NOT NULL REFERENCES projects(id),
        current_research_act TEXT,
        research_focus       TEXT,
        started_at           DATETIME NOT NULL,
        ended_at             DATETIME,
        metadata             JSON
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_project ON sessions(project_id);

    -- Append-only: rows are never updated or deleted.
    CREATE TABLE IF NOT EXISTS tool_usage_events (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id        TEXT NOT NULL REFERENCES sessions(id),
        tool_name         TEXT NOT NULL,
        research_act      TEXT,              -- denormalized from taxonomy at write time
        research_category TEXT,
        success           INTEGER NOT NULL,
        result_summary    TEXT,
        execution_time_ms INTEGER NOT NULL DEFAULT 0,
        recorded_at       DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_events_session ON tool_usage_events(session_id);
    CREATE INDEX IF NOT EXISTS idx_events_recorded ON tool_usage_events(recorded_at);
    CREATE INDEX IF NOT EXISTS idx_events_act ON tool_usage_events(research_act);

    -- ============================================
    -- Derived (regenerable from the event log)
    -- ============================================

    CREATE TABLE IF NOT EXISTS progress_entries (
        project_id            TEXT NOT NULL REFERENCES projects(id),
        research_act          TEXT NOT NULL,
        research_category     TEXT NOT NULL,
        completion_percentage REAL NOT NULL,
        tools_used            JSON NOT NULL,
        total_tools           INTEGER NOT NULL,
        status                TEXT NOT NULL,
        computed_at           DATETIME NOT NULL,

        UNIQUE(project_id, research_act, research_category)
    );

    CREATE INDEX IF NOT EXISTS idx_progress_project ON progress_entries(project_id);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
