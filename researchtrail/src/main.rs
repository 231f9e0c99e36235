//! researchtrail - Research workflow progress tracker
//!
//! Records research-tool usage against a fixed research-lifecycle taxonomy
//! and reports progress, next-tool guidance, and milestones per project.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use researchtrail_core::analytics::{ContextualGuidance, ProgressReport};
use researchtrail_core::types::Milestone;
use researchtrail_core::{AnalyticsConfig, Config, NewToolUsage, UsageTracker};

#[derive(Parser, Debug)]
#[command(name = "researchtrail")]
#[command(about = "Track research progress across the research lifecycle")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new research project
    Init {
        /// Project name
        #[arg(long)]
        name: Option<String>,
        /// Research domain (display only)
        #[arg(long)]
        domain: Option<String>,
    },
    /// List all projects
    Projects,
    /// Start a session under a project
    Start {
        /// Project id
        project_id: String,
        /// Free-text focus for this session
        #[arg(long)]
        focus: Option<String>,
    },
    /// End an active session
    End {
        /// Session id
        session_id: String,
    },
    /// Record one tool invocation against a session
    Record {
        /// Session id
        #[arg(long)]
        session: String,
        /// Tool name (unknown tools are logged unclassified)
        tool: String,
        /// Mark the invocation as failed
        #[arg(long)]
        failed: bool,
        /// Short result summary
        #[arg(long)]
        summary: Option<String>,
        /// Execution time in milliseconds
        #[arg(long, default_value_t = 0)]
        duration_ms: i64,
    },
    /// Show per-act progress for a project
    Progress {
        /// Project id
        project_id: String,
    },
    /// Suggest next tools for a project
    Recommend {
        /// Project id
        project_id: String,
        /// Anchor the context on this tool instead of the newest event
        #[arg(long)]
        last_tool: Option<String>,
        /// Maximum number of recommendations
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Show milestones detectable on a project's history
    Milestones {
        /// Project id
        project_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = researchtrail_core::logging::init(&config.logging).ok();

    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let tracker =
        UsageTracker::open(&db_path, config.analytics).context("failed to open database")?;

    match cli.command {
        Command::Init { name, domain } => {
            let project = tracker.create_project(name, domain)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&project)?);
            } else {
                println!("Created project {}", project.id);
                if let Some(name) = &project.name {
                    println!("  Name:   {}", name);
                }
                if let Some(domain) = &project.domain {
                    println!("  Domain: {}", domain);
                }
            }
        }
        Command::Projects => {
            let projects = tracker.db().list_projects()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("No projects yet. Create one with `researchtrail init`.");
            } else {
                for project in projects {
                    let name = project.name.as_deref().unwrap_or("(unnamed)");
                    println!("{}  {}", project.id, name);
                }
            }
        }
        Command::Start { project_id, focus } => {
            let session = tracker.start_session(&project_id, focus)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                println!("Started session {}", session.id);
            }
        }
        Command::End { session_id } => {
            let session = tracker.end_session(&session_id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                println!("Ended session {}", session.id);
            }
        }
        Command::Record {
            session,
            tool,
            failed,
            summary,
            duration_ms,
        } => {
            let recorded = tracker.record_tool_usage(&NewToolUsage {
                session_id: session,
                tool_name: tool.clone(),
                success: !failed,
                result_summary: summary,
                execution_time_ms: duration_ms,
                recorded_at: chrono::Utc::now(),
            })?;

            if cli.json {
                let payload = serde_json::json!({
                    "event_id": recorded.event_id,
                    "progress": recorded.progress,
                    "milestones": recorded.milestones,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "Recorded {} (event {}), overall progress {:.1}%",
                    tool, recorded.event_id, recorded.progress.overall_percentage
                );
                for milestone in &recorded.milestones {
                    println!("  {} {} - {}", milestone.icon, milestone.title, milestone.significance);
                }
            }
        }
        Command::Progress { project_id } => {
            let report = tracker.progress_report(&project_id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_progress(&report);
            }
        }
        Command::Recommend {
            project_id,
            last_tool,
            depth,
        } => {
            let guidance =
                tracker.contextual_guidance(&project_id, last_tool.as_deref(), depth)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&guidance)?);
            } else {
                print_guidance(&guidance);
            }
        }
        Command::Milestones { project_id } => {
            let milestones = tracker.milestones(&project_id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&milestones)?);
            } else {
                print_milestones(&milestones);
            }
        }
    }

    Ok(())
}

fn print_progress(report: &ProgressReport) {
    println!("Research progress ({} tool uses)", report.total_tool_uses);
    println!();
    for act in &report.acts {
        println!(
            "  {:<24} {} {:>5.1}%  ({}/{} tools)",
            act.act_name,
            progress_bar(act.completion_percentage),
            act.completion_percentage,
            act.tools_used.len(),
            act.total_tools
        );
        for category in &act.categories {
            if category.completion_percentage > 0.0 {
                println!(
                    "      {:<22} {:>5.1}%",
                    category.category_name, category.completion_percentage
                );
            }
        }
    }
    println!();
    println!("  Overall: {:.1}%", report.overall_percentage);
}

fn print_guidance(guidance: &ContextualGuidance) {
    if let Some(context) = &guidance.current_context {
        println!("Context: {} / {}", context.act_name, context.category_name);
    }
    println!("Pattern: {}", guidance.recent_activity_pattern.pattern_type());
    println!();

    if guidance.prioritized_recommendations.is_empty() {
        println!("Nothing left to recommend - the taxonomy is fully covered.");
    } else {
        println!("Recommended next tools:");
        for rec in &guidance.prioritized_recommendations {
            println!(
                "  [{}] {}  ({})",
                rec.priority.as_str(),
                rec.tool_name,
                rec.rationale
            );
        }
    }

    println!();
    println!("{}", guidance.rationale);

    if !guidance.alternative_paths.is_empty() {
        println!();
        println!("Alternative paths:");
        for path in &guidance.alternative_paths {
            println!("  {} - try {}", path.description, path.tools.join(", "));
        }
    }
}

fn print_milestones(milestones: &[Milestone]) {
    if milestones.is_empty() {
        println!("No milestones yet. Keep going.");
        return;
    }
    for milestone in milestones {
        println!("{} {}", milestone.icon, milestone.title);
        println!("   {}", milestone.significance);
    }
}

fn progress_bar(pct: f64) -> String {
    let filled = ((pct / 100.0) * 20.0).round() as usize;
    let filled = filled.min(20);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(20 - filled))
}
