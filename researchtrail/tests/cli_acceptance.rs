use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use researchtrail_core::Database;
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("researchtrail/data.db")
    }
}

fn run_cli(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("researchtrail"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute researchtrail: {e}"))
}

fn assert_success(args: &[&str], output: &Output) -> String {
    if output.status.success() {
        return String::from_utf8_lossy(&output.stdout).into_owned();
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "researchtrail {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn run_json(env: &CliTestEnv, args: &[&str]) -> serde_json::Value {
    let mut with_json: Vec<&str> = args.to_vec();
    with_json.push("--json");
    let output = run_cli(env, &with_json);
    let stdout = assert_success(&with_json, &output);
    serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("invalid JSON from researchtrail {args:?}: {e}\n{stdout}"))
}

fn seed_project_and_session(env: &CliTestEnv) -> (String, String) {
    let project = run_json(
        env,
        &["init", "--name", "Coral Bleaching Study", "--domain", "marine biology"],
    );
    let project_id = project["id"].as_str().expect("project id").to_string();

    let session = run_json(env, &["start", &project_id, "--focus", "framing"]);
    let session_id = session["id"].as_str().expect("session id").to_string();

    (project_id, session_id)
}

#[test]
fn init_record_and_progress_round_trip() {
    let env = CliTestEnv::new();
    let (project_id, session_id) = seed_project_and_session(&env);

    for tool in ["clarify_research_goals", "assess_foundational_assumptions"] {
        let output = run_cli(&env, &["record", "--session", &session_id, tool]);
        let stdout = assert_success(&["record", tool], &output);
        assert!(
            stdout.contains("Recorded"),
            "expected record confirmation, got:\n{stdout}"
        );
    }

    let output = run_cli(&env, &["progress", &project_id]);
    let stdout = assert_success(&["progress", &project_id], &output);
    assert!(stdout.contains("Conceptualization"));
    assert!(
        stdout.contains("Goal Setting") && stdout.contains("66.7%"),
        "expected partial goal-setting progress, got:\n{stdout}"
    );

    // The database lands under XDG_DATA_HOME and is readable directly.
    let db_path = env.db_path();
    assert!(db_path.exists(), "missing database at {}", db_path.display());
    let db = Database::open(&db_path).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let projects = db.list_projects().expect("failed to list projects");
    assert_eq!(projects.len(), 1);
}

#[test]
fn recommend_reflects_recorded_context() {
    let env = CliTestEnv::new();
    let (project_id, session_id) = seed_project_and_session(&env);

    for tool in ["clarify_research_goals", "suggest_methodology"] {
        let output = run_cli(&env, &["record", "--session", &session_id, tool]);
        assert_success(&["record", tool], &output);
    }

    let guidance = run_json(&env, &["recommend", &project_id]);
    assert_eq!(
        guidance["recent_activity_pattern"]["pattern_type"],
        "logical_progression"
    );
    assert_eq!(
        guidance["prioritized_recommendations"][0]["tool_name"],
        "design_experimental_framework"
    );
}

#[test]
fn milestones_report_usage_buckets() {
    let env = CliTestEnv::new();
    let (project_id, session_id) = seed_project_and_session(&env);

    let tools = [
        "clarify_research_goals",
        "assess_foundational_assumptions",
        "generate_critical_questions",
        "initiate_paradigm_challenge",
        "explain_key_concepts",
    ];
    for _ in 0..2 {
        for tool in tools {
            let output = run_cli(&env, &["record", "--session", &session_id, tool]);
            assert_success(&["record", tool], &output);
        }
    }

    let milestones = run_json(&env, &["milestones", &project_id]);
    let ids: Vec<&str> = milestones
        .as_array()
        .expect("milestone array")
        .iter()
        .map(|m| m["id"].as_str().expect("milestone id"))
        .collect();
    assert!(ids.contains(&"act:conceptualization"), "got {ids:?}");
    assert!(ids.contains(&"usage:10"), "got {ids:?}");
}

#[test]
fn unknown_project_fails_cleanly() {
    let env = CliTestEnv::new();
    let output = run_cli(&env, &["progress", "no-such-project"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no-such-project"),
        "expected the project id in the error, got:\n{stderr}"
    );
}
