use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Nothing listens on the discard port, so every request is refused quickly.
const UNREACHABLE_API: &str = "http://127.0.0.1:9/api";

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        let env = Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
        };
        env.write_config(&format!(
            "[api]\nbase_url = \"{}\"\ntimeout_secs = 1\n",
            UNREACHABLE_API
        ));
        env
    }

    fn write_config(&self, content: &str) {
        let dir = self.xdg_config.join("logdesk");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), content).expect("failed to write config");
    }
}

fn run_cli(env: &CliTestEnv, args: &[&str]) -> Output {
    run_cli_with_env(env, args, &[])
}

fn run_cli_with_env(env: &CliTestEnv, args: &[&str], vars: &[(&str, &str)]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("logdesk-cli"));

    let mut command = Command::new(bin_path);
    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("LOGDESK_API_URL");
    for (key, value) in vars {
        command.env(key, value);
    }
    command
        .output()
        .unwrap_or_else(|e| panic!("failed to execute logdesk-cli: {e}"))
}

fn render(args: &[&str], output: &Output) -> String {
    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "logdesk-cli {rendered_args}\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn assert_success(args: &[&str], output: &Output) {
    if !output.status.success() {
        panic!("expected success:\n{}", render(args, output));
    }
}

fn assert_failure(args: &[&str], output: &Output) {
    if output.status.success() {
        panic!("expected failure:\n{}", render(args, output));
    }
}

#[test]
fn help_lists_every_command() {
    let env = CliTestEnv::new();
    let args = ["--help"];
    let output = run_cli(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in [
        "health",
        "logs",
        "incidents",
        "kb",
        "rank",
        "generate",
        "check",
    ] {
        assert!(
            stdout.contains(command),
            "help should mention {command}:\n{stdout}"
        );
    }
}

#[test]
fn health_fails_when_api_is_unreachable() {
    let env = CliTestEnv::new();
    let args = ["health"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(&format!("API is unreachable: {UNREACHABLE_API}")),
        "{}",
        render(&args, &output)
    );
}

#[test]
fn health_json_reports_down() {
    let env = CliTestEnv::new();
    let args = ["--json", "health"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("health --json should print JSON");
    assert_eq!(value["up"], serde_json::Value::Bool(false));
    assert_eq!(value["url"], UNREACHABLE_API);
}

#[test]
fn environment_overrides_configured_url() {
    let env = CliTestEnv::new();
    env.write_config("[api]\nbase_url = \"http://127.0.0.1:1/api\"\ntimeout_secs = 1\n");

    let args = ["health"];
    let output = run_cli_with_env(&env, &args, &[("LOGDESK_API_URL", UNREACHABLE_API)]);
    assert_failure(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(UNREACHABLE_API), "{}", render(&args, &output));
}

#[test]
fn api_url_flag_is_validated() {
    let env = CliTestEnv::new();
    let args = ["--api-url", "localhost:8080", "health"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid configuration"),
        "{}",
        render(&args, &output)
    );
    assert!(stderr.contains("http://"), "{}", render(&args, &output));
}

#[test]
fn malformed_config_file_is_reported() {
    let env = CliTestEnv::new();
    env.write_config("[api\nbase_url = ");

    let args = ["health"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to load configuration"),
        "{}",
        render(&args, &output)
    );
}

#[test]
fn unknown_log_status_is_rejected() {
    let env = CliTestEnv::new();
    let args = ["logs", "status", "42", "DONE"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unknown LogStatus value: DONE"),
        "{}",
        render(&args, &output)
    );
}

#[test]
fn unknown_preset_is_rejected() {
    let env = CliTestEnv::new();
    let args = ["generate", "--preset", "DISK"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unknown preset: DISK"),
        "{}",
        render(&args, &output)
    );
}

#[test]
fn generate_requires_a_message() {
    let env = CliTestEnv::new();
    let args = ["generate", "--message", "   "];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("a message is required"),
        "{}",
        render(&args, &output)
    );
}

#[test]
fn generate_reports_send_failure() {
    let env = CliTestEnv::new();
    let args = ["generate", "--preset", "DB", "--repeat", "3", "--delay", "0"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("generator stopped early"),
        "{}",
        render(&args, &output)
    );
}

#[test]
fn list_logs_fails_with_context() {
    let env = CliTestEnv::new();
    let args = ["logs", "list", "--status", "NEW", "--today"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to list logs"),
        "{}",
        render(&args, &output)
    );
}

#[test]
fn check_fails_every_step_against_unreachable_api() {
    let env = CliTestEnv::new();
    let args = ["check"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FAIL"), "{}", render(&args, &output));
    assert!(stdout.contains("Last run"), "{}", render(&args, &output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("check(s) failed"), "{}", render(&args, &output));
}

#[test]
fn verbose_writes_log_file_to_state_dir() {
    let env = CliTestEnv::new();
    let args = ["--verbose", "health"];
    let output = run_cli(&env, &args);
    assert_failure(&args, &output);

    let log_dir = env.xdg_state.join("logdesk");
    let entries: Vec<_> = fs::read_dir(&log_dir)
        .unwrap_or_else(|e| panic!("log dir {} missing: {e}", log_dir.display()))
        .collect();
    assert!(!entries.is_empty(), "expected a log file in {}", log_dir.display());
}
