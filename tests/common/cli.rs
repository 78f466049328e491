use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

/// Variables that would leak the developer's own setup into a run.
const SCRUBBED_ENV: &[&str] = &[
    "ENGAGE_TRACKER_BASE_URL",
    "ENGAGE_TRACKER_USER",
    "ENGAGE_TRACKER_TOKEN",
    "ENGAGE_TRACKER_QUERY",
    "ENGAGE_REPORT_TOP_N",
    "ENGAGE_REPORT_START",
    "ENGAGE_REPORT_END",
    "ENGAGE_REPORT_OUTPUT_DIR",
    "ENGAGE_RULES_FILE",
];

#[derive(Debug)]
pub struct EngageRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl EngageRun {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&extract_json_payload(&self.stdout)).expect("stdout is JSON")
    }

    pub fn error_json(&self) -> serde_json::Value {
        serde_json::from_str(&extract_json_payload(&self.stderr)).expect("stderr is JSON")
    }
}

pub struct EngageWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl EngageWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            log_dir,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        fs::read_to_string(self.root.join(relative)).expect("read workspace file")
    }
}

pub fn run_engage<I, S>(workspace: &EngageWorkspace, args: I, label: &str) -> EngageRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_engage_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_engage_with_env<I, S, E, K, V>(
    workspace: &EngageWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> EngageRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("engage"));
    cmd.current_dir(&workspace.root);
    for key in SCRUBBED_ENV {
        cmd.env_remove(key);
    }
    cmd.args(args);
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "engage_report=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);

    let start = Instant::now();
    let output = cmd.output().expect("run engage");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let timestamp = SystemTime::now();
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        timestamp,
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    EngageRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Skip any log noise before the first JSON value.
pub fn extract_json_payload(stdout: &str) -> String {
    let lines: Vec<&str> = stdout.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return lines[idx..].join("\n").trim().to_string();
        }
    }
    stdout.trim().to_string()
}
