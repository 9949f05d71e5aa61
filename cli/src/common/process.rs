//! # ReDACT Pre-Render Script Execution (`common::process`)
//!
//! File: cli/src/common/process.rs
//!
//! ## Overview
//!
//! A pre-render script is a user-supplied shell script that exports extra
//! variables (or overrides existing ones) before a template is rendered. This
//! module runs such a script and hands back exactly the variables it changed.
//!
//! ## Architecture
//!
//! The script is sourced by `/bin/sh`, which then prints a sentinel and dumps
//! its environment with `env -0`:
//!
//! ```text
//! sh -c '. "$1" && printf "\0RDCT_PRERENDER_ENV\0" && env -0' sh <script>
//! ```
//!
//! - The script path travels as `$1`, never spliced into the command string.
//! - Records in the dump are NUL-terminated `KEY=VALUE` pairs, so values with
//!   embedded newlines or `=` come through intact. The last sentinel splits
//!   the script's own stdout (kept for logging) from the dump.
//! - The child starts from an explicit base environment. The result holds only
//!   the keys whose value differs from that base, minus the bookkeeping keys
//!   the shell maintains itself (`_`, `SHLVL`, `PWD`, `OLDPWD`).
//! - The wait is bounded by a timeout; the child is killed if it expires.
//!
//! Failures (spawn error, non-zero exit, timeout, script calling `exit`)
//! become `RedactError::ScriptExecutionFailed` with the captured stderr. No
//! partial environment is ever returned.
//!
//! **Trust boundary:** the script runs with the privileges of `redact` itself.
//!
//! ## Usage
//!
//! ```rust
//! let executor = PreRenderExecutor::new(store.to_map()).with_timeout(Duration::from_secs(30));
//! let output = executor.run(Path::new("/docker/pre-render.sh")).await?;
//! store.merge(output.env);
//! ```
//!
use crate::core::error::RedactError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Marker printed between the script's own output and the environment dump.
pub const PRE_RENDER_SENTINEL: &str = "RDCT_PRERENDER_ENV";

/// Default upper bound on a pre-render script's run time.
pub const DEFAULT_PRE_RENDER_TIMEOUT: Duration = Duration::from_secs(300);

const DEFAULT_SHELL: &str = "/bin/sh";

const CAPTURE_COMMAND: &str = r#". "$1" && printf '\000%s\000' RDCT_PRERENDER_ENV && env -0"#;

// Maintained by the shell, not by the script.
const SHELL_MANAGED_KEYS: [&str; 4] = ["_", "SHLVL", "PWD", "OLDPWD"];

/// What a successful pre-render run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreRenderOutput {
    /// Variables the script added or changed.
    pub env: BTreeMap<String, String>,
    /// The script's own stdout, without the environment dump.
    pub stdout: String,
    pub stderr: String,
}

/// Runs pre-render scripts against a fixed base environment.
#[derive(Debug, Clone)]
pub struct PreRenderExecutor {
    shell: PathBuf,
    base_env: BTreeMap<String, String>,
    timeout: Duration,
}

impl PreRenderExecutor {
    pub fn new(base_env: BTreeMap<String, String>) -> Self {
        PreRenderExecutor {
            shell: PathBuf::from(DEFAULT_SHELL),
            base_env,
            timeout: DEFAULT_PRE_RENDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sources `script` and returns the environment changes it made.
    pub async fn run(&self, script: &Path) -> Result<PreRenderOutput, RedactError> {
        let script_name = script.display().to_string();
        debug!(
            "Running pre-render script {} with {} (timeout {:?})",
            script_name,
            self.shell.display(),
            self.timeout
        );

        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(CAPTURE_COMMAND)
            .arg("sh")
            .arg(sourceable_path(script))
            .env_clear()
            .envs(&self.base_env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            RedactError::script_failed(
                &script_name,
                "",
                format!("failed to start {}: {}", self.shell.display(), e),
            )
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| RedactError::script_failed(&script_name, "", e.to_string()))?,
            Err(_) => {
                return Err(RedactError::script_failed(
                    &script_name,
                    "",
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(RedactError::script_failed(
                &script_name,
                &stderr,
                output.status.to_string(),
            ));
        }

        let (script_stdout, dump) = split_capture(&output.stdout).ok_or_else(|| {
            RedactError::script_failed(
                &script_name,
                &stderr,
                "script exited before its environment could be captured",
            )
        })?;

        let env = diff_env(&self.base_env, parse_env_dump(dump));
        debug!(
            "Pre-render script {} changed {} variable(s)",
            script_name,
            env.len()
        );
        Ok(PreRenderOutput {
            env,
            stdout: String::from_utf8_lossy(script_stdout).into_owned(),
            stderr,
        })
    }
}

// `.` searches PATH for bare file names, so anchor them to the working directory.
fn sourceable_path(script: &Path) -> PathBuf {
    if script.components().count() == 1 && script.is_relative() {
        Path::new(".").join(script)
    } else {
        script.to_path_buf()
    }
}

/// Splits captured stdout at the last sentinel into (script output, env dump).
fn split_capture(stdout: &[u8]) -> Option<(&[u8], &[u8])> {
    let marker = format!("\0{}\0", PRE_RENDER_SENTINEL);
    let marker = marker.as_bytes();
    let at = stdout
        .windows(marker.len())
        .rposition(|window| window == marker)?;
    Some((&stdout[..at], &stdout[at + marker.len()..]))
}

/// Parses NUL-terminated `KEY=VALUE` records. Empty records are ignored and
/// records without `=` are skipped with a warning.
fn parse_env_dump(dump: &[u8]) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    for record in dump.split(|b| *b == 0).filter(|r| !r.is_empty()) {
        let record = String::from_utf8_lossy(record);
        match record.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                env.insert(key.to_string(), value.to_string());
            }
            _ => warn!("Ignoring malformed environment record {:?}", record),
        }
    }
    env
}

fn diff_env(
    base: &BTreeMap<String, String>,
    captured: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    captured
        .into_iter()
        .filter(|(key, _)| !SHELL_MANAGED_KEYS.contains(&key.as_str()))
        .filter(|(key, value)| base.get(key) != Some(value))
        .collect()
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn base_env() -> BTreeMap<String, String> {
        let mut env: BTreeMap<String, String> = std::env::vars().collect();
        env.insert("test_app_var".to_string(), "test".to_string());
        env
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_split_capture_uses_last_sentinel() {
        let raw = b"hello\n\0RDCT_PRERENDER_ENV\0fake\0RDCT_PRERENDER_ENV\0A=1\0";
        let (stdout, dump) = split_capture(raw).unwrap();
        assert_eq!(stdout, b"hello\n\0RDCT_PRERENDER_ENV\0fake");
        assert_eq!(dump, b"A=1\0");
        assert!(split_capture(b"no marker here").is_none());
    }

    #[test]
    fn test_parse_env_dump() {
        let env = parse_env_dump(b"A=1\0B=x=y\0MULTI=line1\nline2\0\0NOEQUALS\0=nokey\0EMPTY=\0");
        assert_eq!(env.get("A").map(String::as_str), Some("1"));
        assert_eq!(env.get("B").map(String::as_str), Some("x=y"));
        assert_eq!(env.get("MULTI").map(String::as_str), Some("line1\nline2"));
        assert_eq!(env.get("EMPTY").map(String::as_str), Some(""));
        assert!(!env.contains_key("NOEQUALS"));
        assert_eq!(env.len(), 4);
    }

    #[test]
    fn test_diff_env() {
        let mut base = BTreeMap::new();
        base.insert("same".to_string(), "1".to_string());
        base.insert("changed".to_string(), "old".to_string());
        let mut captured = base.clone();
        captured.insert("changed".to_string(), "new".to_string());
        captured.insert("added".to_string(), "x".to_string());
        captured.insert("SHLVL".to_string(), "1".to_string());
        let diff = diff_env(&base, captured);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff["changed"], "new");
        assert_eq!(diff["added"], "x");
    }

    #[test]
    fn test_sourceable_path() {
        assert_eq!(sourceable_path(Path::new("pre.sh")), PathBuf::from("./pre.sh"));
        assert_eq!(
            sourceable_path(Path::new("scripts/pre.sh")),
            PathBuf::from("scripts/pre.sh")
        );
        assert_eq!(sourceable_path(Path::new("/pre.sh")), PathBuf::from("/pre.sh"));
    }

    #[tokio::test]
    async fn test_run_exports_and_overrides() {
        let dir = tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "pre-render.sh",
            "echo 'computing values'\nexport pre_render=test\nexport test_app_var=override\n",
        );
        let output = PreRenderExecutor::new(base_env()).run(&script).await.unwrap();
        assert_eq!(output.env.get("pre_render").map(String::as_str), Some("test"));
        assert_eq!(
            output.env.get("test_app_var").map(String::as_str),
            Some("override")
        );
        assert_eq!(output.stdout, "computing values\n");
        // Unchanged inherited variables are not part of the result.
        assert!(!output.env.contains_key("PATH"));
    }

    #[tokio::test]
    async fn test_run_preserves_multiline_values() {
        let dir = tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "multi.sh",
            "export CERT=\"line one\nline=two\"\n",
        );
        let output = PreRenderExecutor::new(base_env()).run(&script).await.unwrap();
        assert_eq!(output.env["CERT"], "line one\nline=two");
    }

    #[tokio::test]
    async fn test_run_failure_reports_stderr() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "fail.sh", "echo 'bad things' >&2\nfalse\n");
        let err = PreRenderExecutor::new(base_env()).run(&script).await.unwrap_err();
        match err {
            RedactError::ScriptExecutionFailed { details, .. } => {
                assert!(details.contains("bad things"), "details: {}", details);
            }
            other => panic!("expected ScriptExecutionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_missing_script() {
        let dir = tempdir().unwrap();
        let err = PreRenderExecutor::new(base_env())
            .run(&dir.path().join("missing.sh"))
            .await
            .unwrap_err();
        assert!(matches!(err, RedactError::ScriptExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn test_run_script_calling_exit() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "exit.sh", "export A=1\nexit 0\n");
        let err = PreRenderExecutor::new(base_env()).run(&script).await.unwrap_err();
        assert!(err.to_string().contains("exited before"));
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "hang.sh", "sleep 30\n");
        let err = PreRenderExecutor::new(base_env())
            .with_timeout(Duration::from_millis(200))
            .run(&script)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "{}", err);
    }
}
