// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`PythonRuntime`]: runs generated tools in a fresh interpreter process.
//!
//! Every call spawns the configured interpreter with an embedded runner
//! script. The request goes in on stdin, the result envelope comes back
//! through a per-call temp file, and the process's stdout/stderr pipes are
//! the capture buffers. Nothing is shared between calls.
//!
//! There is no resource, time, or capability isolation: a tool can read
//! files, open sockets and loop forever. Treat this as an ergonomics
//! boundary, not a security boundary.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use toolforge_config::RuntimeConfig;
use toolforge_core::{
    AdapterType, ExecutionOutcome, ForgeError, HealthStatus, Invocation, PluginAdapter,
    SyntaxCheck, ToolRuntimeAdapter,
};
use tracing::{debug, warn};

use crate::report::{compose_error_report, non_empty};

const RUNNER: &str = include_str!("runner.py");

/// Exit status the syntax checker uses for "parsed, and it is invalid".
const SYNTAX_INVALID_EXIT: i32 = 3;

const SYNTAX_CHECKER: &str = r#"
import sys
source = sys.stdin.buffer.read().decode("utf-8", "replace")
try:
    compile(source, "<tool>", "exec")
except (SyntaxError, ValueError) as exc:
    sys.stdout.write(f"{type(exc).__name__}: {exc}")
    sys.exit(3)
"#;

/// Result file written by the runner.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Envelope {
    Ok {
        result: Value,
        /// Set when the value was not JSON-serializable and `result` holds
        /// its `repr()`.
        #[serde(default)]
        repr: bool,
    },
    Fault {
        traceback: String,
    },
}

fn runtime_err(message: impl Into<String>, source: std::io::Error) -> ForgeError {
    ForgeError::Runtime {
        message: message.into(),
        source: Some(Box::new(source)),
    }
}

/// Raw output of one interpreter process.
struct Captured {
    status: std::process::ExitStatus,
    stdout: String,
    stderr: String,
}

/// Execution harness backed by a Python interpreter.
#[derive(Debug, Clone)]
pub struct PythonRuntime {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl PythonRuntime {
    /// `python_command` is split shell-style, so `"uv run python"` works.
    pub fn new(config: &RuntimeConfig) -> Result<Self, ForgeError> {
        let mut parts = shlex::split(&config.python_command)
            .filter(|parts| !parts.is_empty())
            .ok_or_else(|| {
                ForgeError::Config(format!(
                    "runtime.python_command `{}` is empty or malformed",
                    config.python_command
                ))
            })?;
        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
            working_dir: config.working_dir.as_ref().map(PathBuf::from),
        })
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }

    /// Spawns `command`, feeds `input` on stdin and collects the output.
    async fn run_process(&self, mut command: Command, input: &[u8]) -> Result<Captured, ForgeError> {
        let mut child = command.spawn().map_err(|e| {
            runtime_err(
                format!("failed to spawn python interpreter `{}`: {e}", self.program),
                e,
            )
        })?;
        let mut stdin = child.stdin.take().ok_or_else(|| ForgeError::Runtime {
            message: "failed to capture interpreter stdin".into(),
            source: None,
        })?;

        let feed = async move {
            let written = stdin.write_all(input).await;
            drop(stdin);
            written
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());
        if let Err(e) = written {
            // The process exited before reading its input; its status says why.
            debug!(error = %e, "interpreter closed stdin early");
        }
        let output = output.map_err(|e| runtime_err(format!("interpreter I/O failed: {e}"), e))?;

        Ok(Captured {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn run_tool(
        &self,
        code: &str,
        entry: &str,
        invocation: &Invocation,
    ) -> Result<ExecutionOutcome, ForgeError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| runtime_err(format!("failed to create scratch directory: {e}"), e))?;
        let result_path = scratch.path().join("result.json");

        let request = json!({
            "code": code,
            "entry": entry,
            "args": invocation.args,
            "kwargs": invocation.kwargs,
        });
        let input = serde_json::to_vec(&request).map_err(|e| ForgeError::Internal(e.to_string()))?;

        let mut command = self.command();
        command.arg("-c").arg(RUNNER).arg(&result_path);
        let captured = self.run_process(command, &input).await?;

        let envelope = match tokio::fs::read_to_string(&result_path).await {
            Ok(text) if !text.trim().is_empty() => Some(serde_json::from_str::<Envelope>(&text)),
            _ => None,
        };
        let (result, fault) = match envelope {
            Some(Ok(Envelope::Ok { result, repr })) => {
                if repr {
                    debug!(entry, "tool returned a non-JSON value, using its repr");
                }
                (Some(result), None)
            }
            Some(Ok(Envelope::Fault { traceback })) => (None, Some(traceback)),
            Some(Err(e)) => (None, Some(format!("unreadable result envelope: {e}"))),
            None => (
                None,
                Some(format!(
                    "tool process ended ({}) before reporting a result",
                    captured.status
                )),
            ),
        };

        let error = compose_error_report(&captured.stderr, fault.as_deref());
        debug!(entry, ok = error.is_none(), status = %captured.status, "tool run finished");
        Ok(ExecutionOutcome {
            result,
            stdout: non_empty(captured.stdout),
            error,
        })
    }
}

#[async_trait]
impl PluginAdapter for PythonRuntime {
    fn name(&self) -> &str {
        "python"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Runtime
    }

    async fn health_check(&self) -> Result<HealthStatus, ForgeError> {
        let mut command = self.command();
        command.arg("-c").arg("import sys; print(sys.version.split()[0])");
        match self.run_process(command, b"").await {
            Ok(out) if out.status.success() => {
                debug!(python = out.stdout.trim(), "interpreter available");
                Ok(HealthStatus::Healthy)
            }
            Ok(out) => Ok(HealthStatus::Unhealthy(format!(
                "interpreter exited with {}: {}",
                out.status,
                out.stderr.trim()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), ForgeError> {
        Ok(())
    }
}

#[async_trait]
impl ToolRuntimeAdapter for PythonRuntime {
    async fn execute(&self, code: &str, entry: &str, invocation: &Invocation) -> ExecutionOutcome {
        match self.run_tool(code, entry, invocation).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(entry, error = %e, "execution harness failed");
                ExecutionOutcome {
                    result: None,
                    stdout: None,
                    error: compose_error_report("", Some(&format!("HarnessError: {e}"))),
                }
            }
        }
    }

    async fn check_syntax(&self, code: &str) -> Result<SyntaxCheck, ForgeError> {
        let mut command = self.command();
        command.arg("-c").arg(SYNTAX_CHECKER);
        let out = self.run_process(command, code.as_bytes()).await?;
        match out.status.code() {
            Some(0) => Ok(SyntaxCheck::Valid),
            Some(SYNTAX_INVALID_EXIT) => Ok(SyntaxCheck::Invalid(out.stdout.trim().to_string())),
            _ => Err(ForgeError::Runtime {
                message: format!(
                    "syntax checker exited with {}: {}",
                    out.status,
                    out.stderr.trim()
                ),
                source: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn runtime() -> Option<PythonRuntime> {
        let available = std::process::Command::new("python3")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success());
        if !available {
            eprintln!("python3 not found on PATH, skipping");
            return None;
        }
        Some(PythonRuntime::new(&RuntimeConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn doubles_a_number() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute(
                "def f(x):\n    return x * 2\n",
                "f",
                &Invocation::positional(vec![json!(21)]),
            )
            .await;
        assert_eq!(out.result, Some(json!(42)));
        assert_eq!(out.stdout, None);
        assert_eq!(out.error, None);
    }

    #[tokio::test]
    async fn division_by_zero_is_a_fault_report() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute("def f():\n    return 1 / 0\n", "f", &Invocation::default())
            .await;
        let error = out.error.expect("fault");
        assert!(error.starts_with("Exception:\n"), "got: {error}");
        assert!(error.contains("ZeroDivisionError"));
        assert!(out.result.is_none());
    }

    #[tokio::test]
    async fn prints_are_captured_with_the_result() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute(
                "print('loading')\ndef f(name):\n    print('hello', name)\n    return name.upper()\n",
                "f",
                &Invocation::positional(vec![json!("ada")]),
            )
            .await;
        assert_eq!(out.result, Some(json!("ADA")));
        assert_eq!(out.stdout.as_deref(), Some("loading\nhello ada\n"));
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn prints_before_a_fault_stay_out_of_the_report() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute(
                "def f():\n    print('halfway there')\n    return 1 / 0\n",
                "f",
                &Invocation::default(),
            )
            .await;
        assert_eq!(out.stdout.as_deref(), Some("halfway there\n"));
        assert!(out.result.is_none());
        let error = out.error.expect("fault");
        assert!(error.starts_with("Exception:\n"), "got: {error}");
        assert!(error.contains("ZeroDivisionError"));
        assert!(!error.contains("halfway there"));
    }

    #[tokio::test]
    async fn keyword_arguments_are_passed() {
        let Some(rt) = runtime() else { return };
        let mut kwargs = serde_json::Map::new();
        kwargs.insert("sep".into(), json!("-"));
        let out = rt
            .execute(
                "def join(*parts, sep=','):\n    return sep.join(parts)\n",
                "join",
                &Invocation::new(vec![json!("a"), json!("b")], kwargs),
            )
            .await;
        assert_eq!(out.result, Some(json!("a-b")));
    }

    #[tokio::test]
    async fn missing_entry_point_is_reported() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute("def f():\n    return 1\n", "g", &Invocation::default())
            .await;
        let error = out.error.expect("missing entry");
        assert!(error.contains("EntryNotFound"));
        assert!(error.contains("Function 'g' not found or not callable in the provided code."));
    }

    #[tokio::test]
    async fn non_callable_entry_is_reported() {
        let Some(rt) = runtime() else { return };
        let out = rt.execute("f = 3\n", "f", &Invocation::default()).await;
        assert!(out.error.expect("not callable").contains("EntryNotFound"));
    }

    #[tokio::test]
    async fn stderr_alone_counts_as_failure_but_keeps_result() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute(
                "import sys\ndef f():\n    sys.stderr.write('careful')\n    return 1\n",
                "f",
                &Invocation::default(),
            )
            .await;
        assert_eq!(out.error.as_deref(), Some("Captured stderr:\ncareful"));
        assert_eq!(out.result, Some(json!(1)));
    }

    #[tokio::test]
    async fn stderr_and_fault_are_combined() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute(
                "import sys\ndef f():\n    sys.stderr.write('careful')\n    raise ValueError('bad')\n",
                "f",
                &Invocation::default(),
            )
            .await;
        let error = out.error.expect("fault");
        assert!(error.starts_with("Captured stderr:\ncareful\nException:\n"), "got: {error}");
        assert!(error.contains("ValueError: bad"));
    }

    #[tokio::test]
    async fn load_time_errors_are_faults() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute("import not_a_real_module_xyz\n", "f", &Invocation::default())
            .await;
        assert!(out.error.expect("fault").contains("ModuleNotFoundError"));
    }

    #[tokio::test]
    async fn system_exit_does_not_escape() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute("import sys\ndef f():\n    sys.exit(2)\n", "f", &Invocation::default())
            .await;
        assert!(out.error.expect("fault").contains("SystemExit"));
    }

    #[tokio::test]
    async fn non_json_results_fall_back_to_repr() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute("def f():\n    return {3}\n", "f", &Invocation::default())
            .await;
        assert_eq!(out.result, Some(json!("{3}")));

        let out = rt
            .execute("def f():\n    return (1, 2)\n", "f", &Invocation::default())
            .await;
        assert_eq!(out.result, Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn runs_do_not_share_state() {
        let Some(rt) = runtime() else { return };
        let code = "seen = []\ndef f():\n    seen.append(1)\n    return len(seen)\n";
        for _ in 0..2 {
            let out = rt.execute(code, "f", &Invocation::default()).await;
            assert_eq!(out.result, Some(json!(1)));
        }
    }

    #[tokio::test]
    async fn os_exit_without_envelope_is_reported() {
        let Some(rt) = runtime() else { return };
        let out = rt
            .execute("import os\ndef f():\n    os._exit(7)\n", "f", &Invocation::default())
            .await;
        let error = out.error.expect("fault");
        assert!(error.contains("before reporting a result"), "got: {error}");
    }

    #[tokio::test]
    async fn syntax_check_distinguishes_valid_and_invalid() {
        let Some(rt) = runtime() else { return };
        assert_eq!(
            rt.check_syntax("def f(x):\n    return x\n").await.unwrap(),
            SyntaxCheck::Valid
        );
        match rt.check_syntax("def f(:\n    return\n").await.unwrap() {
            SyntaxCheck::Invalid(msg) => assert!(msg.starts_with("SyntaxError")),
            SyntaxCheck::Valid => panic!("broken code accepted"),
        }
    }

    #[tokio::test]
    async fn missing_interpreter_is_a_harness_failure() {
        let rt = PythonRuntime::new(&RuntimeConfig {
            python_command: "definitely-not-a-python-binary".into(),
            working_dir: None,
        })
        .unwrap();
        let out = rt.execute("def f(): pass", "f", &Invocation::default()).await;
        let error = out.error.expect("spawn failure");
        assert!(error.starts_with("Exception:\nHarnessError:"), "got: {error}");
        assert!(rt.check_syntax("x = 1").await.is_err());
        assert!(matches!(
            rt.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[test]
    fn command_is_split_shell_style() {
        let rt = PythonRuntime::new(&RuntimeConfig {
            python_command: "uv run 'python 3'".into(),
            working_dir: None,
        })
        .unwrap();
        assert_eq!(rt.program, "uv");
        assert_eq!(rt.args, vec!["run", "python 3"]);
    }

    #[test]
    fn blank_command_is_rejected() {
        assert!(
            PythonRuntime::new(&RuntimeConfig {
                python_command: "  ".into(),
                working_dir: None,
            })
            .is_err()
        );
    }
}
