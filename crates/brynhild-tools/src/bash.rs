//! The bash tool: runs shell commands with a persistent working directory
//! and a default-deny environment variable policy.

use std::path::PathBuf;

use brynhild_core::env_policy::is_allowed_bash_env;
use serde_json::Value;
use tokio::process::Command;

use crate::context::ToolContext;
use crate::error::{ToolError, ToolResult};
use crate::registry::BuiltinTool;

/// Default timeout in milliseconds (2 minutes).
const DEFAULT_TIMEOUT_MS: u64 = 120_000;
/// Maximum timeout in milliseconds (10 minutes), per spec.md §6 CLI notes.
const MAX_TIMEOUT_MS: u64 = 600_000;
/// Sentinel marking the boundary between command output and the
/// post-command working directory in the wrapped script's stdout.
const CWD_SENTINEL: &str = "__BRYNHILD_CWD__";

/// Executes shell commands via a configurable-timeout, sandboxed-cwd shell.
pub struct BashTool;

#[async_trait::async_trait]
impl BuiltinTool for BashTool {
    fn name(&self) -> &'static str {
        "bash"
    }

    fn description(&self) -> &'static str {
        "Executes a bash command. The working directory persists between invocations. \
         Optional timeout in milliseconds (default 120000, max 600000)."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {"type": "string", "description": "The bash command to execute"},
                "timeout": {"type": "integer", "description": "Timeout in milliseconds"}
            },
            "required": ["command"]
        })
    }

    fn requires_permission(&self) -> bool {
        true
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let command = args
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("command is required".into()))?;

        let timeout_ms = args
            .get("timeout")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TIMEOUT_MS)
            .min(MAX_TIMEOUT_MS);

        let cwd = ctx.cwd.read().await.clone();
        let wrapped = format!(
            "{command}\n__BRYNHILD_EXIT__=$?\necho \"{CWD_SENTINEL}\"\npwd\nexit $__BRYNHILD_EXIT__"
        );

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            run_bash(&wrapped, &cwd),
        )
        .await;

        match result {
            Ok(Ok((stdout, stderr, exit_code))) => {
                let (output, new_cwd) = parse_sentinel_output(&stdout);
                if let Some(new_cwd) = new_cwd {
                    *ctx.cwd.write().await = new_cwd;
                }

                let mut text = String::new();
                if !output.is_empty() {
                    text.push_str(&output);
                }
                if !stderr.is_empty() {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str("STDERR:\n");
                    text.push_str(&stderr);
                }
                if exit_code != 0 {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&format!("(exit code: {exit_code})"));
                }
                if text.is_empty() {
                    text.push_str("(no output)");
                }
                Ok(text)
            }
            Ok(Err(e)) => Err(ToolError::ExecutionFailed(e.to_string())),
            Err(_) => Err(ToolError::Timeout(timeout_ms)),
        }
    }
}

async fn run_bash(command: &str, cwd: &std::path::Path) -> std::io::Result<(String, String, i32)> {
    let mut cmd = Command::new("bash");
    cmd.arg("-c").arg(command).current_dir(cwd);

    cmd.env_clear();
    for (key, value) in std::env::vars() {
        if is_allowed_bash_env(&key) {
            cmd.env(key, value);
        }
    }

    let output = cmd.output().await?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);
    Ok((stdout, stderr, exit_code))
}

fn parse_sentinel_output(stdout: &str) -> (String, Option<PathBuf>) {
    if let Some(pos) = stdout.find(CWD_SENTINEL) {
        let output = stdout[..pos].trim_end().to_string();
        let after = &stdout[pos + CWD_SENTINEL.len()..];
        let new_cwd = after.lines().find(|l| !l.is_empty()).map(|l| PathBuf::from(l.trim()));
        (output, new_cwd)
    } else {
        (stdout.to_string(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    #[tokio::test]
    async fn echoes_stdout() {
        let r = BashTool
            .execute(serde_json::json!({"command": "echo hello"}), &ctx())
            .await
            .unwrap();
        assert!(r.contains("hello"));
    }

    #[tokio::test]
    async fn reports_nonzero_exit_code() {
        let r = BashTool
            .execute(serde_json::json!({"command": "exit 7"}), &ctx())
            .await
            .unwrap();
        assert!(r.contains("exit code: 7"));
    }

    #[tokio::test]
    async fn captures_stderr() {
        let r = BashTool
            .execute(serde_json::json!({"command": "echo oops >&2"}), &ctx())
            .await
            .unwrap();
        assert!(r.contains("STDERR:"));
        assert!(r.contains("oops"));
    }

    #[tokio::test]
    async fn cwd_persists_across_calls() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf());

        BashTool
            .execute(serde_json::json!({"command": "cd sub"}), &ctx)
            .await
            .unwrap();
        assert!(ctx.cwd.read().await.ends_with("sub"));

        let r = BashTool
            .execute(serde_json::json!({"command": "pwd"}), &ctx)
            .await
            .unwrap();
        assert!(r.contains("sub"));
    }

    #[tokio::test]
    async fn times_out_long_commands() {
        let r = BashTool
            .execute(serde_json::json!({"command": "sleep 5", "timeout": 50}), &ctx())
            .await;
        assert!(matches!(r, Err(ToolError::Timeout(50))));
    }

    #[tokio::test]
    async fn strips_credential_like_env_vars() {
        std::env::set_var("BRYNHILD_TEST_SECRET_TOKEN", "shh");
        let r = BashTool
            .execute(
                serde_json::json!({"command": "echo \"[$BRYNHILD_TEST_SECRET_TOKEN]\""}),
                &ctx(),
            )
            .await
            .unwrap();
        std::env::remove_var("BRYNHILD_TEST_SECRET_TOKEN");
        assert!(r.contains("[]"));
    }
}
