//! `HookManager`: registers hook chains and dispatches them.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use brynhild_core::HookEvent;
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::context::HookContext;
use crate::definition::{HookDefinition, HookKind, OnTimeout};
use crate::result::{HookAction, HookResult};

/// The outcome of dispatching a chain of hooks for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
    /// The terminal or accumulated action: `Continue` unless a hook in the
    /// chain blocked or skipped.
    pub action: HookAction,
    /// The block message, set only when `action == Block`.
    pub message: Option<String>,
    /// Modified tool input carried out of the chain.
    pub modified_input: Option<serde_json::Value>,
    /// Modified tool output carried out of the chain.
    pub modified_output: Option<String>,
    /// Modified user message carried out of the chain.
    pub modified_message: Option<String>,
    /// Modified LLM response carried out of the chain.
    pub modified_response: Option<String>,
    /// System messages injected by any hook in the chain, in firing order.
    pub injections: Vec<String>,
}

impl DispatchOutcome {
    /// Whether the chain blocked the operation.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.action == HookAction::Block
    }

    /// Whether the chain asked to skip silently.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.action == HookAction::Skip
    }
}

/// Holds ordered hook chains per event and dispatches them.
#[derive(Debug, Default)]
pub struct HookManager {
    chains: HashMap<HookEvent, Vec<HookDefinition>>,
}

impl HookManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for an event, appended to the end of its chain.
    pub fn register(&mut self, event: HookEvent, hook: HookDefinition) {
        self.chains.entry(event).or_default().push(hook);
    }

    /// The registered chain for an event, in firing order.
    #[must_use]
    pub fn chain(&self, event: HookEvent) -> &[HookDefinition] {
        self.chains.get(&event).map_or(&[], Vec::as_slice)
    }

    /// Dispatch all hooks registered for `event` against `context`,
    /// following the algorithm in spec.md §4.7.
    ///
    /// Session-lifecycle and error events never block or modify — this is
    /// enforced here regardless of what a hook returns, mirroring the
    /// "dispatcher validates and downgrades" rule.
    pub async fn dispatch(&self, event: HookEvent, context: &HookContext) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let Some(hooks) = self.chains.get(&event) else {
            return outcome;
        };

        let mut effective = context.clone();

        for hook in hooks {
            if !hook.enabled {
                continue;
            }
            if !matches(hook, &effective) {
                continue;
            }

            let result = execute_one(hook, &effective).await;

            if let Some(injection) = &result.inject_system_message {
                outcome.injections.push(injection.clone());
            }

            if result.action == HookAction::Block && event.can_block() {
                outcome.action = HookAction::Block;
                outcome.message = result.message.clone();
                return outcome;
            }

            if result.action == HookAction::Skip {
                outcome.action = HookAction::Skip;
                return outcome;
            }

            if event.can_modify() {
                if let Some(v) = result.modified_input.clone() {
                    effective.tool_input = Some(v.clone());
                    outcome.modified_input = Some(v);
                }
                if let Some(v) = result.modified_output.clone() {
                    outcome.modified_output = Some(v);
                }
                if let Some(v) = result.modified_message.clone() {
                    effective.message = Some(v.clone());
                    outcome.modified_message = Some(v);
                }
                if let Some(v) = result.modified_response.clone() {
                    effective.response = Some(v.clone());
                    outcome.modified_response = Some(v);
                }
            }
        }

        outcome
    }
}

fn matches(hook: &HookDefinition, context: &HookContext) -> bool {
    for (path, pattern) in &hook.match_ {
        let Some(value) = context.get_path(path) else {
            return false;
        };
        let text = match &value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let Ok(re) = Regex::new(pattern) else {
            warn!(hook = %hook.name, pattern = %pattern, "invalid matcher pattern, treating as no-match");
            return false;
        };
        if !re.is_match(&text) {
            return false;
        }
    }
    true
}

async fn execute_one(hook: &HookDefinition, context: &HookContext) -> HookResult {
    let duration = Duration::from_secs(hook.timeout.seconds);
    let outcome = tokio::time::timeout(duration, run_kind(hook, context)).await;

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            debug!(hook = %hook.name, error = %err, "hook execution errored, continuing");
            HookResult::continue_()
        }
        Err(_) => {
            warn!(hook = %hook.name, seconds = hook.timeout.seconds, "hook timed out");
            match hook.timeout.on_timeout {
                OnTimeout::Block => HookResult::block(
                    hook.message
                        .clone()
                        .unwrap_or_else(|| format!("hook {:?} timed out", hook.name)),
                ),
                OnTimeout::Continue => HookResult::continue_(),
            }
        }
    }
}

async fn run_kind(
    hook: &HookDefinition,
    context: &HookContext,
) -> Result<HookResult, std::io::Error> {
    match &hook.kind {
        HookKind::Command { command } => run_command(hook, command, context).await,
        HookKind::Script { path } => run_script(hook, path, context).await,
        HookKind::Prompt { .. } => {
            debug!(hook = %hook.name, "prompt hooks are not yet executed; treating as continue");
            Ok(HookResult::continue_())
        }
    }
}

async fn run_command(
    hook: &HookDefinition,
    command: &str,
    context: &HookContext,
) -> Result<HookResult, std::io::Error> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd.envs(context.to_env_vars());
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let output = cmd.output().await?;
    if output.status.success() {
        Ok(HookResult::continue_())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = hook.message.clone().unwrap_or(stderr);
        Ok(HookResult::block(message))
    }
}

async fn run_script(
    hook: &HookDefinition,
    path: &std::path::Path,
    context: &HookContext,
) -> Result<HookResult, std::io::Error> {
    let mut cmd = Command::new(path);
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(context.to_json().as_bytes()).await?;
        stdin.shutdown().await?;
    }

    let mut stdout = String::new();
    if let Some(mut out) = child.stdout.take() {
        out.read_to_string(&mut stdout).await?;
    }
    let mut stderr = String::new();
    if let Some(mut err) = child.stderr.take() {
        err.read_to_string(&mut stderr).await?;
    }
    let status = child.wait().await?;

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(stdout.trim()) {
        return Ok(HookResult::from_dict(&value));
    }

    if status.success() {
        Ok(HookResult::continue_())
    } else {
        let message = hook.message.clone().unwrap_or_else(|| stderr.trim().to_string());
        Ok(HookResult::block(message))
    }
}
