//! `HookDefinition`: one executable interception registered against an
//! event, plus its matcher and timeout policy.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What to do when a hook's execution times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnTimeout {
    /// Treat a timeout as a block (the default).
    Block,
    /// Treat a timeout as a continue.
    Continue,
}

impl Default for OnTimeout {
    fn default() -> Self {
        Self::Block
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

/// Timeout policy for a single hook invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookTimeout {
    /// Seconds to wait before treating the hook as timed out.
    #[serde(default = "default_timeout_seconds")]
    pub seconds: u64,
    /// What to do when the timeout elapses.
    #[serde(default)]
    pub on_timeout: OnTimeout,
}

impl Default for HookTimeout {
    fn default() -> Self {
        Self {
            seconds: default_timeout_seconds(),
            on_timeout: OnTimeout::default(),
        }
    }
}

/// The executable form of a hook: a shell command, an external script, or a
/// reserved LLM-mediated prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum HookKind {
    /// A shell string executed with `sh -c`.
    Command {
        /// The shell command line.
        command: String,
    },
    /// A path to an executable invoked with the context JSON on stdin.
    Script {
        /// Path to the script.
        path: PathBuf,
    },
    /// A template string reserved for LLM-mediated hooks. Not executed
    /// today; dispatch treats it as an immediate continue.
    Prompt {
        /// The prompt template.
        template: String,
    },
}

/// One registered interception: match criteria, executable, and policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDefinition {
    /// Human-readable name, used in logs and as the default block message
    /// prefix.
    pub name: String,
    /// Message shown to the user when this hook blocks and provides none
    /// of its own (falls back to the child process's stderr).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Map of context path (e.g. `tool`, `tool_input.command`) to a regex
    /// that must match for this hook to fire. All entries must match.
    #[serde(
        default,
        rename = "match",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub match_: HashMap<String, String>,
    /// Timeout policy.
    #[serde(default)]
    pub timeout: HookTimeout,
    /// Whether this hook is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// The executable kind.
    #[serde(flatten)]
    pub kind: HookKind,
}

impl HookDefinition {
    /// Construct a command hook with default matcher/timeout/enabled.
    #[must_use]
    pub fn command(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: None,
            match_: HashMap::new(),
            timeout: HookTimeout::default(),
            enabled: true,
            kind: HookKind::Command {
                command: command.into(),
            },
        }
    }

    /// Construct a script hook.
    #[must_use]
    pub fn script(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            message: None,
            match_: HashMap::new(),
            timeout: HookTimeout::default(),
            enabled: true,
            kind: HookKind::Script { path: path.into() },
        }
    }

    /// Attach a match pattern, replacing any existing entry for the path.
    #[must_use]
    pub fn with_match(mut self, path: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.match_.insert(path.into(), pattern.into());
        self
    }

    /// Attach a block message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The `hooks.yaml` schema: `{version: 1, hooks: {event_name: [...]}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksManifest {
    /// Schema version; currently always 1.
    pub version: u32,
    /// Hook definitions keyed by event name (spec §6 `hooks.yaml`).
    pub hooks: HashMap<String, Vec<HookDefinition>>,
}
