//! `HookContext`: the data a hook sees about the current state.

use std::collections::HashMap;
use std::path::PathBuf;

use brynhild_core::HookEvent;
use serde_json::Value;

/// A completed tool execution, as seen by `post_tool_use` hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Whether the tool succeeded.
    pub success: bool,
    /// The tool's textual output.
    pub output: String,
}

/// Context passed to hooks about the current state.
///
/// Different events populate different fields; fields not relevant to the
/// firing event are left unset. Mirrors
/// `brynhild.hooks.events.HookContext` field-for-field.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// The event that triggered this dispatch.
    pub event: HookEvent,
    /// Current session identifier.
    pub session_id: String,
    /// Current working directory.
    pub cwd: PathBuf,

    /// Tool name (tool events).
    pub tool: Option<String>,
    /// Tool input (`pre_tool_use`).
    pub tool_input: Option<Value>,
    /// Tool result (`post_tool_use`).
    pub tool_result: Option<ToolOutcome>,

    /// User message (message events).
    pub message: Option<String>,
    /// LLM response (`post_message`).
    pub response: Option<String>,

    /// Error message (`error`).
    pub error: Option<String>,
    /// Error type name (`error`).
    pub error_type: Option<String>,

    /// Compaction strategy name (`pre_compact`).
    pub compaction_strategy: Option<String>,
}

impl HookContext {
    /// Construct a minimal context for a non-tool, non-message event.
    #[must_use]
    pub fn new(event: HookEvent, session_id: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            event,
            session_id: session_id.into(),
            cwd,
            tool: None,
            tool_input: None,
            tool_result: None,
            message: None,
            response: None,
            error: None,
            error_type: None,
            compaction_strategy: None,
        }
    }

    /// Attach tool name and input, for `pre_tool_use`.
    #[must_use]
    pub fn with_tool(mut self, tool: impl Into<String>, input: Value) -> Self {
        self.tool = Some(tool.into());
        self.tool_input = Some(input);
        self
    }

    /// Attach a tool result, for `post_tool_use`.
    #[must_use]
    pub fn with_tool_result(mut self, tool: impl Into<String>, result: ToolOutcome) -> Self {
        self.tool = Some(tool.into());
        self.tool_result = Some(result);
        self
    }

    /// Attach a user message, for `pre_message`/`user_prompt_submit`.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach an LLM response, for `post_message`.
    #[must_use]
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Attach error details, for `error`.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>, error_type: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.error_type = Some(error_type.into());
        self
    }

    /// Convert to a JSON-serializable map, omitting unset fields.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Map<String, Value> {
        let mut out = serde_json::Map::new();
        out.insert("event".into(), Value::String(self.event.as_str().into()));
        out.insert("session_id".into(), Value::String(self.session_id.clone()));
        out.insert(
            "cwd".into(),
            Value::String(self.cwd.to_string_lossy().into_owned()),
        );
        if let Some(tool) = &self.tool {
            out.insert("tool".into(), Value::String(tool.clone()));
        }
        if let Some(input) = &self.tool_input {
            out.insert("tool_input".into(), input.clone());
        }
        if let Some(result) = &self.tool_result {
            out.insert(
                "tool_result".into(),
                serde_json::json!({"success": result.success, "output": result.output}),
            );
        }
        if let Some(message) = &self.message {
            out.insert("message".into(), Value::String(message.clone()));
        }
        if let Some(response) = &self.response {
            out.insert("response".into(), Value::String(response.clone()));
        }
        if let Some(error) = &self.error {
            out.insert("error".into(), Value::String(error.clone()));
        }
        if let Some(error_type) = &self.error_type {
            out.insert("error_type".into(), Value::String(error_type.clone()));
        }
        if let Some(strategy) = &self.compaction_strategy {
            out.insert("compaction_strategy".into(), Value::String(strategy.clone()));
        }
        out
    }

    /// Serialize to a JSON string (the form fed to script hooks on stdin).
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.to_dict()).to_string()
    }

    /// Produce the `BRYNHILD_*` environment variables for command hooks.
    #[must_use]
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("BRYNHILD_EVENT".into(), self.event.as_str().into());
        env.insert("BRYNHILD_SESSION_ID".into(), self.session_id.clone());
        env.insert("BRYNHILD_CWD".into(), self.cwd.to_string_lossy().into_owned());
        if let Some(tool) = &self.tool {
            env.insert("BRYNHILD_TOOL_NAME".into(), tool.clone());
        }
        if let Some(input) = &self.tool_input {
            env.insert("BRYNHILD_TOOL_INPUT".into(), input.to_string());
        }
        if let Some(result) = &self.tool_result {
            env.insert("BRYNHILD_TOOL_OUTPUT".into(), result.output.clone());
            env.insert("BRYNHILD_TOOL_SUCCESS".into(), result.success.to_string());
        }
        if let Some(message) = &self.message {
            env.insert("BRYNHILD_MESSAGE".into(), message.clone());
        }
        if let Some(response) = &self.response {
            env.insert("BRYNHILD_RESPONSE".into(), response.clone());
        }
        if let Some(error) = &self.error {
            env.insert("BRYNHILD_ERROR".into(), error.clone());
        }
        if let Some(error_type) = &self.error_type {
            env.insert("BRYNHILD_ERROR_TYPE".into(), error_type.clone());
        }
        env
    }

    /// Look up a dotted path into this context's JSON form (e.g. `tool` or
    /// `tool_input.command`), used by `HookDefinition::match_`.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let root = Value::Object(self.to_dict());
        let mut cur = &root;
        for segment in path.split('.') {
            cur = cur.get(segment)?;
        }
        Some(cur.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> HookContext {
        HookContext::new(HookEvent::PreToolUse, "sess-1", PathBuf::from("/tmp"))
            .with_tool("Bash", serde_json::json!({"command": "ls"}))
    }

    #[test]
    fn to_dict_omits_unset_fields() {
        let c = HookContext::new(HookEvent::SessionStart, "sess-1", PathBuf::from("/tmp"));
        let d = c.to_dict();
        assert_eq!(d.get("event").unwrap(), "session_start");
        assert!(!d.contains_key("tool"));
        assert!(!d.contains_key("tool_input"));
    }

    #[test]
    fn to_env_vars_serializes_tool_input_as_json() {
        let env = ctx().to_env_vars();
        assert_eq!(env["BRYNHILD_EVENT"], "pre_tool_use");
        assert_eq!(env["BRYNHILD_TOOL_NAME"], "Bash");
        let parsed: Value = serde_json::from_str(&env["BRYNHILD_TOOL_INPUT"]).unwrap();
        assert_eq!(parsed["command"], "ls");
    }

    #[test]
    fn get_path_navigates_nested_tool_input() {
        let c = ctx();
        assert_eq!(c.get_path("tool").unwrap(), "Bash");
        assert_eq!(c.get_path("tool_input.command").unwrap(), "ls");
        assert!(c.get_path("tool_input.missing").is_none());
    }
}
