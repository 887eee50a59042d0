//! `HookResult`: what a hook returns after execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a hook wants to do after it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookAction {
    /// Proceed normally (with optional modifications).
    #[default]
    Continue,
    /// Stop the operation and show `message` to the user.
    Block,
    /// Skip silently: no error, no execution.
    Skip,
}

/// Result returned by a hook after execution.
///
/// Only the modification field relevant to the firing event should be set;
/// the dispatcher applies whichever one matches the event kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HookResult {
    /// What the hook wants to do.
    #[serde(default)]
    pub action: HookAction,
    /// Message to show the user, used when `action == Block`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Modified tool input, for `pre_tool_use`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_input: Option<Value>,
    /// Modified tool output, for `post_tool_use`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_output: Option<String>,
    /// Modified user message, for `pre_message`/`user_prompt_submit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_message: Option<String>,
    /// Modified LLM response, for `post_message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_response: Option<String>,
    /// A system message to inject into the conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_system_message: Option<String>,
}

impl HookResult {
    /// A plain continue result.
    #[must_use]
    pub fn continue_() -> Self {
        Self::default()
    }

    /// A block result with a message.
    #[must_use]
    pub fn block(message: impl Into<String>) -> Self {
        Self {
            action: HookAction::Block,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// A silent skip result.
    #[must_use]
    pub fn skip() -> Self {
        Self {
            action: HookAction::Skip,
            ..Self::default()
        }
    }

    /// Parse a hook result from a JSON value (script-hook stdout form).
    /// An unrecognized `action` falls back to `Continue`, matching the
    /// lenient parsing `HookResult.from_dict` performs.
    #[must_use]
    pub fn from_dict(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Serialize to a JSON value, omitting unset fields.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_continue() {
        assert_eq!(HookResult::continue_().action, HookAction::Continue);
    }

    #[test]
    fn from_dict_unknown_action_defaults_continue() {
        let r = HookResult::from_dict(&serde_json::json!({"action": "bogus"}));
        assert_eq!(r.action, HookAction::Continue);
    }

    #[test]
    fn round_trips_through_dict() {
        let r = HookResult::block("no bash");
        let d = r.to_dict();
        assert_eq!(d["action"], "block");
        assert_eq!(d["message"], "no bash");
        assert_eq!(HookResult::from_dict(&d), r);
    }

    #[test]
    fn to_dict_omits_none_fields() {
        let d = HookResult::continue_().to_dict();
        assert_eq!(d, serde_json::json!({"action": "continue"}));
    }
}
