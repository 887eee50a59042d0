//! Message, tool, and streaming types shared at the provider boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in the conversation's message list.
///
/// Canonicalizes the source's two tool-result role spellings (`tool` and
/// `tool_result`) to a single `ToolResult` variant; a provider adapter that
/// speaks a wire format distinguishing the two converts at its own boundary,
/// never here (spec.md Open Questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// Leading instructions. At most one, and if present it is first.
    System {
        /// The system prompt text.
        content: String,
    },
    /// A user turn.
    User {
        /// The user's text.
        content: String,
    },
    /// An assistant turn: free text, tool calls, or both.
    Assistant {
        /// Text content, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Tool calls requested in this turn.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolUse>,
    },
    /// The result of executing one tool call.
    ToolResult {
        /// The `ToolUse::id` this result answers.
        tool_call_id: String,
        /// The textual result body.
        content: String,
        /// Whether the tool execution succeeded.
        #[serde(default = "default_true")]
        success: bool,
    },
}

fn default_true() -> bool {
    true
}

impl Message {
    /// Construct a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Construct a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Construct a text-only assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Construct an assistant message carrying tool calls (and optional
    /// accompanying text).
    #[must_use]
    pub fn assistant_with_tool_calls(content: Option<String>, tool_calls: Vec<ToolUse>) -> Self {
        Self::Assistant {
            content,
            tool_calls,
        }
    }

    /// Construct a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>, success: bool) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            success,
        }
    }

    /// The wire/log role name: `system`, `user`, `assistant`, or
    /// `tool_result`.
    #[must_use]
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::ToolResult { .. } => "tool_result",
        }
    }

    /// The text content of a `System`, `User`, or `Assistant` message, if
    /// any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::User { content } => Some(content),
            Self::Assistant { content, .. } => content.as_deref(),
            Self::ToolResult { .. } => None,
        }
    }

    /// The tool calls carried by an `Assistant` message, if any.
    #[must_use]
    pub fn tool_calls(&self) -> &[ToolUse] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// A structured request from the model to execute a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    /// Unique call id; provider-issued for native calls, `recovered-<uuid>`
    /// for calls promoted out of thinking text.
    pub id: String,
    /// The tool name requested.
    pub name: String,
    /// The tool's input, as parsed JSON.
    pub input: Value,
    /// Set when this call was promoted by `brynhild-tools`' `ToolRecovery`
    /// rather than emitted natively by the provider.
    #[serde(default)]
    pub is_recovered: bool,
    /// Provider-specific extension data carried through untouched (e.g. a
    /// thought signature some providers attach to native tool calls).
    /// Preserves round-trip fidelity without the core needing to know what
    /// it means.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl ToolUse {
    /// Construct a native tool use.
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            is_recovered: false,
            extra: None,
        }
    }
}

/// A tool's schema, as presented to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool's name.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema for the tool's input.
    pub input_schema: Value,
}

/// Token/cost accounting for one provider call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Input (prompt) tokens.
    pub input_tokens: u64,
    /// Output (completion) tokens.
    pub output_tokens: u64,
    /// Reasoning/thinking tokens, if the provider reports them separately.
    #[serde(default)]
    pub reasoning_tokens: u64,
    /// Estimated cost in USD, if the provider or profile supplies pricing.
    #[serde(default)]
    pub cost: Option<f64>,
}

/// One event in a provider's streaming response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A chunk of reasoning/thinking text.
    ThinkingDelta {
        /// The text chunk.
        text: String,
    },
    /// The thinking channel for this round is complete.
    ThinkingComplete,
    /// A chunk of visible assistant text.
    TextDelta {
        /// The text chunk.
        text: String,
    },
    /// The text channel for this round is complete.
    TextComplete,
    /// A native tool call.
    ToolUse(ToolUse),
    /// One content block (thinking, text, or tool use) has finished.
    ContentStop,
    /// The provider has stopped generating for this round.
    MessageStop {
        /// Why generation stopped, if the provider reports it (e.g.
        /// `end_turn`, `tool_use`, `max_tokens`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Token usage for this round.
    Usage(Usage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_role_names_match_spec() {
        assert_eq!(Message::system("s").role(), "system");
        assert_eq!(Message::user("u").role(), "user");
        assert_eq!(Message::assistant("a").role(), "assistant");
        assert_eq!(
            Message::tool_result("id-1", "ok", true).role(),
            "tool_result"
        );
    }

    #[test]
    fn assistant_with_tool_calls_round_trips_json() {
        let tu = ToolUse::new("call-1", "Bash", serde_json::json!({"command": "ls"}));
        let msg = Message::assistant_with_tool_calls(None, vec![tu.clone()]);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tool_calls(), &[tu]);
    }

    #[test]
    fn recovered_tool_use_preserves_flag_through_json() {
        let mut tu = ToolUse::new("recovered-abc", "semantic_search", serde_json::json!({}));
        tu.is_recovered = true;
        let json = serde_json::to_value(&tu).unwrap();
        let back: ToolUse = serde_json::from_value(json).unwrap();
        assert!(back.is_recovered);
    }
}
