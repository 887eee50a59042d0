//! Conversation log event types.
//!
//! Every line in a conversation log is a [`LogEvent`]: a monotonic
//! `event_number`, a UTC timestamp, and a type-specific [`EventPayload`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of an append-only conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Monotonically increasing, starting at 1.
    pub event_number: u64,
    /// UTC timestamp of when the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// The event's type-specific fields.
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// Where a context injection's content should be placed relative to the
/// base system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionLocation {
    /// Before the base prompt.
    SystemPromptPrepend,
    /// After the base prompt.
    SystemPromptAppend,
    /// As a synthetic user message rather than part of the system prompt.
    MessageInject,
}

/// The type-specific payload of a [`LogEvent`], tagged by `event_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A new session began.
    SessionStart {
        /// The session identifier.
        session_id: String,
        /// The active model.
        model: String,
        /// The active provider.
        provider: String,
    },
    /// The session ended.
    SessionEnd {
        /// Why the session ended.
        reason: String,
    },
    /// The base system prompt was established.
    ContextInit {
        /// The context version after this event (always 1).
        context_version: u64,
        /// The base system prompt, or `None` if redacted by private mode.
        base_prompt: Option<String>,
        /// 16-hex-char prefix of `SHA-256(base_prompt)`.
        content_hash: String,
    },
    /// Content was injected into the context.
    ContextInjection {
        /// The context version after this event.
        context_version: u64,
        /// What produced this injection (`rules`, `skill_metadata`, …).
        source: String,
        /// Where the content was placed.
        location: InjectionLocation,
        /// The injected content, or `None` if redacted by private mode.
        content: Option<String>,
        /// 16-hex-char prefix of `SHA-256(content)`.
        content_hash: String,
        /// Free-form origin tag (e.g. a skill name).
        #[serde(skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
        /// What kind of trigger caused this injection, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        trigger_type: Option<String>,
        /// The text that matched the trigger, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        trigger_match: Option<String>,
    },
    /// The fully-assembled system prompt became active.
    ContextReady {
        /// 16-hex-char prefix of `SHA-256` over the assembled prompt.
        prompt_hash: String,
    },
    /// A snapshot of the system prompt was recorded for later diffing.
    ContextCheckpoint {
        /// 16-hex-char prefix of `SHA-256(prompt)`.
        content_hash: String,
    },
    /// The context was reset to a new base prompt; `context_version`
    /// returns to 1.
    ContextReset {
        /// 16-hex-char prefix of `SHA-256(new_base)`.
        content_hash: String,
        /// Why the context was reset.
        reason: String,
    },
    /// The active model or provider changed mid-session.
    ModelSwitch {
        /// The newly active model.
        new_model: String,
        /// The newly active provider.
        new_provider: String,
        /// Why the switch happened.
        reason: String,
        /// Whether conversation context was preserved across the switch.
        preserve_context: bool,
    },
    /// A user message was recorded.
    UserMessage {
        /// The message text, or `None` if redacted by private mode.
        content: Option<String>,
        /// 16-hex-char prefix of `SHA-256(content)`.
        content_hash: String,
    },
    /// An assistant message was recorded.
    AssistantMessage {
        /// The message text, or `None` if redacted by private mode.
        content: Option<String>,
        /// 16-hex-char prefix of `SHA-256(content)`.
        content_hash: String,
    },
    /// A streamed assistant response finished.
    AssistantStreamEnd {
        /// Total tokens produced, if known.
        #[serde(skip_serializing_if = "Option::is_none")]
        output_tokens: Option<u64>,
    },
    /// The model requested a tool call.
    ToolCall {
        /// The tool's registered name.
        name: String,
        /// The tool call's input, as JSON.
        input: serde_json::Value,
        /// The provider-assigned call id.
        id: String,
        /// How the call was obtained (`native` or `recovered`).
        call_type: String,
    },
    /// A tool finished executing.
    ToolResult {
        /// The tool's registered name.
        name: String,
        /// Whether the tool reported success.
        success: bool,
        /// The tool's output, or `None` if redacted by private mode.
        output: Option<String>,
        /// 16-hex-char prefix of `SHA-256(output)`.
        content_hash: String,
        /// The provider-assigned call id this result answers.
        id: String,
    },
    /// A recoverable error surfaced during a turn (spec.md §7): provider
    /// failures are written here rather than aborting the process.
    Error {
        /// The error's display text, or `None` if redacted by private mode.
        message: Option<String>,
        /// 16-hex-char prefix of `SHA-256(message)`.
        content_hash: String,
        /// A short machine-readable error kind (e.g. `llm`).
        error_type: String,
    },
}

impl EventPayload {
    /// The `event_type` tag this payload serializes under.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionStart { .. } => "session_start",
            Self::SessionEnd { .. } => "session_end",
            Self::ContextInit { .. } => "context_init",
            Self::ContextInjection { .. } => "context_injection",
            Self::ContextReady { .. } => "context_ready",
            Self::ContextCheckpoint { .. } => "context_checkpoint",
            Self::ContextReset { .. } => "context_reset",
            Self::ModelSwitch { .. } => "model_switch",
            Self::UserMessage { .. } => "user_message",
            Self::AssistantMessage { .. } => "assistant_message",
            Self::AssistantStreamEnd { .. } => "assistant_stream_end",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Error { .. } => "error",
        }
    }

    /// The event's `context_version`, for events that carry one.
    #[must_use]
    pub fn context_version(&self) -> Option<u64> {
        match self {
            Self::ContextInit { context_version, .. }
            | Self::ContextInjection { context_version, .. } => Some(*context_version),
            _ => None,
        }
    }
}
