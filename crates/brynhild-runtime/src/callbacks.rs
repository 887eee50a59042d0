//! The UI-facing interface `ConversationProcessor` drives events through.
//!
//! A renderer/TUI implements this trait; the processor never knows what's
//! on the other end (spec.md §1, Renderer consumed via a callback
//! interface).

use async_trait::async_trait;
use brynhild_llm::{ToolUse, Usage};
use serde_json::Value;

/// Callbacks notified of every observable event during `run_turn`.
///
/// All methods have no-op defaults except [`is_cancelled`] (defaults to
/// never-cancelled) and [`request_tool_permission`] (defaults to
/// auto-approve), so a minimal implementation only needs to override what
/// it cares about.
///
/// [`is_cancelled`]: ConversationCallbacks::is_cancelled
/// [`request_tool_permission`]: ConversationCallbacks::request_tool_permission
#[async_trait]
pub trait ConversationCallbacks: Send + Sync {
    /// A new streaming round has opened with the provider.
    fn on_stream_start(&self) {}

    /// A chunk of reasoning/thinking text arrived.
    fn on_thinking_delta(&self, _text: &str) {}

    /// The thinking channel for this round is complete.
    fn on_thinking_complete(&self) {}

    /// A chunk of visible assistant text arrived.
    fn on_text_delta(&self, _text: &str) {}

    /// The text channel for this round is complete.
    fn on_text_complete(&self) {}

    /// The assistant requested a tool call, about to be dispatched.
    fn on_tool_call(&self, _tool_use: &ToolUse) {}

    /// A tool call finished (including synthetic results for blocked or
    /// denied calls).
    fn on_tool_result(&self, _name: &str, _success: bool, _output: &str) {}

    /// Token/cost accounting updated for this round.
    fn on_usage_update(&self, _usage: &Usage) {}

    /// Polled between stream events, between tool calls, and between
    /// hooks (spec.md §5). Returning `true` unwinds the current turn.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Ask the user whether a permission-requiring tool call may proceed.
    async fn request_tool_permission(&self, _tool_name: &str, _input: &Value) -> bool {
        true
    }
}
