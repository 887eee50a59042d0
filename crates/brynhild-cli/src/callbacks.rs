//! Terminal rendering of a turn's events (spec.md §1's renderer boundary).

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use brynhild_llm::{ToolUse, Usage};
use brynhild_runtime::ConversationCallbacks;
use serde_json::Value;

/// Prints streamed text/thinking/tool events to stdout as they arrive.
///
/// In `interactive` mode, permission requests are asked on stdin; in
/// non-interactive mode (`-p`/piped stdin) they are auto-denied, since
/// there is no terminal to ask.
pub struct TerminalCallbacks {
    interactive: bool,
    cancelled: AtomicBool,
}

impl TerminalCallbacks {
    /// Create a new callback sink. `interactive` controls whether
    /// permission prompts are asked on stdin or auto-denied.
    #[must_use]
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Mark the turn as cancelled; the processor checks this between
    /// rounds/tool calls/hooks.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConversationCallbacks for TerminalCallbacks {
    fn on_stream_start(&self) {}

    fn on_thinking_delta(&self, text: &str) {
        eprint!("{text}");
        let _ = io::stderr().flush();
    }

    fn on_thinking_complete(&self) {
        eprintln!();
    }

    fn on_text_delta(&self, text: &str) {
        print!("{text}");
        let _ = io::stdout().flush();
    }

    fn on_text_complete(&self) {
        println!();
    }

    fn on_tool_call(&self, tool_use: &ToolUse) {
        eprintln!("  -> {}({})", tool_use.name, tool_use.input);
    }

    fn on_tool_result(&self, name: &str, success: bool, output: &str) {
        let marker = if success { "ok" } else { "error" };
        let preview: String = output.chars().take(200).collect();
        eprintln!("  <- {name} [{marker}] {preview}");
    }

    fn on_usage_update(&self, usage: &Usage) {
        tracing::debug!(input = usage.input_tokens, output = usage.output_tokens, "usage update");
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn request_tool_permission(&self, tool_name: &str, input: &Value) -> bool {
        if !self.interactive {
            eprintln!("refusing permission-requiring tool '{tool_name}' in non-interactive mode");
            return false;
        }
        eprint!("allow {tool_name}({input})? [y/N] ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}
