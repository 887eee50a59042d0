//! `ConversationProcessor`: the streaming tool-calling event loop
//! (spec.md §4.16).

use std::collections::HashSet;
use std::path::PathBuf;

use brynhild_core::HookEvent;
use brynhild_hooks::{HookContext, HookManager, ToolOutcome};
use brynhild_llm::{LlmProvider, Message, StreamEvent, ToolUse, Usage};
use brynhild_logger::ConversationLogger;
use brynhild_skills::{preprocess, PreprocessOutcome, SkillRegistry};
use brynhild_tools::{try_recover_tool_call_from_thinking, BuiltinTool, ToolContext, ToolRegistry};
use futures::StreamExt;
use tracing::warn;

use crate::callbacks::ConversationCallbacks;
use crate::error::{RuntimeError, RuntimeResult};
use crate::validator::MessageValidator;

const DEFAULT_MAX_ROUNDS: u32 = 25;
const GUIDANCE_PREFIX: &str = "[System guidance]";

/// What a completed `run_turn` call produced.
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// The final assistant text, if the turn produced one (a turn that was
    /// cancelled mid-stream may have none).
    pub final_text: Option<String>,
    /// How many provider round-trips the turn took.
    pub rounds: u32,
    /// Accumulated usage across every round of the turn.
    pub usage: Usage,
    /// Whether the turn ended because `callbacks.is_cancelled()` returned
    /// `true`.
    pub cancelled: bool,
}

/// Drives one session's conversation: owns the message list and the
/// queue of hook/stuck-detection injections pending flush, and runs the
/// streaming tool-call loop against a provider, a tool registry, and a
/// hook manager.
pub struct ConversationProcessor {
    session_id: String,
    cwd: PathBuf,
    max_rounds: u32,
    finish_tools: HashSet<String>,
    messages: Vec<Message>,
    pending_injections: Vec<String>,
}

impl ConversationProcessor {
    /// Construct a processor for a fresh or resumed session.
    #[must_use]
    pub fn new(session_id: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            session_id: session_id.into(),
            cwd,
            max_rounds: DEFAULT_MAX_ROUNDS,
            finish_tools: HashSet::new(),
            messages: Vec::new(),
            pending_injections: Vec::new(),
        }
    }

    /// Cap the number of provider round-trips a single `run_turn` call may
    /// take before returning [`RuntimeError::MaxRoundsExceeded`].
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Register a tool name that ends the turn when called, regardless of
    /// whether the provider keeps streaming tool calls.
    #[must_use]
    pub fn with_finish_tool(mut self, name: impl Into<String>) -> Self {
        self.finish_tools.insert(name.into());
        self
    }

    /// The current message list, in conversation order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Replace the message list wholesale, e.g. when resuming a persisted
    /// session.
    pub fn load_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Injections queued by hooks but not yet flushed into the message
    /// list.
    #[must_use]
    pub fn pending_injections(&self) -> &[String] {
        &self.pending_injections
    }

    /// Run one user turn to completion: preflight hooks and validation,
    /// the streaming tool-call loop, and stream-complete bookkeeping.
    ///
    /// # Errors
    /// Returns [`RuntimeError::HookBlocked`] if `USER_PROMPT_SUBMIT` or
    /// `PRE_MESSAGE` blocks, [`RuntimeError::UnknownSkill`] if the message
    /// names an unregistered skill, [`RuntimeError::Validation`] if the
    /// message list fails strict structural validation, and
    /// [`RuntimeError::MaxRoundsExceeded`] if the turn never reaches a
    /// terminal state within the configured round budget. A provider
    /// stream failure does not return `Err`: per spec.md §7 it is written
    /// into the conversation as an error assistant message and the turn
    /// ends normally (see [`TurnOutcome`]).
    #[allow(clippy::too_many_arguments)]
    pub async fn run_turn(
        &mut self,
        user_message: &str,
        system_prompt: &str,
        provider: &dyn LlmProvider,
        tools: &ToolRegistry,
        tool_ctx: &ToolContext,
        hooks: &HookManager,
        skills: &SkillRegistry,
        mut logger: Option<&mut ConversationLogger>,
        callbacks: &dyn ConversationCallbacks,
    ) -> RuntimeResult<TurnOutcome> {
        self.preflight(user_message, hooks, skills, logger.as_deref_mut())
            .await?;

        let mut total_usage = Usage::default();
        let mut rounds = 0u32;

        loop {
            if rounds >= self.max_rounds {
                return Err(RuntimeError::MaxRoundsExceeded(self.max_rounds));
            }
            rounds += 1;

            self.flush_pending_injections();

            let tool_defs = tools.native_definitions();
            callbacks.on_stream_start();
            let mut stream = match provider.stream(&self.messages, system_prompt, &tool_defs).await {
                Ok(stream) => stream,
                Err(err) => {
                    return self
                        .recover_from_llm_error(err, total_usage, rounds, hooks, logger)
                        .await;
                }
            };

            let mut thinking_text = String::new();
            let mut text_buffer = String::new();
            let mut tool_uses: Vec<ToolUse> = Vec::new();
            let mut cancelled = false;
            let mut stream_error = None;

            while let Some(event) = stream.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        stream_error = Some(err);
                        break;
                    }
                };
                match event {
                    StreamEvent::ThinkingDelta { text } => {
                        callbacks.on_thinking_delta(&text);
                        thinking_text.push_str(&text);
                    }
                    StreamEvent::ThinkingComplete => callbacks.on_thinking_complete(),
                    StreamEvent::TextDelta { text } => {
                        callbacks.on_text_delta(&text);
                        text_buffer.push_str(&text);
                    }
                    StreamEvent::TextComplete => callbacks.on_text_complete(),
                    StreamEvent::ToolUse(tool_use) => tool_uses.push(tool_use),
                    StreamEvent::ContentStop | StreamEvent::MessageStop { .. } => {}
                    StreamEvent::Usage(usage) => {
                        total_usage.input_tokens += usage.input_tokens;
                        total_usage.output_tokens += usage.output_tokens;
                        total_usage.reasoning_tokens += usage.reasoning_tokens;
                        if let Some(cost) = usage.cost {
                            total_usage.cost = Some(total_usage.cost.unwrap_or(0.0) + cost);
                        }
                        callbacks.on_usage_update(&usage);
                    }
                }

                if callbacks.is_cancelled() {
                    cancelled = true;
                    break;
                }
            }

            if let Some(err) = stream_error {
                return self
                    .recover_from_llm_error(err, total_usage, rounds, hooks, logger)
                    .await;
            }

            if cancelled {
                log_best_effort(logger.as_deref_mut(), |l| {
                    l.log_assistant_stream_end(Some(total_usage.output_tokens))
                });
                return Ok(TurnOutcome {
                    final_text: (!text_buffer.is_empty()).then_some(text_buffer),
                    rounds,
                    usage: total_usage,
                    cancelled: true,
                });
            }

            if tool_uses.is_empty() && !thinking_text.is_empty() {
                if let Some(recovery) = try_recover_tool_call_from_thinking(&thinking_text, tools)
                {
                    tool_uses.push(recovery.tool_use);
                }
            }

            if tool_uses.is_empty() {
                if text_buffer.is_empty() {
                    return Ok(TurnOutcome {
                        final_text: None,
                        rounds,
                        usage: total_usage,
                        cancelled: false,
                    });
                }
                return self
                    .finish_turn(text_buffer, total_usage, rounds, hooks, logger)
                    .await;
            }

            let reached_finish = self
                .dispatch_tool_calls(
                    tool_uses,
                    text_buffer,
                    tools,
                    tool_ctx,
                    hooks,
                    logger.as_deref_mut(),
                    callbacks,
                )
                .await?;

            if let Some(final_text) = reached_finish {
                return self
                    .finish_turn(final_text, total_usage, rounds, hooks, logger)
                    .await;
            }
        }
    }

    async fn preflight(
        &mut self,
        user_message: &str,
        hooks: &HookManager,
        skills: &SkillRegistry,
        mut logger: Option<&mut ConversationLogger>,
    ) -> RuntimeResult<()> {
        let submit_ctx = HookContext::new(HookEvent::UserPromptSubmit, self.session_id.clone(), self.cwd.clone())
            .with_message(user_message);
        let submit_outcome = hooks.dispatch(HookEvent::UserPromptSubmit, &submit_ctx).await;
        if submit_outcome.is_blocked() {
            return Err(RuntimeError::HookBlocked(
                submit_outcome.message.unwrap_or_default(),
            ));
        }
        self.pending_injections.extend(submit_outcome.injections);
        let effective_message = submit_outcome
            .modified_message
            .unwrap_or_else(|| user_message.to_string());

        let final_text = match preprocess(skills, &effective_message) {
            PreprocessOutcome::Unchanged => effective_message,
            PreprocessOutcome::Triggered {
                injection,
                remaining_message,
                ..
            } => {
                if remaining_message.is_empty() {
                    injection
                } else {
                    format!("{injection}\n\n{remaining_message}")
                }
            }
            PreprocessOutcome::UnknownSkill { requested } => {
                return Err(RuntimeError::UnknownSkill(requested));
            }
        };

        log_best_effort(logger.as_deref_mut(), |l| l.log_user_message(&final_text));
        self.messages.push(Message::user(final_text));

        MessageValidator::validate_strict(&self.messages)?;

        self.flush_pending_injections();

        let message_ctx = HookContext::new(HookEvent::PreMessage, self.session_id.clone(), self.cwd.clone())
            .with_message(self.messages.last().and_then(Message::text).unwrap_or_default());
        let message_outcome = hooks.dispatch(HookEvent::PreMessage, &message_ctx).await;
        if message_outcome.is_blocked() {
            return Err(RuntimeError::HookBlocked(
                message_outcome.message.unwrap_or_default(),
            ));
        }
        if let Some(modified) = message_outcome.modified_message {
            if let Some(Message::User { content }) = self.messages.last_mut() {
                *content = modified;
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch_tool_calls(
        &mut self,
        tool_uses: Vec<ToolUse>,
        text_buffer: String,
        tools: &ToolRegistry,
        tool_ctx: &ToolContext,
        hooks: &HookManager,
        mut logger: Option<&mut ConversationLogger>,
        callbacks: &dyn ConversationCallbacks,
    ) -> RuntimeResult<Option<String>> {
        let assistant_text = (!text_buffer.is_empty()).then_some(text_buffer);
        self.messages.push(Message::assistant_with_tool_calls(
            assistant_text.clone(),
            tool_uses.clone(),
        ));

        let mut reached_finish = false;

        for tool_use in &tool_uses {
            if callbacks.is_cancelled() {
                break;
            }

            let pre_ctx = HookContext::new(HookEvent::PreToolUse, self.session_id.clone(), self.cwd.clone())
                .with_tool(tool_use.name.clone(), tool_use.input.clone());
            let pre_outcome = hooks.dispatch(HookEvent::PreToolUse, &pre_ctx).await;
            self.pending_injections.extend(pre_outcome.injections.clone());

            if pre_outcome.is_blocked() {
                let message = pre_outcome
                    .message
                    .unwrap_or_else(|| "blocked by pre_tool_use hook".to_string());
                self.record_tool_outcome(tool_use, false, &message, logger.as_deref_mut());
                callbacks.on_tool_result(&tool_use.name, false, &message);
                continue;
            }

            let input = pre_outcome.modified_input.unwrap_or_else(|| tool_use.input.clone());
            callbacks.on_tool_call(tool_use);

            let tool = tools.get(&tool_use.name);

            let (success, output) = if let Some(tool) = tool {
                if tool.requires_permission() && !tool_ctx.auto_approve {
                    let approved = callbacks
                        .request_tool_permission(&tool_use.name, &input)
                        .await;
                    if !approved {
                        (false, "Permission denied".to_string())
                    } else {
                        run_tool(tool, input, tool_ctx).await
                    }
                } else {
                    run_tool(tool, input, tool_ctx).await
                }
            } else {
                (false, format!("unknown tool: {}", tool_use.name))
            };

            let post_ctx = HookContext::new(HookEvent::PostToolUse, self.session_id.clone(), self.cwd.clone())
                .with_tool_result(tool_use.name.clone(), ToolOutcome { success, output: output.clone() });
            let post_outcome = hooks.dispatch(HookEvent::PostToolUse, &post_ctx).await;
            self.pending_injections.extend(post_outcome.injections.clone());
            let final_output = post_outcome.modified_output.unwrap_or(output);

            self.record_tool_outcome(tool_use, success, &final_output, logger.as_deref_mut());
            callbacks.on_tool_result(&tool_use.name, success, &final_output);

            if self.finish_tools.contains(&tool_use.name) {
                reached_finish = true;
            }
        }

        Ok(reached_finish.then(|| assistant_text.unwrap_or_default()))
    }

    /// Flush any queued hook/stuck-detection injections into a single
    /// synthetic user message, prefixed with `[System guidance]`
    /// (spec.md §4.16 "Pending injections"). A no-op when nothing is
    /// queued. Called once in preflight before the first round, and again
    /// at the top of every subsequent round so injections queued by
    /// `PRE_TOOL_USE`/`POST_TOOL_USE` hooks during tool dispatch reach the
    /// next provider call exactly once.
    fn flush_pending_injections(&mut self) {
        if self.pending_injections.is_empty() {
            return;
        }
        let combined = self.pending_injections.join("\n\n");
        self.pending_injections.clear();
        self.messages
            .push(Message::user(format!("{GUIDANCE_PREFIX} {combined}")));
    }

    fn record_tool_outcome(
        &mut self,
        tool_use: &ToolUse,
        success: bool,
        output: &str,
        mut logger: Option<&mut ConversationLogger>,
    ) {
        let call_type = if tool_use.is_recovered { "recovered" } else { "native" };
        log_best_effort(logger.as_deref_mut(), |l| {
            l.log_tool_call(&tool_use.name, tool_use.input.clone(), &tool_use.id, call_type)
        });
        log_best_effort(logger.as_deref_mut(), |l| {
            l.log_tool_result(&tool_use.name, success, output, &tool_use.id)
        });
        self.messages
            .push(Message::tool_result(tool_use.id.clone(), output.to_string(), success));
    }

    /// Handle a provider/network failure (spec.md §7): write an error
    /// assistant message into the conversation, log an `error` event, fire
    /// the informational `ERROR` hook, and end the turn cleanly rather than
    /// propagating the failure to the caller.
    async fn recover_from_llm_error(
        &mut self,
        err: brynhild_llm::LlmError,
        usage: Usage,
        rounds: u32,
        hooks: &HookManager,
        mut logger: Option<&mut ConversationLogger>,
    ) -> RuntimeResult<TurnOutcome> {
        let message = err.to_string();
        warn!(error = %message, "provider stream failed");

        let error_ctx = HookContext::new(HookEvent::Error, self.session_id.clone(), self.cwd.clone())
            .with_error(message.clone(), "llm");
        hooks.dispatch(HookEvent::Error, &error_ctx).await;

        log_best_effort(logger.as_deref_mut(), |l| l.log_error(&message, "llm"));

        let final_text = format!("An error occurred: {message}");
        self.messages.push(Message::assistant(final_text.clone()));
        log_best_effort(logger.as_deref_mut(), |l| l.log_assistant_message(&final_text));

        Ok(TurnOutcome {
            final_text: Some(final_text),
            rounds,
            usage,
            cancelled: false,
        })
    }

    async fn finish_turn(
        &mut self,
        text: String,
        usage: Usage,
        rounds: u32,
        hooks: &HookManager,
        mut logger: Option<&mut ConversationLogger>,
    ) -> RuntimeResult<TurnOutcome> {
        let response_ctx = HookContext::new(HookEvent::PostMessage, self.session_id.clone(), self.cwd.clone())
            .with_response(text.clone());
        let response_outcome = hooks.dispatch(HookEvent::PostMessage, &response_ctx).await;
        let final_text = response_outcome.modified_response.unwrap_or(text);

        self.messages.push(Message::assistant(final_text.clone()));
        log_best_effort(logger.as_deref_mut(), |l| l.log_assistant_message(&final_text));

        Ok(TurnOutcome {
            final_text: Some(final_text),
            rounds,
            usage,
            cancelled: false,
        })
    }
}

async fn run_tool(
    tool: &dyn brynhild_tools::BuiltinTool,
    input: serde_json::Value,
    tool_ctx: &ToolContext,
) -> (bool, String) {
    match tool.execute(input, tool_ctx).await {
        Ok(output) => (true, output),
        Err(err) => (false, err.to_string()),
    }
}

fn log_best_effort<F>(logger: Option<&mut ConversationLogger>, write: F)
where
    F: FnOnce(&mut ConversationLogger) -> brynhild_logger::LogResult<()>,
{
    if let Some(logger) = logger {
        if let Err(err) = write(logger) {
            warn!(error = %err, "conversation log write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use brynhild_hooks::HookDefinition;
    use brynhild_llm::{LlmError, StreamBox};
    use brynhild_skills::SkillRegistry;
    use brynhild_tools::ToolContext;
    use futures::stream;
    use serde_json::json;

    use super::*;

    /// Replays a fixed, per-call sequence of rounds. Each round is one
    /// `Vec<StreamEvent>`; the N-th call to `stream()` replays the N-th
    /// round, so a test can script a multi-turn tool-calling exchange.
    struct ScriptedProvider {
        rounds: Mutex<Vec<Vec<Result<StreamEvent, LlmError>>>>,
    }

    impl ScriptedProvider {
        fn new(rounds: Vec<Vec<Result<StreamEvent, LlmError>>>) -> Self {
            Self {
                rounds: Mutex::new(rounds),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        fn max_context_tokens(&self) -> usize {
            100_000
        }

        async fn stream(
            &self,
            _messages: &[Message],
            _system: &str,
            _tools: &[brynhild_llm::ToolDefinition],
        ) -> Result<StreamBox, LlmError> {
            let mut rounds = self.rounds.lock().unwrap();
            if rounds.is_empty() {
                return Err(LlmError::Rejected("no more scripted rounds".into()));
            }
            let events = rounds.remove(0);
            Ok(Box::pin(stream::iter(events)))
        }
    }

    fn text_round(text: &str) -> Vec<Result<StreamEvent, LlmError>> {
        vec![
            Ok(StreamEvent::TextDelta { text: text.to_string() }),
            Ok(StreamEvent::TextComplete),
            Ok(StreamEvent::MessageStop {
                reason: Some("end_turn".to_string()),
            }),
        ]
    }

    fn tool_call_round(id: &str, name: &str, input: serde_json::Value) -> Vec<Result<StreamEvent, LlmError>> {
        vec![
            Ok(StreamEvent::ToolUse(ToolUse::new(id, name, input))),
            Ok(StreamEvent::MessageStop {
                reason: Some("tool_use".to_string()),
            }),
        ]
    }

    struct EchoTool;

    #[async_trait]
    impl BuiltinTool for EchoTool {
        fn name(&self) -> &'static str {
            "Bash"
        }

        fn description(&self) -> &'static str {
            "runs a shell command"
        }

        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"command": {"type": "string"}}})
        }

        async fn execute(&self, args: serde_json::Value, _ctx: &ToolContext) -> brynhild_tools::ToolResult {
            Ok(format!("ran: {}", args["command"].as_str().unwrap_or_default()))
        }
    }

    struct NoopCallbacks;

    #[async_trait]
    impl ConversationCallbacks for NoopCallbacks {}

    fn empty_skills() -> SkillRegistry {
        SkillRegistry::discover(None, None, &[], None)
    }

    fn tool_registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(EchoTool));
        tools
    }

    #[tokio::test]
    async fn simple_chat_with_no_tool_calls_ends_the_turn() {
        let provider = ScriptedProvider::new(vec![text_round("SMOKE_TEST_OK")]);
        let tools = tool_registry();
        let tool_ctx = ToolContext::new(std::path::PathBuf::from("/tmp"));
        let hooks = HookManager::new();
        let skills = empty_skills();
        let mut processor = ConversationProcessor::new("sess-1", std::path::PathBuf::from("/tmp"));

        let outcome = processor
            .run_turn(
                "Say exactly: SMOKE_TEST_OK",
                "you are a test assistant",
                &provider,
                &tools,
                &tool_ctx,
                &hooks,
                &skills,
                None,
                &NoopCallbacks,
            )
            .await
            .unwrap();

        assert_eq!(outcome.final_text.as_deref(), Some("SMOKE_TEST_OK"));
        assert_eq!(outcome.rounds, 1);
        assert!(!outcome.cancelled);
        assert_eq!(processor.messages().len(), 2);
    }

    #[tokio::test]
    async fn bash_tool_call_executes_and_feeds_result_back() {
        let provider = ScriptedProvider::new(vec![
            tool_call_round("call-1", "Bash", json!({"command": "ls"})),
            text_round("done"),
        ]);
        let tools = tool_registry();
        let tool_ctx = ToolContext::new(std::path::PathBuf::from("/tmp"));
        let hooks = HookManager::new();
        let skills = empty_skills();
        let mut processor = ConversationProcessor::new("sess-1", std::path::PathBuf::from("/tmp"));

        let outcome = processor
            .run_turn(
                "run ls",
                "sys",
                &provider,
                &tools,
                &tool_ctx,
                &hooks,
                &skills,
                None,
                &NoopCallbacks,
            )
            .await
            .unwrap();

        assert_eq!(outcome.final_text.as_deref(), Some("done"));
        assert_eq!(outcome.rounds, 2);

        let tool_result = processor
            .messages()
            .iter()
            .find_map(|m| match m {
                Message::ToolResult { content, success, .. } => Some((content.clone(), *success)),
                _ => None,
            })
            .expect("a tool result message");
        assert_eq!(tool_result, ("ran: ls".to_string(), true));
    }

    #[tokio::test]
    async fn pre_tool_use_hook_blocks_without_executing() {
        let provider = ScriptedProvider::new(vec![
            tool_call_round("call-1", "Bash", json!({"command": "ls"})),
            text_round("done"),
        ]);
        let tools = tool_registry();
        let tool_ctx = ToolContext::new(std::path::PathBuf::from("/tmp"));

        let mut hooks = HookManager::new();
        let block = HookDefinition::command("no-bash", "exit 1")
            .with_message("no bash")
            .with_match("tool", "^Bash$");
        hooks.register(HookEvent::PreToolUse, block);

        let skills = empty_skills();
        let mut processor = ConversationProcessor::new("sess-1", std::path::PathBuf::from("/tmp"));

        let outcome = processor
            .run_turn(
                "run ls",
                "sys",
                &provider,
                &tools,
                &tool_ctx,
                &hooks,
                &skills,
                None,
                &NoopCallbacks,
            )
            .await
            .unwrap();

        assert_eq!(outcome.final_text.as_deref(), Some("done"));

        let tool_result = processor
            .messages()
            .iter()
            .find_map(|m| match m {
                Message::ToolResult { content, success, .. } => Some((content.clone(), *success)),
                _ => None,
            })
            .expect("a tool result message");
        assert_eq!(tool_result, ("no bash".to_string(), false));
    }

    #[tokio::test]
    async fn tool_requiring_permission_is_not_executed_when_denied() {
        struct DangerousTool;

        #[async_trait]
        impl BuiltinTool for DangerousTool {
            fn name(&self) -> &'static str {
                "Danger"
            }
            fn description(&self) -> &'static str {
                "does something risky"
            }
            fn input_schema(&self) -> serde_json::Value {
                json!({"type": "object"})
            }
            fn requires_permission(&self) -> bool {
                true
            }
            async fn execute(&self, _args: serde_json::Value, _ctx: &ToolContext) -> brynhild_tools::ToolResult {
                Ok("should not run".to_string())
            }
        }

        struct DenyCallbacks;

        #[async_trait]
        impl ConversationCallbacks for DenyCallbacks {
            async fn request_tool_permission(&self, _tool_name: &str, _input: &serde_json::Value) -> bool {
                false
            }
        }

        let provider = ScriptedProvider::new(vec![
            tool_call_round("call-1", "Danger", json!({})),
            text_round("done"),
        ]);
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(DangerousTool));
        let tool_ctx = ToolContext::new(std::path::PathBuf::from("/tmp"));
        let hooks = HookManager::new();
        let skills = empty_skills();
        let mut processor = ConversationProcessor::new("sess-1", std::path::PathBuf::from("/tmp"));

        processor
            .run_turn(
                "do the risky thing",
                "sys",
                &provider,
                &tools,
                &tool_ctx,
                &hooks,
                &skills,
                None,
                &DenyCallbacks,
            )
            .await
            .unwrap();

        let tool_result = processor
            .messages()
            .iter()
            .find_map(|m| match m {
                Message::ToolResult { content, success, .. } => Some((content.clone(), *success)),
                _ => None,
            })
            .expect("a tool result message");
        assert_eq!(tool_result, ("Permission denied".to_string(), false));
    }

    #[tokio::test]
    async fn provider_error_becomes_error_assistant_message_not_a_propagated_failure() {
        let provider = ScriptedProvider::new(vec![]);
        let tools = tool_registry();
        let tool_ctx = ToolContext::new(std::path::PathBuf::from("/tmp"));
        let hooks = HookManager::new();
        let skills = empty_skills();
        let mut processor = ConversationProcessor::new("sess-1", std::path::PathBuf::from("/tmp"));

        let outcome = processor
            .run_turn(
                "hello",
                "sys",
                &provider,
                &tools,
                &tool_ctx,
                &hooks,
                &skills,
                None,
                &NoopCallbacks,
            )
            .await
            .unwrap();

        assert!(outcome.final_text.unwrap().contains("no more scripted rounds"));
        assert!(!outcome.cancelled);
    }

    #[tokio::test]
    async fn unknown_skill_trigger_is_rejected_before_any_provider_call() {
        let provider = ScriptedProvider::new(vec![text_round("unused")]);
        let tools = tool_registry();
        let tool_ctx = ToolContext::new(std::path::PathBuf::from("/tmp"));
        let hooks = HookManager::new();
        let skills = empty_skills();
        let mut processor = ConversationProcessor::new("sess-1", std::path::PathBuf::from("/tmp"));

        let err = processor
            .run_turn(
                "/skill does-not-exist help me",
                "sys",
                &provider,
                &tools,
                &tool_ctx,
                &hooks,
                &skills,
                None,
                &NoopCallbacks,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RuntimeError::UnknownSkill(name) if name == "does-not-exist"));
    }

    #[tokio::test]
    async fn cancellation_mid_stream_produces_partial_text_and_no_tool_dispatch() {
        struct CancelAfterFirstDelta {
            cancelled: std::sync::atomic::AtomicBool,
        }

        #[async_trait]
        impl ConversationCallbacks for CancelAfterFirstDelta {
            fn on_text_delta(&self, _text: &str) {
                self.cancelled.store(true, std::sync::atomic::Ordering::SeqCst);
            }
            fn is_cancelled(&self) -> bool {
                self.cancelled.load(std::sync::atomic::Ordering::SeqCst)
            }
        }

        let provider = ScriptedProvider::new(vec![vec![
            Ok(StreamEvent::TextDelta { text: "partial".to_string() }),
            Ok(StreamEvent::TextDelta { text: " more text".to_string() }),
            Ok(StreamEvent::TextComplete),
        ]]);
        let tools = tool_registry();
        let tool_ctx = ToolContext::new(std::path::PathBuf::from("/tmp"));
        let hooks = HookManager::new();
        let skills = empty_skills();
        let mut processor = ConversationProcessor::new("sess-1", std::path::PathBuf::from("/tmp"));
        let callbacks = CancelAfterFirstDelta {
            cancelled: std::sync::atomic::AtomicBool::new(false),
        };

        let outcome = processor
            .run_turn(
                "long running thing",
                "sys",
                &provider,
                &tools,
                &tool_ctx,
                &hooks,
                &skills,
                None,
                &callbacks,
            )
            .await
            .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.final_text.as_deref(), Some("partial"));
        assert!(processor
            .messages()
            .iter()
            .all(|m| !matches!(m, Message::ToolResult { .. })));
    }

    #[tokio::test]
    async fn tool_hook_injection_flushes_before_the_next_round_and_then_clears() {
        #[cfg(unix)]
        fn write_injecting_script(dir: &std::path::Path) -> std::path::PathBuf {
            use std::os::unix::fs::PermissionsExt;
            let path = dir.join("inject.sh");
            std::fs::write(
                &path,
                "#!/bin/sh\necho '{\"action\": \"continue\", \"inject_system_message\": \"reminder: be terse\"}'\n",
            )
            .unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        let dir = tempfile::tempdir().unwrap();
        let script = write_injecting_script(dir.path());

        let provider = ScriptedProvider::new(vec![
            tool_call_round("call-1", "Bash", json!({"command": "ls"})),
            text_round("done"),
        ]);
        let tools = tool_registry();
        let tool_ctx = ToolContext::new(std::path::PathBuf::from("/tmp"));

        let mut hooks = HookManager::new();
        hooks.register(HookEvent::PostToolUse, HookDefinition::script("inject", script));

        let skills = empty_skills();
        let mut processor = ConversationProcessor::new("sess-1", std::path::PathBuf::from("/tmp"));

        processor
            .run_turn(
                "run ls",
                "sys",
                &provider,
                &tools,
                &tool_ctx,
                &hooks,
                &skills,
                None,
                &NoopCallbacks,
            )
            .await
            .unwrap();

        // Flushed into the message list as a guidance message ahead of the
        // second round's stream call, not left pending at turn end.
        assert!(processor.pending_injections().is_empty());
        let has_guidance = processor.messages().iter().any(|m| {
            matches!(m, Message::User { content } if content.contains("[System guidance]") && content.contains("reminder: be terse"))
        });
        assert!(has_guidance, "expected a flushed guidance message, got {:?}", processor.messages());
    }
}
