//! [`LogReader`]: parses a conversation log for replay, audit, and
//! debugging.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::{LogError, LogResult};
use crate::event::{EventPayload, InjectionLocation, LogEvent};
use crate::writer::content_hash;

/// The reconstructed system prompt at some point in a session, plus any
/// injections that were delivered as synthetic user messages rather than
/// folded into the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedContext {
    /// The assembled system prompt text.
    pub system_prompt: String,
    /// Injected content delivered as `message_inject`, in event order.
    pub message_injections: Vec<String>,
}

/// Basic session metadata extracted from `session_start`/`session_end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// The session identifier.
    pub session_id: String,
    /// The model active when the session started.
    pub model: String,
    /// The provider active when the session started.
    pub provider: String,
    /// Why the session ended, if it has.
    pub end_reason: Option<String>,
}

/// What the model actually saw at a given turn: the system prompt in
/// effect plus the message history up to and including the turn's user
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmView {
    /// The system prompt in effect at this turn.
    pub system_prompt: String,
    /// Messages up to and including the triggering user message, each as
    /// `(role, content)`.
    pub messages: Vec<(String, String)>,
}

/// Parses an append-only conversation log into an in-memory event list,
/// then answers replay/audit queries against it.
///
/// Malformed lines are skipped (with a warning), since a log is allowed
/// to be truncated by a crash mid-write.
pub struct LogReader {
    events: Vec<LogEvent>,
}

impl LogReader {
    /// Parse every well-formed JSONL line in `path`.
    ///
    /// # Errors
    /// Returns [`LogError::Io`] if the file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| LogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut events = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEvent>(line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    warn!(line = line_no + 1, %err, "skipping malformed log line");
                }
            }
        }
        Ok(Self { events })
    }

    /// Build a reader directly from already-parsed events (for tests and
    /// for callers streaming events from elsewhere).
    #[must_use]
    pub fn from_events(events: Vec<LogEvent>) -> Self {
        Self { events }
    }

    /// Every parsed event, in log order.
    #[must_use]
    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    /// Every `context_injection` event, in log order.
    #[must_use]
    pub fn injections(&self) -> Vec<&LogEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.payload, EventPayload::ContextInjection { .. }))
            .collect()
    }

    /// Every `model_switch` event, in log order.
    #[must_use]
    pub fn model_switches(&self) -> Vec<&LogEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.payload, EventPayload::ModelSwitch { .. }))
            .collect()
    }

    /// Metadata from the first `session_start` and, if present, the last
    /// `session_end`.
    #[must_use]
    pub fn session_info(&self) -> Option<SessionInfo> {
        let start = self.events.iter().find_map(|e| match &e.payload {
            EventPayload::SessionStart {
                session_id,
                model,
                provider,
            } => Some((session_id.clone(), model.clone(), provider.clone())),
            _ => None,
        })?;
        let end_reason = self.events.iter().rev().find_map(|e| match &e.payload {
            EventPayload::SessionEnd { reason } => Some(reason.clone()),
            _ => None,
        });
        Some(SessionInfo {
            session_id: start.0,
            model: start.1,
            provider: start.2,
            end_reason,
        })
    }

    /// Reconstruct the system prompt as of `context_version` `v`: find the
    /// most recent `context_init` at or before `v` (establishing the
    /// base), fold in every `context_injection` with
    /// `context_version <= v` that occurred after that base, in order —
    /// `system_prompt_prepend` entries before the base, `append` entries
    /// after, and `message_inject` entries collected separately.
    ///
    /// # Errors
    /// [`LogError::MissingContextInit`] if no `context_init` event exists.
    pub fn context_at_version(&self, v: u64) -> LogResult<ReconstructedContext> {
        let init_idx = self
            .events
            .iter()
            .rposition(|e| matches!(&e.payload, EventPayload::ContextInit { context_version, .. } if *context_version <= v))
            .ok_or(LogError::MissingContextInit)?;

        let EventPayload::ContextInit { base_prompt, .. } = &self.events[init_idx].payload else {
            unreachable!("rposition matched ContextInit")
        };
        let base = base_prompt.clone().unwrap_or_default();

        let mut prepend = Vec::new();
        let mut append = Vec::new();
        let mut message_injections = Vec::new();

        for event in &self.events[init_idx + 1..] {
            let EventPayload::ContextInjection {
                context_version,
                location,
                content,
                ..
            } = &event.payload
            else {
                continue;
            };
            if *context_version > v {
                continue;
            }
            let text = content.clone().unwrap_or_default();
            match location {
                InjectionLocation::SystemPromptPrepend => prepend.push(text),
                InjectionLocation::SystemPromptAppend => append.push(text),
                InjectionLocation::MessageInject => message_injections.push(text),
            }
        }

        let mut parts = prepend;
        parts.push(base);
        parts.extend(append);

        Ok(ReconstructedContext {
            system_prompt: parts.join("\n"),
            message_injections,
        })
    }

    /// Reconstruct the context as of event number `n`: find the largest
    /// `context_version` seen by event `n`, then delegate to
    /// [`LogReader::context_at_version`].
    ///
    /// # Errors
    /// See [`LogReader::context_at_version`].
    pub fn context_at_event(&self, n: u64) -> LogResult<ReconstructedContext> {
        let v = self
            .events
            .iter()
            .filter(|e| e.event_number <= n)
            .filter_map(|e| e.payload.context_version())
            .max()
            .unwrap_or(0);
        self.context_at_version(v)
    }

    /// Recompute `SHA-256` prefixes on every hashed event and compare
    /// against the recorded `content_hash`. Returns `(all_valid, errors)`.
    #[must_use]
    pub fn validate(&self) -> (bool, Vec<String>) {
        let mut errors = Vec::new();
        for event in &self.events {
            let check = |content: &Option<String>, recorded: &str, label: &str, errs: &mut Vec<String>| {
                if let Some(text) = content {
                    let recomputed = content_hash(text);
                    if &recomputed != recorded {
                        errs.push(format!(
                            "event {}: {label} hash mismatch (recorded {recorded}, recomputed {recomputed})",
                            event.event_number
                        ));
                    }
                }
            };
            match &event.payload {
                EventPayload::ContextInit {
                    base_prompt,
                    content_hash: recorded,
                    ..
                } => check(base_prompt, recorded, "context_init", &mut errors),
                EventPayload::ContextInjection {
                    content,
                    content_hash: recorded,
                    ..
                } => check(content, recorded, "context_injection", &mut errors),
                EventPayload::UserMessage {
                    content,
                    content_hash: recorded,
                } => check(content, recorded, "user_message", &mut errors),
                EventPayload::AssistantMessage {
                    content,
                    content_hash: recorded,
                } => check(content, recorded, "assistant_message", &mut errors),
                EventPayload::ToolResult {
                    output,
                    content_hash: recorded,
                    ..
                } => check(output, recorded, "tool_result", &mut errors),
                EventPayload::Error {
                    message,
                    content_hash: recorded,
                    ..
                } => check(message, recorded, "error", &mut errors),
                _ => {}
            }
        }
        (errors.is_empty(), errors)
    }

    /// Reconstruct exactly what the model saw at turn `turn` (1-indexed
    /// by user message): the system prompt in effect at that point, plus
    /// every message up to and including the `turn`-th `user_message`.
    ///
    /// # Errors
    /// [`LogError::TurnNotFound`] if fewer than `turn` user messages
    /// exist. [`LogError::MissingContextInit`] if no context was ever
    /// established.
    pub fn llm_view_at_turn(&self, turn: usize) -> LogResult<LlmView> {
        let mut seen_user_messages = 0;
        let mut cutoff = None;
        for event in &self.events {
            if matches!(event.payload, EventPayload::UserMessage { .. }) {
                seen_user_messages += 1;
                if seen_user_messages == turn {
                    cutoff = Some(event.event_number);
                    break;
                }
            }
        }
        let cutoff = cutoff.ok_or(LogError::TurnNotFound(turn))?;

        let context = self.context_at_event(cutoff)?;
        let mut messages = Vec::new();
        for event in self.events.iter().filter(|e| e.event_number <= cutoff) {
            match &event.payload {
                EventPayload::UserMessage { content, .. } => {
                    messages.push(("user".to_string(), content.clone().unwrap_or_default()));
                }
                EventPayload::AssistantMessage { content, .. } => {
                    messages.push(("assistant".to_string(), content.clone().unwrap_or_default()));
                }
                _ => {}
            }
        }

        Ok(LlmView {
            system_prompt: context.system_prompt,
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InjectionLocation;
    use crate::writer::ConversationLogger;

    fn sample_log() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let mut logger = ConversationLogger::open(&path, false).unwrap();
        logger.log_session_start("s1", "model-a", "anthropic").unwrap();
        logger.log_context_init("base prompt").unwrap();
        logger
            .log_context_injection(
                "rules",
                InjectionLocation::SystemPromptAppend,
                "extra rule",
                None,
                None,
                None,
            )
            .unwrap();
        logger.log_context_ready("hash").unwrap();
        logger.log_user_message("first question").unwrap();
        logger.log_assistant_message("first answer").unwrap();
        logger.log_user_message("second question").unwrap();
        logger.log_assistant_message("second answer").unwrap();
        logger.log_session_end("completed").unwrap();
        (dir, path)
    }

    #[test]
    fn skips_malformed_lines() {
        let (dir, path) = sample_log();
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("not json\n");
        fs::write(&path, content).unwrap();
        let reader = LogReader::open(&path).unwrap();
        assert!(reader.events().iter().all(|e| e.event_number > 0));
        drop(dir);
    }

    #[test]
    fn session_info_round_trips() {
        let (_dir, path) = sample_log();
        let reader = LogReader::open(&path).unwrap();
        let info = reader.session_info().unwrap();
        assert_eq!(info.session_id, "s1");
        assert_eq!(info.model, "model-a");
        assert_eq!(info.end_reason.as_deref(), Some("completed"));
    }

    #[test]
    fn context_at_version_folds_append_injection() {
        let (_dir, path) = sample_log();
        let reader = LogReader::open(&path).unwrap();
        let ctx = reader.context_at_version(2).unwrap();
        assert_eq!(ctx.system_prompt, "base prompt\nextra rule");
    }

    #[test]
    fn context_at_version_one_excludes_later_injection() {
        let (_dir, path) = sample_log();
        let reader = LogReader::open(&path).unwrap();
        let ctx = reader.context_at_version(1).unwrap();
        assert_eq!(ctx.system_prompt, "base prompt");
    }

    #[test]
    fn validate_detects_tampering() {
        let (_dir, path) = sample_log();
        let reader = LogReader::open(&path).unwrap();
        let (ok, errors) = reader.validate();
        assert!(ok);
        assert!(errors.is_empty());

        let mut events = reader.events().to_vec();
        if let EventPayload::UserMessage { content, .. } = &mut events[3].payload {
            *content = Some("tampered".to_string());
        }
        let tampered = LogReader::from_events(events);
        let (ok, errors) = tampered.validate();
        assert!(!ok);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn llm_view_at_turn_includes_messages_up_to_cutoff() {
        let (_dir, path) = sample_log();
        let reader = LogReader::open(&path).unwrap();
        let view = reader.llm_view_at_turn(1).unwrap();
        assert_eq!(view.messages, vec![("user".to_string(), "first question".to_string())]);

        let view2 = reader.llm_view_at_turn(2).unwrap();
        assert_eq!(
            view2.messages,
            vec![
                ("user".to_string(), "first question".to_string()),
                ("assistant".to_string(), "first answer".to_string()),
                ("user".to_string(), "second question".to_string()),
            ]
        );
    }

    #[test]
    fn llm_view_turn_not_found() {
        let (_dir, path) = sample_log();
        let reader = LogReader::open(&path).unwrap();
        assert!(matches!(
            reader.llm_view_at_turn(99),
            Err(LogError::TurnNotFound(99))
        ));
    }
}
