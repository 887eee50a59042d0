//! [`ConversationLogger`]: append-only JSONL writer for conversation events.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::{LogError, LogResult};
use crate::event::{EventPayload, InjectionLocation, LogEvent};

/// First 16 hex characters of `SHA-256(content)`, matching the log's
/// `content_hash` convention.
#[must_use]
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Writes conversation events to an append-only JSONL file.
///
/// Writes are line-buffered and flushed after every event. When
/// `private_mode` is enabled, the `content` field of message/injection
/// events is omitted from the written line while its `content_hash` is
/// still recorded, so a redacted log remains independently verifiable.
pub struct ConversationLogger {
    writer: BufWriter<File>,
    event_number: u64,
    context_version: u64,
    private_mode: bool,
}

impl ConversationLogger {
    /// Open (creating if necessary) a log file for appending.
    ///
    /// # Errors
    /// Returns [`LogError::Io`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, private_mode: bool) -> LogResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LogError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            event_number: 0,
            context_version: 0,
            private_mode,
        })
    }

    fn write(&mut self, payload: EventPayload) -> LogResult<()> {
        self.event_number += 1;
        let event = LogEvent {
            event_number: self.event_number,
            timestamp: Utc::now(),
            payload,
        };
        let line = serde_json::to_string(&event).map_err(LogError::Serialize)?;
        writeln!(self.writer, "{line}").map_err(|e| LogError::Io {
            path: "<conversation log>".to_string(),
            source: e,
        })?;
        self.writer.flush().map_err(|e| LogError::Io {
            path: "<conversation log>".to_string(),
            source: e,
        })
    }

    /// Record `session_start`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_session_start(
        &mut self,
        session_id: &str,
        model: &str,
        provider: &str,
    ) -> LogResult<()> {
        self.write(EventPayload::SessionStart {
            session_id: session_id.to_string(),
            model: model.to_string(),
            provider: provider.to_string(),
        })
    }

    /// Record `session_end`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_session_end(&mut self, reason: &str) -> LogResult<()> {
        self.write(EventPayload::SessionEnd {
            reason: reason.to_string(),
        })
    }

    /// Record `context_init`. Increments `context_version` to 1.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_context_init(&mut self, base_prompt: &str) -> LogResult<()> {
        self.context_version += 1;
        let hash = content_hash(base_prompt);
        self.write(EventPayload::ContextInit {
            context_version: self.context_version,
            base_prompt: self.redact(base_prompt),
            content_hash: hash,
        })
    }

    /// Record `context_injection`. Increments `context_version`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    #[allow(clippy::too_many_arguments)]
    pub fn log_context_injection(
        &mut self,
        source: &str,
        location: InjectionLocation,
        content: &str,
        origin: Option<&str>,
        trigger_type: Option<&str>,
        trigger_match: Option<&str>,
    ) -> LogResult<()> {
        self.context_version += 1;
        let hash = content_hash(content);
        self.write(EventPayload::ContextInjection {
            context_version: self.context_version,
            source: source.to_string(),
            location,
            content: self.redact(content),
            content_hash: hash,
            origin: origin.map(str::to_string),
            trigger_type: trigger_type.map(str::to_string),
            trigger_match: trigger_match.map(str::to_string),
        })
    }

    /// Record `context_ready`. Does not change `context_version`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_context_ready(&mut self, prompt_hash: &str) -> LogResult<()> {
        self.write(EventPayload::ContextReady {
            prompt_hash: prompt_hash.to_string(),
        })
    }

    /// Record `context_checkpoint`. Does not change `context_version`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_context_checkpoint(&mut self, prompt: &str) -> LogResult<()> {
        self.write(EventPayload::ContextCheckpoint {
            content_hash: content_hash(prompt),
        })
    }

    /// Record `context_reset`. Rewinds the version counter so that the
    /// next `context_init` reports `context_version` 1 again.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_context_reset(&mut self, new_base: &str, reason: &str) -> LogResult<()> {
        self.context_version = 0;
        self.write(EventPayload::ContextReset {
            content_hash: content_hash(new_base),
            reason: reason.to_string(),
        })
    }

    /// Record `model_switch`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_model_switch(
        &mut self,
        new_model: &str,
        new_provider: &str,
        reason: &str,
        preserve_context: bool,
    ) -> LogResult<()> {
        self.write(EventPayload::ModelSwitch {
            new_model: new_model.to_string(),
            new_provider: new_provider.to_string(),
            reason: reason.to_string(),
            preserve_context,
        })
    }

    /// Record `user_message`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_user_message(&mut self, content: &str) -> LogResult<()> {
        let hash = content_hash(content);
        self.write(EventPayload::UserMessage {
            content: self.redact(content),
            content_hash: hash,
        })
    }

    /// Record `assistant_message`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_assistant_message(&mut self, content: &str) -> LogResult<()> {
        let hash = content_hash(content);
        self.write(EventPayload::AssistantMessage {
            content: self.redact(content),
            content_hash: hash,
        })
    }

    /// Record `assistant_stream_end`, for a turn that ended without a
    /// complete `assistant_message` (cancellation, a stream error).
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_assistant_stream_end(&mut self, output_tokens: Option<u64>) -> LogResult<()> {
        self.write(EventPayload::AssistantStreamEnd { output_tokens })
    }

    /// Record `tool_call`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_tool_call(
        &mut self,
        name: &str,
        input: serde_json::Value,
        id: &str,
        call_type: &str,
    ) -> LogResult<()> {
        self.write(EventPayload::ToolCall {
            name: name.to_string(),
            input,
            id: id.to_string(),
            call_type: call_type.to_string(),
        })
    }

    /// Record `tool_result`.
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_tool_result(
        &mut self,
        name: &str,
        success: bool,
        output: &str,
        id: &str,
    ) -> LogResult<()> {
        let hash = content_hash(output);
        self.write(EventPayload::ToolResult {
            name: name.to_string(),
            success,
            output: self.redact(output),
            content_hash: hash,
            id: id.to_string(),
        })
    }

    /// Record `error`, for a recoverable failure surfaced mid-turn
    /// (spec.md §7: provider/network errors).
    ///
    /// # Errors
    /// See [`ConversationLogger::open`].
    pub fn log_error(&mut self, message: &str, error_type: &str) -> LogResult<()> {
        let hash = content_hash(message);
        self.write(EventPayload::Error {
            message: self.redact(message),
            content_hash: hash,
            error_type: error_type.to_string(),
        })
    }

    fn redact(&self, content: &str) -> Option<String> {
        if self.private_mode {
            None
        } else {
            Some(content.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        let file = File::open(path).unwrap();
        BufReader::new(file)
            .lines()
            .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn event_numbers_are_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let mut logger = ConversationLogger::open(&path, false).unwrap();
        logger.log_session_start("s1", "model", "provider").unwrap();
        logger.log_context_init("base").unwrap();
        logger.log_user_message("hi").unwrap();
        let lines = read_lines(&path);
        let numbers: Vec<u64> = lines
            .iter()
            .map(|l| l["event_number"].as_u64().unwrap())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn context_init_and_injection_increment_version_but_checkpoint_does_not() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let mut logger = ConversationLogger::open(&path, false).unwrap();
        logger.log_context_init("base").unwrap();
        logger
            .log_context_injection("rules", InjectionLocation::SystemPromptAppend, "x", None, None, None)
            .unwrap();
        logger.log_context_checkpoint("base+x").unwrap();
        let lines = read_lines(&path);
        assert_eq!(lines[0]["context_version"], 1);
        assert_eq!(lines[1]["context_version"], 2);
        assert!(lines[2].get("context_version").is_none());
    }

    #[test]
    fn context_reset_returns_version_to_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let mut logger = ConversationLogger::open(&path, false).unwrap();
        logger.log_context_init("base").unwrap();
        logger
            .log_context_injection("rules", InjectionLocation::SystemPromptAppend, "x", None, None, None)
            .unwrap();
        logger.log_context_reset("new base", "manual reset").unwrap();
        logger.log_context_init("new base").unwrap();
        let lines = read_lines(&path);
        assert_eq!(lines[3]["event_type"], "context_init");
        assert_eq!(lines[3]["context_version"], 1);
    }

    #[test]
    fn private_mode_redacts_content_but_keeps_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let mut logger = ConversationLogger::open(&path, true).unwrap();
        logger.log_user_message("secret text").unwrap();
        let lines = read_lines(&path);
        assert!(lines[0]["content"].is_null());
        assert_eq!(lines[0]["content_hash"], content_hash("secret text"));
    }

    #[test]
    fn assistant_stream_end_carries_optional_token_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let mut logger = ConversationLogger::open(&path, false).unwrap();
        logger.log_assistant_stream_end(Some(42)).unwrap();
        let lines = read_lines(&path);
        assert_eq!(lines[0]["event_type"], "assistant_stream_end");
        assert_eq!(lines[0]["output_tokens"], 42);
    }

    #[test]
    fn content_hash_is_sha256_prefix() {
        let hash = content_hash("hello");
        assert_eq!(hash.len(), 16);
        let full = hex::encode(Sha256::digest(b"hello"));
        assert_eq!(hash, full[..16]);
    }
}
