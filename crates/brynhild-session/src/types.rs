//! `Session`: persisted conversation state, and the id format that
//! guards every filesystem operation against path traversal.

use std::sync::OnceLock;

use brynhild_llm::Message;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

fn legacy_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]{8}$").expect("valid regex"))
}

fn named_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,100}$").expect("valid regex"))
}

/// Generate a fresh 8-character lowercase-alphanumeric session id, drawn
/// from a v4 UUID's hex digits.
#[must_use]
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Validate a session id against the two accepted shapes (spec.md §3):
/// exactly 8 lowercase-alphanumeric characters, or 1-100 characters of
/// `[A-Za-z0-9_-]`. Rejects path-traversal candidates like `../../etc`.
///
/// # Errors
/// Returns [`SessionError::InvalidId`] if neither shape matches.
pub fn validate_session_id(session_id: &str) -> Result<&str, SessionError> {
    if legacy_id_pattern().is_match(session_id) || named_id_pattern().is_match(session_id) {
        Ok(session_id)
    } else {
        Err(SessionError::InvalidId(session_id.to_string()))
    }
}

/// Per-tool accumulated usage counters (spec.md §3 `tool_metrics`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolMetrics {
    /// Number of times the tool was called.
    pub call_count: u64,
    /// Number of calls that succeeded.
    pub success_count: u64,
    /// Number of calls that failed.
    pub failure_count: u64,
    /// Accumulated wall-clock duration across all calls, in milliseconds.
    pub total_duration_ms: u64,
}

/// A conversation session that can be persisted and resumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Validated session id.
    pub id: String,
    /// Working directory when the session was created.
    pub cwd: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp; bumped on every `add_message`.
    pub updated_at: DateTime<Utc>,
    /// Model identifier in use for this session.
    pub model: String,
    /// Provider name in use for this session.
    pub provider: String,
    /// The full message history.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Auto-generated or user-set title.
    #[serde(default)]
    pub title: Option<String>,
    /// Accumulated per-tool usage metrics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_metrics: Option<std::collections::HashMap<String, ToolMetrics>>,
}

impl Session {
    /// Start a new session rooted at `cwd` for the given model/provider.
    #[must_use]
    pub fn create(cwd: impl Into<String>, model: impl Into<String>, provider: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_session_id(),
            cwd: cwd.into(),
            created_at: now,
            updated_at: now,
            model: model.into(),
            provider: provider.into(),
            messages: Vec::new(),
            title: None,
            tool_metrics: None,
        }
    }

    /// Append a message and bump `updated_at`.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// A lightweight summary for listing (spec.md's `session list`).
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            cwd: self.cwd.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            model: self.model.clone(),
            provider: self.provider.clone(),
            title: self.title.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// A session's identity and size, without its full message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// The session id.
    pub id: String,
    /// Working directory the session was created in.
    pub cwd: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Model identifier.
    pub model: String,
    /// Provider name.
    pub provider: String,
    /// Title, if set.
    pub title: Option<String>,
    /// Number of messages in the session.
    pub message_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_always_validate() {
        for _ in 0..50 {
            let id = generate_session_id();
            assert_eq!(id.len(), 8);
            assert!(validate_session_id(&id).is_ok());
        }
    }

    #[test]
    fn accepts_legacy_and_named_formats() {
        assert!(validate_session_id("ab3d9f02").is_ok());
        assert!(validate_session_id("my-session_1").is_ok());
        assert!(validate_session_id(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn rejects_path_traversal_and_oversized_ids() {
        assert!(validate_session_id("../../../etc/passwd").is_err());
        assert!(validate_session_id("../escape").is_err());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id(&"a".repeat(101)).is_err());
        assert!(validate_session_id("has/slash").is_err());
    }

    #[test]
    fn add_message_bumps_updated_at() {
        let mut session = Session::create("/tmp", "gpt-oss-120b", "openrouter");
        let created = session.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        session.add_message(Message::user("hi"));
        assert!(session.updated_at >= created);
        assert_eq!(session.messages.len(), 1);
    }
}
