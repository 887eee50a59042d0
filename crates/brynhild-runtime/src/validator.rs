//! `MessageValidator`: conversation structural invariants (spec.md §4.14).
//!
//! Each check below mirrors one validator from the Python reference: it
//! scans the whole message list but reports only the first violation it
//! finds, matching the reference's short-circuit-per-check behavior.

use brynhild_llm::Message;
use thiserror::Error;

const RECOVERED_ID_PREFIX: &str = "recovered-";

const FEEDBACK_PATTERNS: &[&str] = &[
    "did not call the Finish tool",
    "Your response contained only thinking",
    "incomplete_response",
];

/// One structural violation: a stable `kind` tag plus a human-readable
/// description.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Violation {
    /// Stable machine-readable violation tag (e.g. `orphan_tool_result`).
    pub kind: String,
    /// Human-readable description, including the offending index.
    pub message: String,
}

impl Violation {
    fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

/// Statistics about tool-call/tool-result pairing across a message list
/// (spec.md §4.14, `validate_tool_call_result_pairs`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallPairReport {
    /// Total distinct tool-call ids seen in assistant messages.
    pub total_tool_calls: usize,
    /// Total distinct tool-call ids referenced by tool results.
    pub total_tool_results: usize,
    /// Ids present on both sides.
    pub matched_pairs: usize,
    /// Tool-call ids with no matching result.
    pub orphan_calls: Vec<String>,
    /// Tool-result ids with no matching call.
    pub orphan_results: Vec<String>,
}

type Check = fn(&[Message]) -> Option<Violation>;

const CHECKS: &[Check] = &[
    check_required_fields,
    check_turn_taking,
    check_tool_call_consistency,
    check_system_message_position,
    check_no_empty_content,
    check_feedback_ordering,
];

/// Validates conversation structural invariants, in strict or collecting
/// mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageValidator;

impl MessageValidator {
    /// Run every check, returning every violation found (empty if the
    /// message list is valid). Never stops early.
    #[must_use]
    pub fn validate_collecting(messages: &[Message]) -> Vec<Violation> {
        CHECKS.iter().filter_map(|check| check(messages)).collect()
    }

    /// Run every check in order, returning the first violation found.
    ///
    /// # Errors
    /// Returns the first [`Violation`] raised by any check.
    pub fn validate_strict(messages: &[Message]) -> Result<(), Violation> {
        for check in CHECKS {
            if let Some(violation) = check(messages) {
                return Err(violation);
            }
        }
        Ok(())
    }

    /// Count and cross-reference tool-call ids against tool-result ids.
    #[must_use]
    pub fn validate_tool_call_result_pairs(messages: &[Message]) -> ToolCallPairReport {
        use std::collections::BTreeSet;

        let mut call_ids = BTreeSet::new();
        let mut result_ids = BTreeSet::new();

        for msg in messages {
            for tool_use in msg.tool_calls() {
                call_ids.insert(tool_use.id.clone());
            }
            if let Message::ToolResult { tool_call_id, .. } = msg {
                result_ids.insert(tool_call_id.clone());
            }
        }

        let matched = call_ids.intersection(&result_ids).count();
        let orphan_calls: Vec<String> = call_ids.difference(&result_ids).cloned().collect();
        let orphan_results: Vec<String> = result_ids.difference(&call_ids).cloned().collect();

        ToolCallPairReport {
            total_tool_calls: call_ids.len(),
            total_tool_results: result_ids.len(),
            matched_pairs: matched,
            orphan_calls,
            orphan_results,
        }
    }
}

fn check_required_fields(messages: &[Message]) -> Option<Violation> {
    for (i, msg) in messages.iter().enumerate() {
        if let Message::Assistant { content, tool_calls } = msg {
            let has_content = content.as_deref().is_some_and(|c| !c.trim().is_empty());
            if !has_content && tool_calls.is_empty() {
                return Some(Violation::new(
                    "empty_assistant",
                    format!("assistant message {i} has neither content nor tool_calls"),
                ));
            }
        }
        if let Message::ToolResult { tool_call_id, .. } = msg {
            if tool_call_id.trim().is_empty() {
                return Some(Violation::new(
                    "missing_tool_call_id",
                    format!("tool result message {i} missing tool_call_id"),
                ));
            }
        }
    }
    None
}

fn check_turn_taking(messages: &[Message]) -> Option<Violation> {
    let mut prev_role: Option<&'static str> = None;
    let mut prev_had_tool_calls = false;

    for (i, msg) in messages.iter().enumerate() {
        let role = msg.role();

        if role == "user" && prev_role == Some("user") {
            return Some(Violation::new(
                "consecutive_user_messages",
                format!("two user messages in a row at index {} and {i}", i - 1),
            ));
        }
        if role == "assistant" && prev_role == Some("assistant") {
            return Some(Violation::new(
                "consecutive_assistant_messages",
                format!("two assistant messages in a row at index {} and {i}", i - 1),
            ));
        }
        if prev_had_tool_calls && role != "tool_result" {
            return Some(Violation::new(
                "missing_tool_result",
                format!(
                    "expected a tool result after assistant tool_calls at {}, got {role} at {i}",
                    i - 1
                ),
            ));
        }

        prev_role = Some(role);
        prev_had_tool_calls = !msg.tool_calls().is_empty();
    }
    None
}

fn check_tool_call_consistency(messages: &[Message]) -> Option<Violation> {
    let mut pending: std::collections::HashSet<String> = std::collections::HashSet::new();

    for (i, msg) in messages.iter().enumerate() {
        for tool_use in msg.tool_calls() {
            pending.insert(tool_use.id.clone());
        }
        if let Message::ToolResult { tool_call_id, .. } = msg {
            if pending.contains(tool_call_id) {
                pending.remove(tool_call_id);
            } else if !tool_call_id.starts_with(RECOVERED_ID_PREFIX) {
                return Some(Violation::new(
                    "orphan_tool_result",
                    format!("tool result at {i} has orphan tool_call_id {tool_call_id:?}"),
                ));
            }
        }
    }
    None
}

fn check_system_message_position(messages: &[Message]) -> Option<Violation> {
    let system_indices: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role() == "system")
        .map(|(i, _)| i)
        .collect();

    if let Some(&first) = system_indices.first() {
        if first != 0 {
            return Some(Violation::new(
                "misplaced_system_message",
                format!("system message at index {first}, expected at 0"),
            ));
        }
    }
    if system_indices.len() > 1 {
        return Some(Violation::new(
            "multiple_system_messages",
            format!("multiple system messages at indices {system_indices:?}"),
        ));
    }
    None
}

fn check_no_empty_content(messages: &[Message]) -> Option<Violation> {
    for (i, msg) in messages.iter().enumerate() {
        match msg {
            Message::User { content } | Message::System { content } => {
                if content.trim().is_empty() {
                    return Some(Violation::new(
                        "empty_content",
                        format!("{} message {i} has empty content", msg.role()),
                    ));
                }
            }
            Message::ToolResult { content, .. } => {
                if content.trim().is_empty() {
                    return Some(Violation::new(
                        "empty_tool_result",
                        format!("tool result {i} has empty content"),
                    ));
                }
            }
            Message::Assistant { .. } => {}
        }
    }
    None
}

fn check_feedback_ordering(messages: &[Message]) -> Option<Violation> {
    for (i, msg) in messages.iter().enumerate() {
        let Message::User { content } = msg else {
            continue;
        };
        let is_feedback = FEEDBACK_PATTERNS.iter().any(|p| content.contains(p));
        if !is_feedback {
            continue;
        }
        if i == 0 {
            return Some(Violation::new(
                "feedback_without_predecessor",
                format!("feedback message at {i} has nothing before it"),
            ));
        }
        let prev_role = messages[i - 1].role();
        if prev_role != "assistant" {
            return Some(Violation::new(
                "feedback_ordering",
                format!("feedback message at {i} should follow assistant message, but follows {prev_role}"),
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use brynhild_llm::ToolUse;

    #[test]
    fn valid_conversation_passes() {
        let messages = vec![
            Message::system("be nice"),
            Message::user("hello"),
            Message::assistant("hi there"),
        ];
        assert!(MessageValidator::validate_strict(&messages).is_ok());
    }

    #[test]
    fn consecutive_user_messages_rejected() {
        let messages = vec![Message::user("a"), Message::user("b")];
        let err = MessageValidator::validate_strict(&messages).unwrap_err();
        assert_eq!(err.kind, "consecutive_user_messages");
    }

    #[test]
    fn assistant_tool_calls_must_be_followed_by_tool_result() {
        let tool_use = ToolUse::new("call-1", "Bash", serde_json::json!({}));
        let messages = vec![
            Message::user("run ls"),
            Message::assistant_with_tool_calls(None, vec![tool_use]),
            Message::user("oops"),
        ];
        let err = MessageValidator::validate_strict(&messages).unwrap_err();
        assert_eq!(err.kind, "missing_tool_result");
    }

    #[test]
    fn orphan_tool_result_rejected_unless_recovered() {
        let orphan = vec![Message::tool_result("call-missing", "ok", true)];
        assert_eq!(
            MessageValidator::validate_strict(&orphan).unwrap_err().kind,
            "orphan_tool_result"
        );

        let recovered = vec![Message::tool_result("recovered-abc", "ok", true)];
        assert!(MessageValidator::validate_strict(&recovered).is_ok());
    }

    #[test]
    fn system_message_must_be_first_and_unique() {
        let misplaced = vec![Message::user("hi"), Message::system("be nice")];
        assert_eq!(
            MessageValidator::validate_strict(&misplaced).unwrap_err().kind,
            "misplaced_system_message"
        );

        let duplicated = vec![Message::system("a"), Message::system("b")];
        assert_eq!(
            MessageValidator::validate_strict(&duplicated).unwrap_err().kind,
            "multiple_system_messages"
        );
    }

    #[test]
    fn feedback_message_must_follow_assistant() {
        let messages = vec![Message::user("Your response contained only thinking, try again.")];
        assert_eq!(
            MessageValidator::validate_strict(&messages).unwrap_err().kind,
            "feedback_without_predecessor"
        );

        let messages = vec![
            Message::user("go"),
            Message::user("did not call the Finish tool"),
        ];
        let err = MessageValidator::validate_strict(&messages).unwrap_err();
        assert_eq!(err.kind, "consecutive_user_messages");
    }

    #[test]
    fn collecting_mode_gathers_every_check_independently() {
        let messages = vec![Message::user("a"), Message::user("b")];
        let violations = MessageValidator::validate_collecting(&messages);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, "consecutive_user_messages");
    }

    #[test]
    fn tool_call_pair_report_counts_orphans_both_ways() {
        let tool_use = ToolUse::new("call-1", "Bash", serde_json::json!({}));
        let messages = vec![
            Message::assistant_with_tool_calls(None, vec![tool_use]),
            Message::tool_result("call-1", "ok", true),
            Message::tool_result("call-2", "ok", true),
        ];
        let report = MessageValidator::validate_tool_call_result_pairs(&messages);
        assert_eq!(report.total_tool_calls, 1);
        assert_eq!(report.total_tool_results, 2);
        assert_eq!(report.matched_pairs, 1);
        assert_eq!(report.orphan_results, vec!["call-2".to_string()]);
        assert!(report.orphan_calls.is_empty());
    }
}
