//! Recovers tool calls that a model emitted inside its thinking text
//! instead of as a proper tool-call event.
//!
//! Some models occasionally place tool-call JSON in their thinking/analysis
//! channel instead of emitting it natively. This scans the thinking text for
//! `{...}` candidates from the end backwards and matches each one against
//! the registered tools' schemas.

use brynhild_llm::ToolUse;
use serde_json::Value;

use crate::registry::ToolRegistry;

/// How a tool call was recovered from thinking text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryType {
    /// The JSON sat at the very end of the thinking text.
    TrailingJson,
    /// The JSON was followed by other text (punctuation, closing tags, …).
    JsonWithTrailingText,
    /// An earlier (further from the end) candidate matched after later ones failed.
    FallbackJson,
}

impl RecoveryType {
    /// Stable string form for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrailingJson => "trailing_json",
            Self::JsonWithTrailingText => "json_with_trailing_text",
            Self::FallbackJson => "fallback_json",
        }
    }
}

/// Diagnostic record of a successful recovery.
#[derive(Debug, Clone)]
pub struct RecoveryResult {
    /// The recovered tool use, with `is_recovered` set and a `recovered-*` id.
    pub tool_use: ToolUse,
    /// What kind of recovery was performed.
    pub recovery_type: RecoveryType,
    /// Byte offset where the JSON candidate started in the original text.
    pub json_position: usize,
    /// Length of the original thinking text.
    pub text_length: usize,
    /// How many candidates were tried before a match was found.
    pub candidates_tried: usize,
    /// The raw JSON text that was extracted.
    pub extracted_json: String,
    /// Up to 100 bytes of text before the JSON.
    pub context_before: String,
    /// Up to 100 bytes of text after the JSON.
    pub context_after: String,
}

/// Attempts to recover a tool call from `thinking` text against `registry`.
#[must_use]
pub fn try_recover_tool_call_from_thinking(
    thinking: &str,
    registry: &ToolRegistry,
) -> Option<RecoveryResult> {
    if thinking.is_empty() {
        return None;
    }

    let text_length = thinking.len();
    let stripped = thinking.trim();
    let mut candidates_tried = 0;

    for (args, json_start, json_end) in extract_json_candidates(stripped) {
        candidates_tried += 1;

        let tool_use = match_args_to_tool(&args, registry)
            .or_else(|| match_with_context(&stripped[..json_start], &args, registry));

        if let Some(tool_use) = tool_use {
            let recovery_type = if stripped.ends_with('}') && json_end + 1 >= stripped.len() {
                RecoveryType::TrailingJson
            } else if candidates_tried > 1 {
                RecoveryType::FallbackJson
            } else {
                RecoveryType::JsonWithTrailingText
            };

            let context_start = json_start.saturating_sub(100);
            let context_before = stripped[context_start..json_start].to_string();
            let context_after_end = (json_end + 1 + 100).min(stripped.len());
            let context_after = stripped[json_end + 1..context_after_end].to_string();

            return Some(RecoveryResult {
                tool_use,
                recovery_type,
                json_position: json_start,
                text_length,
                candidates_tried,
                extracted_json: stripped[json_start..=json_end].to_string(),
                context_before,
                context_after,
            });
        }
    }

    None
}

/// Enumerates `{...}` JSON-object candidates from the end of `text` to the
/// start: for each `}` (closest to the end first), tries `{` positions from
/// closest to furthest until one parses as a JSON object.
fn extract_json_candidates(text: &str) -> Vec<(Value, usize, usize)> {
    let bytes = text.as_bytes();
    let close_positions: Vec<usize> = bytes
        .iter()
        .enumerate()
        .filter(|(_, &b)| b == b'}')
        .map(|(i, _)| i)
        .collect();

    let mut out = Vec::new();
    let mut yielded: std::collections::HashSet<(usize, usize)> = std::collections::HashSet::new();

    for &close_pos in close_positions.iter().rev() {
        let text_to_close = &text[..=close_pos];
        let open_positions: Vec<usize> = text_to_close
            .as_bytes()
            .iter()
            .enumerate()
            .filter(|(_, &b)| b == b'{')
            .map(|(i, _)| i)
            .collect();

        for &open_pos in open_positions.iter().rev() {
            if yielded.contains(&(open_pos, close_pos)) {
                continue;
            }
            let candidate = &text_to_close[open_pos..];
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
                yielded.insert((open_pos, close_pos));
                out.push((value, open_pos, close_pos));
                break;
            }
        }
    }

    out
}

fn match_args_to_tool(args: &Value, registry: &ToolRegistry) -> Option<ToolUse> {
    let Value::Object(arg_map) = args else {
        return None;
    };

    let mut best: Option<(&str, i64)> = None;

    for tool in registry.iter() {
        let schema = tool.input_schema();
        let required: std::collections::HashSet<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        let properties: std::collections::HashSet<&str> = schema
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|m| m.keys().map(String::as_str))
            .collect();
        let arg_keys: std::collections::HashSet<&str> =
            arg_map.keys().map(String::as_str).collect();

        if !required.is_subset(&arg_keys) {
            continue;
        }

        let valid_keys: std::collections::HashSet<&&str> =
            arg_keys.intersection(&properties).collect();
        if valid_keys.is_empty() {
            continue;
        }

        let mut score = i64::try_from(valid_keys.len()).unwrap_or(i64::MAX);
        if !required.is_empty() {
            score += 10;
        }

        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((tool.name(), score));
        }
    }

    best.map(|(name, _)| new_recovered(name, args.clone()))
}

fn match_with_context(text_before: &str, args: &Value, registry: &ToolRegistry) -> Option<ToolUse> {
    let Value::Object(arg_map) = args else {
        return None;
    };

    let start = text_before.len().saturating_sub(500);
    let context = text_before[start..].to_lowercase();

    for tool in registry.iter() {
        let name_lower = tool.name().to_lowercase();
        let variants = [
            name_lower.clone(),
            name_lower.replace('_', " "),
            name_lower.replace('_', ""),
        ];

        if !variants.iter().any(|v| context.contains(v.as_str())) {
            continue;
        }

        let schema = tool.input_schema();
        let properties: std::collections::HashSet<&str> = schema
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|m| m.keys().map(String::as_str))
            .collect();
        let arg_keys: std::collections::HashSet<&str> =
            arg_map.keys().map(String::as_str).collect();

        if arg_keys.intersection(&properties).next().is_some() {
            return Some(new_recovered(tool.name(), args.clone()));
        }
    }

    None
}

fn new_recovered(name: &str, input: Value) -> ToolUse {
    let id = format!("recovered-{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
    let mut tool_use = ToolUse::new(id, name.to_string(), input);
    tool_use.is_recovered = true;
    tool_use
}
