//! `ModelProfile`: a per-model bundle of system-prompt fragments and API
//! parameters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A per-model bundle of system-prompt prefix/suffix, named patterns, and
/// API parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Profile name. Exact matches against a model name take priority
    /// over family matches.
    pub name: String,
    /// Model family prefix this profile applies to (e.g. `"gpt-oss"`),
    /// used by [`crate::ProfileManager::resolve`] when no exact name
    /// match exists.
    #[serde(default)]
    pub family: Option<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Text prepended before the base system prompt.
    #[serde(default)]
    pub system_prompt_prefix: Option<String>,
    /// Text appended after the base system prompt.
    #[serde(default)]
    pub system_prompt_suffix: Option<String>,
    /// Named prompt fragments, keyed by pattern name.
    #[serde(default)]
    pub prompt_patterns: HashMap<String, String>,
    /// Which `prompt_patterns` entries are active, in render order.
    #[serde(default)]
    pub enabled_patterns: Vec<String>,
    /// Default sampling temperature.
    #[serde(default)]
    pub default_temperature: Option<f64>,
    /// Arbitrary provider-specific API parameters.
    #[serde(default)]
    pub api_params: HashMap<String, Value>,
    /// Minimum `max_tokens` this profile requires.
    #[serde(default)]
    pub min_max_tokens: Option<u64>,
}

impl ModelProfile {
    /// A minimal profile with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: None,
            description: None,
            system_prompt_prefix: None,
            system_prompt_suffix: None,
            prompt_patterns: HashMap::new(),
            enabled_patterns: Vec::new(),
            default_temperature: None,
            api_params: HashMap::new(),
            min_max_tokens: None,
        }
    }

    /// Build the final system prompt: prefix, then each enabled pattern
    /// (in order, missing patterns skipped), then `base`, then suffix.
    /// Non-empty pieces are joined with blank lines.
    #[must_use]
    pub fn build_system_prompt(&self, base: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();

        if let Some(prefix) = self.system_prompt_prefix.as_deref().filter(|s| !s.is_empty()) {
            parts.push(prefix);
        }
        let mut pattern_texts: Vec<&str> = Vec::new();
        for pattern_name in &self.enabled_patterns {
            if let Some(text) = self.prompt_patterns.get(pattern_name).filter(|s| !s.is_empty()) {
                pattern_texts.push(text);
            }
        }
        parts.extend(pattern_texts);
        if !base.is_empty() {
            parts.push(base);
        }
        if let Some(suffix) = self.system_prompt_suffix.as_deref().filter(|s| !s.is_empty()) {
            parts.push(suffix);
        }

        parts.join("\n\n")
    }

    /// Non-empty, enabled-order render of this profile's injected
    /// pieces, used by `brynhild-context` to log one injection per slot.
    #[must_use]
    pub fn injection_pieces(&self) -> Vec<(&'static str, &str)> {
        let mut pieces = Vec::new();
        if let Some(prefix) = self.system_prompt_prefix.as_deref().filter(|s| !s.is_empty()) {
            pieces.push(("prefix", prefix));
        }
        for pattern_name in &self.enabled_patterns {
            if let Some(text) = self.prompt_patterns.get(pattern_name).filter(|s| !s.is_empty()) {
                pieces.push(("pattern", text.as_str()));
            }
        }
        if let Some(suffix) = self.system_prompt_suffix.as_deref().filter(|s| !s.is_empty()) {
            pieces.push(("suffix", suffix));
        }
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_system_prompt_orders_prefix_patterns_base_suffix() {
        let mut profile = ModelProfile::new("test");
        profile.system_prompt_prefix = Some("PREFIX".into());
        profile.system_prompt_suffix = Some("SUFFIX".into());
        profile.prompt_patterns.insert("a".into(), "PATTERN-A".into());
        profile.prompt_patterns.insert("b".into(), "PATTERN-B".into());
        profile.enabled_patterns = vec!["b".into(), "a".into()];

        let result = profile.build_system_prompt("BASE");
        assert_eq!(result, "PREFIX\n\nPATTERN-B\n\nPATTERN-A\n\nBASE\n\nSUFFIX");
    }

    #[test]
    fn disabled_patterns_are_skipped() {
        let mut profile = ModelProfile::new("test");
        profile.prompt_patterns.insert("a".into(), "A".into());
        assert_eq!(profile.build_system_prompt("BASE"), "BASE");
    }

    #[test]
    fn round_trips_through_dict() {
        let mut profile = ModelProfile::new("claude-family");
        profile.family = Some("claude".into());
        profile.default_temperature = Some(0.7);
        let json = serde_json::to_value(&profile).unwrap();
        let back: ModelProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
        assert_eq!(
            back.build_system_prompt("base"),
            profile.build_system_prompt("base")
        );
    }
}
