//! Name validation shared by plugins, skills, and profiles.

use std::sync::OnceLock;

use regex::Regex;

fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").expect("valid regex"))
}

/// Validate a plugin/skill/profile name: `^[a-z0-9]([a-z0-9-]*[a-z0-9])?$`,
/// 1-64 characters.
#[must_use]
pub fn is_valid_component_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 64 && name_pattern().is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        assert!(is_valid_component_name("a"));
        assert!(is_valid_component_name("commit-helper"));
        assert!(is_valid_component_name("tool9"));
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(!is_valid_component_name(""));
        assert!(!is_valid_component_name("-leading"));
        assert!(!is_valid_component_name("trailing-"));
        assert!(!is_valid_component_name("Has_Underscore"));
        assert!(!is_valid_component_name("UPPER"));
        assert!(!is_valid_component_name(&"a".repeat(65)));
    }
}
