//! Rewrites an explicit `/skill name ...` user message into a skill-body
//! injection plus the remaining message text.

use crate::registry::SkillRegistry;

/// The outcome of preprocessing a user message for an explicit skill
/// trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessOutcome {
    /// No `/skill` prefix was present; the message is unchanged.
    Unchanged,
    /// A known skill was triggered. `injection` is the `<skill>`-wrapped
    /// body to inject; `remaining_message` is what's left of the user's
    /// text after the skill name.
    Triggered {
        /// The skill name that was triggered.
        skill_name: String,
        /// The `<skill name="...">…</skill>`-wrapped body to inject.
        injection: String,
        /// Text following the skill name, trimmed.
        remaining_message: String,
    },
    /// The message named a skill that doesn't exist. The processor
    /// should surface this as an error response, not call the model.
    UnknownSkill {
        /// The name the user asked for.
        requested: String,
    },
}

/// Rewrite `message` if it begins (case-insensitively) with
/// `/skill <name>`. Text after the name becomes the remaining message.
#[must_use]
pub fn preprocess(registry: &SkillRegistry, message: &str) -> PreprocessOutcome {
    let trimmed = message.trim_start();
    let Some(rest) = strip_prefix_ci(trimmed, "/skill") else {
        return PreprocessOutcome::Unchanged;
    };
    let rest = rest.trim_start();
    if rest.is_empty() {
        return PreprocessOutcome::UnknownSkill {
            requested: String::new(),
        };
    }

    let (name, remainder) = match rest.split_once(char::is_whitespace) {
        Some((name, remainder)) => (name, remainder.trim_start()),
        None => (rest, ""),
    };

    match registry.trigger_skill(name) {
        Some(injection) => PreprocessOutcome::Triggered {
            skill_name: name.to_string(),
            injection,
            remaining_message: remainder.to_string(),
        },
        None => PreprocessOutcome::UnknownSkill {
            requested: name.to_string(),
        },
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(name: &str, desc: &str) -> SkillRegistry {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: {desc}\n---\nbody"),
        )
        .unwrap();
        let registry = SkillRegistry::discover(None, None, &[], Some(tmp.path()));
        std::mem::forget(tmp);
        registry
    }

    #[test]
    fn non_skill_message_is_unchanged() {
        let registry = registry_with("commit-helper", "d");
        assert_eq!(
            preprocess(&registry, "hello there"),
            PreprocessOutcome::Unchanged
        );
    }

    #[test]
    fn triggers_known_skill_and_splits_remaining_text() {
        let registry = registry_with("commit-helper", "d");
        let outcome = preprocess(&registry, "/skill commit-helper help me commit");
        match outcome {
            PreprocessOutcome::Triggered {
                skill_name,
                remaining_message,
                ..
            } => {
                assert_eq!(skill_name, "commit-helper");
                assert_eq!(remaining_message, "help me commit");
            }
            other => panic!("expected Triggered, got {other:?}"),
        }
    }

    #[test]
    fn case_insensitive_prefix_and_unknown_name() {
        let registry = registry_with("commit-helper", "d");
        let outcome = preprocess(&registry, "/SKILL nonexistent");
        assert_eq!(
            outcome,
            PreprocessOutcome::UnknownSkill {
                requested: "nonexistent".to_string()
            }
        );
    }
}
