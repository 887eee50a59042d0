//! `ContextBuilder`: merges rules, skill metadata, and a model profile
//! into the final system prompt (spec.md §4.8).

use brynhild_profiles::ProfileManager;
use brynhild_rules::RulesManager;
use brynhild_skills::SkillRegistry;

use crate::error::ContextResult;
use crate::types::{ConversationContext, Injection, InjectionLocation};

/// Builds a [`ConversationContext`] from a base prompt plus the rules,
/// skills, and profile subsystems. Stateless; every input is passed in,
/// so the same inputs always produce the same output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextBuilder;

impl ContextBuilder {
    /// Assemble the system prompt, in the fixed order: rules prepend,
    /// skill metadata append, profile prefix/patterns/suffix wrap.
    ///
    /// `rules_manager` is `None` when rules injection is disabled by
    /// config; likewise `inject_skill_metadata` gates the skills step
    /// independently of whether a registry was built (a registry is
    /// still needed for `/skill` triggers even when its catalog isn't
    /// injected into the prompt).
    ///
    /// # Errors
    /// Returns [`crate::ContextError::Rules`] if rule file discovery
    /// fails (a file exists but can't be read).
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        base_prompt: &str,
        mut rules_manager: Option<&mut RulesManager>,
        skill_registry: SkillRegistry,
        inject_skill_metadata: bool,
        profile_manager: &ProfileManager,
        model: &str,
        provider: Option<&str>,
    ) -> ContextResult<ConversationContext> {
        let mut injections = Vec::new();
        let mut prompt = base_prompt.to_string();

        if let Some(manager) = rules_manager.as_deref_mut() {
            let files = manager.discover()?;
            if !files.is_empty() {
                for file in &files {
                    injections.push(Injection {
                        source: "rules".to_string(),
                        location: InjectionLocation::SystemPromptPrepend,
                        content: file.content.clone(),
                        origin: Some(file.path.display().to_string()),
                        trigger_type: None,
                        trigger_match: None,
                    });
                }
                let joined = files
                    .iter()
                    .map(|f| f.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n---\n");
                let wrapped = format!("<project_rules>\n{joined}\n</project_rules>");
                prompt = join_nonempty(&[&wrapped, &prompt]);
            }
        }

        if inject_skill_metadata {
            let metadata = skill_registry.get_metadata_for_prompt();
            if !metadata.is_empty() {
                injections.push(Injection {
                    source: "skill_metadata".to_string(),
                    location: InjectionLocation::SystemPromptAppend,
                    content: metadata.clone(),
                    origin: None,
                    trigger_type: None,
                    trigger_match: None,
                });
                prompt = join_nonempty(&[&prompt, &metadata]);
            }
        }

        let profile = profile_manager.resolve(model, provider).cloned();
        let system_prompt = if let Some(profile) = &profile {
            for (kind, text) in profile.injection_pieces() {
                let location = if kind == "suffix" {
                    InjectionLocation::SystemPromptAppend
                } else {
                    InjectionLocation::SystemPromptPrepend
                };
                injections.push(Injection {
                    source: "profile".to_string(),
                    location,
                    content: text.to_string(),
                    origin: Some(profile.name.clone()),
                    trigger_type: None,
                    trigger_match: None,
                });
            }
            profile.build_system_prompt(&prompt)
        } else {
            prompt.clone()
        };

        Ok(ConversationContext {
            system_prompt,
            base_prompt: base_prompt.to_string(),
            injections,
            profile,
            skill_registry,
        })
    }
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .copied()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use brynhild_profiles::ModelProfile;

    fn empty_skills() -> SkillRegistry {
        SkillRegistry::discover(None, None, &[], None)
    }

    #[test]
    fn no_rules_no_skills_no_profile_yields_base_prompt_unchanged() {
        let ctx = ContextBuilder::build(
            "BASE",
            None,
            empty_skills(),
            false,
            &ProfileManager::new(),
            "gpt-oss-120b",
            None,
        )
        .unwrap();
        assert_eq!(ctx.system_prompt, "BASE");
        assert!(ctx.injections.is_empty());
        assert!(ctx.profile.is_none());
    }

    #[test]
    fn rules_are_discovered_prepended_and_logged_per_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("AGENTS.md"), "be nice").unwrap();
        let mut rules = RulesManager::new(tmp.path().to_path_buf(), Some(tmp.path().to_path_buf()))
            .with_global_rules_dir(tmp.path().join("no-such-dir"));

        let ctx = ContextBuilder::build(
            "BASE",
            Some(&mut rules),
            empty_skills(),
            false,
            &ProfileManager::new(),
            "gpt-oss-120b",
            None,
        )
        .unwrap();

        assert!(ctx.system_prompt.contains("<project_rules>"));
        assert!(ctx.system_prompt.contains("be nice"));
        assert!(ctx.system_prompt.ends_with("BASE"));
        assert_eq!(ctx.injections.len(), 1);
        assert_eq!(ctx.injections[0].source, "rules");
    }

    #[test]
    fn profile_wraps_accumulated_prompt_and_logs_each_slot() {
        let mut profiles = ProfileManager::new();
        let mut profile = ModelProfile::new("gpt-oss");
        profile.family = Some("gpt-oss".to_string());
        profile.system_prompt_prefix = Some("PREFIX".to_string());
        profile.system_prompt_suffix = Some("SUFFIX".to_string());
        profiles.insert_builtin(profile);

        let ctx = ContextBuilder::build(
            "BASE",
            None,
            empty_skills(),
            false,
            &profiles,
            "gpt-oss-120b",
            None,
        )
        .unwrap();

        assert_eq!(ctx.system_prompt, "PREFIX\n\nBASE\n\nSUFFIX");
        assert_eq!(ctx.injections.len(), 2);
        assert_eq!(ctx.injections[0].source, "profile");
        assert_eq!(ctx.profile.unwrap().name, "gpt-oss");
    }

    #[test]
    fn prompt_hash_is_deterministic_for_same_inputs() {
        let a = ContextBuilder::build(
            "BASE",
            None,
            empty_skills(),
            false,
            &ProfileManager::new(),
            "m",
            None,
        )
        .unwrap();
        let b = ContextBuilder::build(
            "BASE",
            None,
            empty_skills(),
            false,
            &ProfileManager::new(),
            "m",
            None,
        )
        .unwrap();
        assert_eq!(a.prompt_hash(), b.prompt_hash());
    }
}
