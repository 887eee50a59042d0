//! `SkillRegistry`: aggregates skills from every discovery source and
//! serves progressive disclosure.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use brynhild_tools::SkillLookup;

use crate::error::SkillResult;
use crate::skill::{load_skill, Skill, SkillSource};

/// Aggregates skills discovered from built-in, global, plugin, and
/// project sources. Later sources override earlier ones by name, per the
/// priority order in spec.md §4.10.
pub struct SkillRegistry {
    skills: Vec<Skill>,
    index: HashMap<String, usize>,
    reference_cache: Mutex<HashMap<(String, String), String>>,
}

impl SkillRegistry {
    /// Discover skills from every source directory, in override order:
    /// built-in, global, each plugin (in the order given), then project.
    /// A source directory's immediate subdirectories are each treated as
    /// one skill candidate; entries without a `SKILL.md`, or with an
    /// invalid one, are logged and skipped (discovery as a whole never
    /// fails for one bad skill).
    #[must_use]
    pub fn discover(
        builtin_dir: Option<&Path>,
        global_dir: Option<&Path>,
        plugin_skill_dirs: &[(String, std::path::PathBuf)],
        project_dir: Option<&Path>,
    ) -> Self {
        let mut skills = Vec::new();

        if let Some(dir) = builtin_dir {
            load_source_dir(dir, SkillSource::Builtin, &mut skills);
        }
        if let Some(dir) = global_dir {
            load_source_dir(dir, SkillSource::Global, &mut skills);
        }
        for (plugin_name, dir) in plugin_skill_dirs {
            load_source_dir(dir, SkillSource::Plugin(plugin_name.clone()), &mut skills);
        }
        if let Some(dir) = project_dir {
            load_source_dir(dir, SkillSource::Project, &mut skills);
        }

        let mut index = HashMap::new();
        for (i, skill) in skills.iter().enumerate() {
            index.insert(skill.name().to_string(), i);
        }

        Self {
            skills,
            index,
            reference_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Every registered skill, in discovery order (later duplicates win,
    /// so this list has no name collisions).
    #[must_use]
    pub fn list_skills(&self) -> &[Skill] {
        &self.skills
    }

    /// Look up a skill by name.
    #[must_use]
    pub fn get_skill(&self, name: &str) -> Option<&Skill> {
        self.index.get(name).map(|&i| &self.skills[i])
    }

    /// Level 1: a human-readable block listing every skill's name and
    /// description, for inclusion in the system prompt.
    #[must_use]
    pub fn get_metadata_for_prompt(&self) -> String {
        if self.skills.is_empty() {
            return String::new();
        }
        self.skills
            .iter()
            .map(Skill::metadata_for_prompt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Level 2: the skill's body wrapped as `<skill name="X">…</skill>`,
    /// or `None` if no skill of that name exists.
    #[must_use]
    pub fn trigger_skill(&self, name: &str) -> Option<String> {
        self.get_skill(name).map(Skill::triggered_body)
    }

    /// Level 3: read and cache one reference file belonging to a skill.
    #[must_use]
    pub fn get_reference_file(&self, skill: &str, file: &str) -> Option<String> {
        let key = (skill.to_string(), file.to_string());
        if let Some(cached) = self.reference_cache.lock().expect("not poisoned").get(&key) {
            return Some(cached.clone());
        }
        let s = self.get_skill(skill)?;
        let path = s
            .list_reference_files()
            .into_iter()
            .find(|p| p.file_name().is_some_and(|n| n == file))?;
        let content = std::fs::read_to_string(path).ok()?;
        self.reference_cache
            .lock()
            .expect("not poisoned")
            .insert(key, content.clone());
        Some(content)
    }

    /// Weak keyword search over names and descriptions: counts
    /// whitespace-tokenized overlaps between `text` and each skill's name
    /// and description, case-insensitively. Returns up to `max_results`
    /// skills with at least one match, best first.
    #[must_use]
    pub fn find_matching_skills(&self, text: &str, max_results: usize) -> Vec<&Skill> {
        let query_tokens: std::collections::HashSet<String> =
            text.to_lowercase().split_whitespace().map(str::to_string).collect();

        let mut scored: Vec<(usize, &Skill)> = self
            .skills
            .iter()
            .filter_map(|s| {
                let haystack = format!("{} {}", s.name(), s.description()).to_lowercase();
                let haystack_tokens: std::collections::HashSet<&str> =
                    haystack.split_whitespace().collect();
                let score = query_tokens
                    .iter()
                    .filter(|t| haystack_tokens.contains(t.as_str()) || haystack.contains(t.as_str()))
                    .count();
                (score > 0).then_some((score, s))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(max_results).map(|(_, s)| s).collect()
    }
}

fn load_source_dir(dir: &Path, source: SkillSource, skills: &mut Vec<Skill>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match load_skill(&path, source.clone()) {
            Ok(skill) => skills.push(skill),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping invalid skill");
            }
        }
    }
}

#[async_trait]
impl SkillLookup for SkillRegistry {
    fn list_skills(&self) -> Vec<(String, String)> {
        SkillRegistry::list_skills(self)
            .iter()
            .map(|s| (s.name().to_string(), s.description().to_string()))
            .collect()
    }

    fn get_skill_body(&self, name: &str) -> Option<String> {
        self.get_skill(name).map(|s| s.body.clone())
    }

    fn list_resources(&self, name: &str) -> Option<Vec<String>> {
        let s = self.get_skill(name)?;
        let mut resources: Vec<String> = s
            .list_reference_files()
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| format!("references/{}", n.to_string_lossy())))
            .collect();
        resources.extend(
            s.list_scripts()
                .into_iter()
                .filter_map(|p| p.file_name().map(|n| format!("scripts/{}", n.to_string_lossy()))),
        );
        Some(resources)
    }

    fn get_reference_file(&self, name: &str, resource: &str) -> Option<String> {
        SkillRegistry::get_reference_file(self, name, resource)
    }

    fn get_script_path(&self, name: &str, script: &str) -> Option<String> {
        let s = self.get_skill(name)?;
        s.list_scripts()
            .into_iter()
            .find(|p| p.file_name().is_some_and(|n| n == script))
            .map(|p| p.to_string_lossy().into_owned())
    }
}

/// Convenience wrapper returning a fully-discovered registry, or an error
/// only if every source directory was unreadable in a way that should
/// surface (discovery itself never fails on a per-skill basis).
pub fn discover_default(project_root: Option<&Path>, plugin_skill_dirs: &[(String, std::path::PathBuf)]) -> SkillResult<SkillRegistry> {
    let global_dir = dirs::config_dir().map(|d| d.join("brynhild").join("skills"));
    let project_dir = project_root.map(|r| r.join(".brynhild").join("skills"));
    Ok(SkillRegistry::discover(
        None,
        global_dir.as_deref(),
        plugin_skill_dirs,
        project_dir.as_deref(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(dir: &Path, name: &str, desc: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: {desc}\n---\nbody for {name}"),
        )
        .unwrap();
    }

    #[test]
    fn later_sources_override_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let global = tmp.path().join("global");
        let project = tmp.path().join("project");
        write_skill(&global.join("x"), "x", "from global");
        write_skill(&project.join("x"), "x", "from project");

        let registry = SkillRegistry::discover(None, Some(&global), &[], Some(&project));
        assert_eq!(registry.get_skill("x").unwrap().description(), "from project");
    }

    #[test]
    fn trigger_unknown_skill_is_none() {
        let registry = SkillRegistry::discover(None, None, &[], None);
        assert!(registry.trigger_skill("nope").is_none());
    }

    #[test]
    fn find_matching_skills_scores_token_overlap() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        write_skill(&project.join("commit-helper"), "commit-helper", "Helps write git commits");
        write_skill(&project.join("pr-writer"), "pr-writer", "Writes pull request descriptions");

        let registry = SkillRegistry::discover(None, None, &[], Some(&project));
        let results = registry.find_matching_skills("help me write a commit message", 5);
        assert_eq!(results[0].name(), "commit-helper");
    }

    #[test]
    fn skill_lookup_trait_resolves_body_and_resources() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        let dir = project.join("s");
        write_skill(&dir, "s", "desc");
        std::fs::create_dir_all(dir.join("references")).unwrap();
        std::fs::write(dir.join("references").join("ref.md"), "reference content").unwrap();

        let registry = SkillRegistry::discover(None, None, &[], Some(&project));
        let lookup: &dyn SkillLookup = &registry;
        assert!(lookup.get_skill_body("s").unwrap().contains("body for s"));
        assert_eq!(
            lookup.list_resources("s").unwrap(),
            vec!["references/ref.md".to_string()]
        );
        assert_eq!(
            lookup.get_reference_file("s", "ref.md").unwrap(),
            "reference content"
        );
    }
}
