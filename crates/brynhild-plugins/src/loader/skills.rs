//! Skill loader: parses `<plugin>/skills/*/SKILL.md` directories.

use std::collections::HashMap;

use brynhild_skills::{load_skill, Skill, SkillSource};

use crate::manifest::Plugin;

/// Load every skill directory under `<plugin>/skills/` (any immediate
/// subdirectory containing `SKILL.md`), tagged with source
/// `plugin:<plugin-name>`. Invalid skills are logged and skipped.
#[must_use]
pub fn load_from_plugin(plugin: &Plugin) -> HashMap<String, Skill> {
    let mut out = HashMap::new();
    let dir = plugin.subdir("skills");
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return out;
    };

    let mut paths: Vec<_> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
    paths.sort();

    let source = SkillSource::Plugin(plugin.name().to_string());
    for skill_dir in paths {
        if !skill_dir.is_dir() || !skill_dir.join("SKILL.md").is_file() {
            continue;
        }
        match load_skill(&skill_dir, source.clone()) {
            Ok(skill) => {
                out.insert(skill.name().to_string(), skill);
            }
            Err(err) => {
                tracing::warn!(path = %skill_dir.display(), error = %err, "skipping invalid plugin skill");
            }
        }
    }
    out
}

/// The `(plugin name, skills dir)` pairs for every enabled plugin that
/// ships a `skills/` directory, in the shape `SkillRegistry::discover`
/// expects.
#[must_use]
pub fn plugin_skill_dirs(plugins: &[&Plugin]) -> Vec<(String, std::path::PathBuf)> {
    plugins
        .iter()
        .map(|p| (p.name().to_string(), p.subdir("skills")))
        .filter(|(_, dir)| dir.is_dir())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{PluginManifest, PluginSource as PSource};
    use std::path::Path;

    fn plugin_at(dir: &Path, name: &str) -> Plugin {
        Plugin {
            manifest: PluginManifest {
                name: name.to_string(),
                version: "1.0".into(),
                description: None,
                commands: Vec::new(),
                tools: Vec::new(),
                hooks: false,
                skills: Vec::new(),
                providers: None,
            },
            path: dir.to_path_buf(),
            enabled: true,
            source: PSource::Directory,
        }
    }

    #[test]
    fn loads_skill_with_plugin_source_tag() {
        let tmp = tempfile::tempdir().unwrap();
        let skill_dir = tmp.path().join("skills").join("greeter");
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join("SKILL.md"),
            "---\nname: greeter\ndescription: says hi\n---\nbody",
        )
        .unwrap();

        let plugin = plugin_at(tmp.path(), "my-plugin");
        let skills = load_from_plugin(&plugin);
        let skill = &skills["greeter"];
        assert_eq!(skill.source, SkillSource::Plugin("my-plugin".to_string()));
    }
}
