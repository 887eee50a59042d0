//! Command loader: parses `<plugin>/commands/*.md` into templates.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::manifest::Plugin;

#[derive(Debug, Deserialize, Default)]
struct CommandFrontmatter {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    args: Vec<String>,
}

/// A command template loaded from one `*.md` file.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    /// Command name.
    pub name: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// Declared argument names, for documentation and validation.
    pub args: Vec<String>,
    /// The markdown body, a template string.
    pub body: String,
}

impl CommandTemplate {
    /// Render this template: substitutes `{{args}}` (the caller's raw
    /// argument string), `{{cwd}}`, `{{env.VAR}}` (missing env vars
    /// become empty), and any caller-provided `vars`.
    #[must_use]
    pub fn render(&self, args: &str, cwd: &Path, vars: &HashMap<String, String>) -> String {
        let mut out = self.body.clone();
        out = out.replace("{{args}}", args);
        out = out.replace("{{cwd}}", &cwd.to_string_lossy());
        for (key, value) in vars {
            out = out.replace(&format!("{{{{{key}}}}}"), value);
        }
        out = substitute_env(&out);
        out
    }
}

fn substitute_env(template: &str) -> String {
    let re = Regex::new(r"\{\{env\.([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("valid regex");
    re.replace_all(template, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

/// Parse every `*.md` under `<plugin>/commands/` into named templates.
/// Aliases register as separate entries pointing to the same template.
/// Malformed files are logged and skipped.
#[must_use]
pub fn load_from_plugin(plugin: &Plugin) -> HashMap<String, CommandTemplate> {
    let mut out = HashMap::new();
    let dir = plugin.subdir("commands");
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return out;
    };

    let mut paths: Vec<_> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Some((frontmatter, body)) = split_frontmatter(&text) else {
            tracing::warn!(path = %path.display(), "command file missing frontmatter, skipping");
            continue;
        };
        let parsed: CommandFrontmatter = match serde_yaml::from_str(frontmatter) {
            Ok(f) => f,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "invalid command frontmatter, skipping");
                continue;
            }
        };
        if parsed.name.is_empty() || parsed.name.len() > 64 {
            tracing::warn!(path = %path.display(), "command name out of range, skipping");
            continue;
        }

        let template = CommandTemplate {
            name: parsed.name.clone(),
            description: parsed.description.clone(),
            args: parsed.args.clone(),
            body: body.trim_start_matches('\n').to_string(),
        };
        out.insert(parsed.name.clone(), template.clone());
        for alias in &parsed.aliases {
            out.insert(alias.clone(), template.clone());
        }
    }
    out
}

fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---\n")?;
    let end = rest.find("\n---")?;
    let frontmatter = &rest[..end];
    let after_marker = &rest[end + 4..];
    let body = after_marker.strip_prefix('\n').unwrap_or(after_marker);
    Some((frontmatter, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{PluginManifest, PluginSource};
    use std::path::PathBuf;

    fn plugin_at(dir: &Path) -> Plugin {
        Plugin {
            manifest: PluginManifest {
                name: "p".into(),
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
            source: PluginSource::Directory,
        }
    }

    #[test]
    fn loads_template_and_aliases() {
        let tmp = tempfile::tempdir().unwrap();
        let commands_dir = tmp.path().join("commands");
        std::fs::create_dir_all(&commands_dir).unwrap();
        std::fs::write(
            commands_dir.join("commit.md"),
            "---\nname: commit\ndescription: make a commit\naliases: [ci]\n---\ngit commit -m \"{{args}}\" in {{cwd}}\n",
        )
        .unwrap();

        let plugin = plugin_at(tmp.path());
        let templates = load_from_plugin(&plugin);
        assert!(templates.contains_key("commit"));
        assert!(templates.contains_key("ci"));

        let rendered = templates["commit"].render("fix bug", &PathBuf::from("/work"), &HashMap::new());
        assert_eq!(rendered, "git commit -m \"fix bug\" in /work\n");
    }

    #[test]
    fn env_substitution_handles_missing_vars() {
        let template = CommandTemplate {
            name: "x".into(),
            description: None,
            args: Vec::new(),
            body: "value={{env.DEFINITELY_NOT_SET_XYZ}}".into(),
        };
        let rendered = template.render("", Path::new("."), &HashMap::new());
        assert_eq!(rendered, "value=");
    }

    #[test]
    fn missing_commands_dir_yields_empty_map() {
        let tmp = tempfile::tempdir().unwrap();
        let plugin = plugin_at(tmp.path());
        assert!(load_from_plugin(&plugin).is_empty());
    }
}
