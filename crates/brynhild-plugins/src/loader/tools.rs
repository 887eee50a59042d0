//! Tool loader: descriptor-only discovery of `<plugin>/tools/*.py`.
//!
//! The original duck-types a Python module at runtime: any class with a
//! `name` attribute and an `execute` or `run` method becomes a tool.
//! This runtime does not embed a Python interpreter, so plugin tools are
//! not executable here; what's loaded is a descriptor recording that the
//! file declares a tool-shaped class, for catalog/documentation purposes
//! and for a future process-isolated execution bridge to consume.

use std::collections::HashMap;

use std::sync::OnceLock;

use regex::Regex;

use crate::manifest::Plugin;

fn class_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^class\s+(\w+)\s*(?:\([^)]*\))?:").expect("valid regex"))
}

fn name_attr_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?m)^\s*name\s*=\s*["']([^"']+)["']"#).expect("valid regex"))
}

/// A tool-shaped class found in a plugin's `tools/` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// The tool's declared `name` class attribute.
    pub name: String,
    /// Source file this class was found in, relative to the plugin.
    pub file_stem: String,
    /// Whether the class defines an `execute` method.
    pub has_execute: bool,
    /// Whether the class defines a `run` method.
    pub has_run: bool,
}

/// Scan every `*.py` under `<plugin>/tools/` (skipping dunder and
/// underscore-prefixed files) for duck-typed tool classes. Files that
/// fail to parse as UTF-8 are logged and skipped; discovery never fails
/// for one bad file.
#[must_use]
pub fn load_from_plugin(plugin: &Plugin) -> HashMap<String, ToolDescriptor> {
    let mut out = HashMap::new();
    let dir = plugin.subdir("tools");
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return out;
    };

    let mut paths: Vec<_> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with('_') {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&path) else {
            tracing::warn!(path = %path.display(), "tool file is not valid UTF-8, skipping");
            continue;
        };

        for descriptor in extract_descriptors(&text, stem) {
            out.insert(descriptor.name.clone(), descriptor);
        }
    }
    out
}

fn extract_descriptors(source: &str, file_stem: &str) -> Vec<ToolDescriptor> {
    let mut descriptors = Vec::new();
    let class_starts: Vec<(usize, &str)> = class_pattern()
        .captures_iter(source)
        .filter_map(|c| {
            let m = c.get(0)?;
            let name = c.get(1)?.as_str();
            Some((m.start(), name))
        })
        .collect();

    for (i, (start, _class_name)) in class_starts.iter().enumerate() {
        let end = class_starts.get(i + 1).map_or(source.len(), |next| next.0);
        let body = &source[*start..end];

        let Some(name_cap) = name_attr_pattern().captures(body) else {
            continue;
        };
        let name = name_cap[1].to_string();
        let has_execute = body.contains("def execute(");
        let has_run = body.contains("def run(");
        if !has_execute && !has_run {
            continue;
        }

        descriptors.push(ToolDescriptor {
            name,
            file_stem: file_stem.to_string(),
            has_execute,
            has_run,
        });
    }
    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{PluginManifest, PluginSource};
    use std::path::Path;

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
    fn finds_duck_typed_tool_class() {
        let tmp = tempfile::tempdir().unwrap();
        let tools_dir = tmp.path().join("tools");
        std::fs::create_dir_all(&tools_dir).unwrap();
        std::fs::write(
            tools_dir.join("weather.py"),
            "class WeatherTool:\n    name = \"weather\"\n\n    def execute(self, args):\n        pass\n",
        )
        .unwrap();

        let descriptors = load_from_plugin(&plugin_at(tmp.path()));
        assert_eq!(descriptors.len(), 1);
        let tool = &descriptors["weather"];
        assert!(tool.has_execute);
        assert!(!tool.has_run);
        assert_eq!(tool.file_stem, "weather");
    }

    #[test]
    fn skips_underscore_files_and_classes_without_executable_method() {
        let tmp = tempfile::tempdir().unwrap();
        let tools_dir = tmp.path().join("tools");
        std::fs::create_dir_all(&tools_dir).unwrap();
        std::fs::write(tools_dir.join("_helpers.py"), "class Helper:\n    name = \"helper\"\n").unwrap();
        std::fs::write(
            tools_dir.join("noop.py"),
            "class NotATool:\n    name = \"noop\"\n    def other(self):\n        pass\n",
        )
        .unwrap();

        assert!(load_from_plugin(&plugin_at(tmp.path())).is_empty());
    }
}
