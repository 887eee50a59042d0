//! Provider loader: descriptor-only discovery of
//! `<plugin>/providers/*.py`.
//!
//! Same duck-typing mechanism as [`crate::loader::tools`]: a class is a
//! provider if it exposes `PROVIDER_NAME` (or falls back to the file
//! stem) plus `name`, `model`, and at least one of `complete`/`stream`.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::manifest::Plugin;

fn class_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^class\s+(\w+)\s*(?:\([^)]*\))?:").expect("valid regex"))
}

fn provider_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*PROVIDER_NAME\s*=\s*["']([^"']+)["']"#).expect("valid regex")
    })
}

/// A provider-shaped class found in a plugin's `providers/` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// `PROVIDER_NAME`, or the file stem if absent.
    pub name: String,
    /// Source file this class was found in.
    pub file_stem: String,
    /// Whether the class defines `complete`.
    pub has_complete: bool,
    /// Whether the class defines `stream`.
    pub has_stream: bool,
}

/// Scan `<plugin>/providers/*.py` (skipping dunder/underscore files)
/// for duck-typed provider classes.
#[must_use]
pub fn load_from_plugin(plugin: &Plugin) -> HashMap<String, ProviderDescriptor> {
    let mut out = HashMap::new();
    let dir = plugin.subdir("providers");
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
            continue;
        };

        for descriptor in extract_descriptors(&text, stem) {
            out.insert(descriptor.name.clone(), descriptor);
        }
    }
    out
}

fn extract_descriptors(source: &str, file_stem: &str) -> Vec<ProviderDescriptor> {
    let mut descriptors = Vec::new();
    let class_starts: Vec<usize> = class_pattern()
        .find_iter(source)
        .map(|m| m.start())
        .collect();

    for (i, start) in class_starts.iter().enumerate() {
        let end = class_starts.get(i + 1).copied().unwrap_or(source.len());
        let body = &source[*start..end];

        let has_name_attr = Regex::new(r#"(?m)^\s*name\s*=\s*["'][^"']+["']"#)
            .expect("valid regex")
            .is_match(body)
            || body.contains("def name(")
            || body.contains("self.name");
        let has_model_attr = body.contains("model") ;
        let has_complete = body.contains("def complete(");
        let has_stream = body.contains("def stream(");

        if !has_name_attr || !has_model_attr || (!has_complete && !has_stream) {
            continue;
        }

        let name = provider_name_pattern()
            .captures(body)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| file_stem.to_string());

        descriptors.push(ProviderDescriptor {
            name,
            file_stem: file_stem.to_string(),
            has_complete,
            has_stream,
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
    fn uses_provider_name_attribute_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        let providers_dir = tmp.path().join("providers");
        std::fs::create_dir_all(&providers_dir).unwrap();
        std::fs::write(
            providers_dir.join("acme.py"),
            "class AcmeProvider:\n    PROVIDER_NAME = \"acme\"\n    name = \"acme\"\n    model = \"acme-1\"\n\n    def complete(self, messages):\n        pass\n",
        )
        .unwrap();

        let descriptors = load_from_plugin(&plugin_at(tmp.path()));
        assert!(descriptors.contains_key("acme"));
        assert!(descriptors["acme"].has_complete);
    }

    #[test]
    fn falls_back_to_file_stem_without_provider_name() {
        let tmp = tempfile::tempdir().unwrap();
        let providers_dir = tmp.path().join("providers");
        std::fs::create_dir_all(&providers_dir).unwrap();
        std::fs::write(
            providers_dir.join("beta.py"),
            "class BetaProvider:\n    name = \"beta\"\n    model = \"beta-1\"\n\n    def stream(self, messages):\n        pass\n",
        )
        .unwrap();

        let descriptors = load_from_plugin(&plugin_at(tmp.path()));
        assert!(descriptors.contains_key("beta"));
        assert!(descriptors["beta"].has_stream);
    }
}
