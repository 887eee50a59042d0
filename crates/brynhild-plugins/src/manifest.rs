//! `PluginManifest` and `Plugin`: the validated `plugin.yaml` shape and
//! the loaded plugin it describes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};

/// The `plugin.yaml` schema (spec.md §3): identity plus declared
/// component kinds. The declared `commands`/`tools`/`skills`/`providers`
/// lists are documentation only — actual components are discovered by
/// scanning the plugin's subdirectories (§4.6); they are not required to
/// match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name. Must match `^[a-z0-9]([a-z0-9-]*[a-z0-9])?$`,
    /// 1-64 chars, and (for directory-sourced plugins) the enclosing
    /// directory name.
    pub name: String,
    /// Semantic version string.
    pub version: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Declared command names.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Declared tool names.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Whether this plugin ships a `hooks.yaml`.
    #[serde(default)]
    pub hooks: bool,
    /// Declared skill names.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Declared provider names.
    #[serde(default)]
    pub providers: Option<Vec<String>>,
}

impl PluginManifest {
    /// Parse and validate a manifest's name against the shared
    /// component-name pattern.
    pub fn validate(&self) -> PluginResult<()> {
        if !brynhild_core::name::is_valid_component_name(&self.name) {
            return Err(PluginError::InvalidManifest {
                path: PathBuf::new(),
                reason: format!("invalid plugin name '{}'", self.name),
            });
        }
        Ok(())
    }
}

/// Where a [`Plugin`] was discovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginSource {
    /// A `plugin.yaml` found under a directory search path.
    Directory,
    /// A statically registered entry-point plugin (spec.md's Python
    /// `brynhild.plugins` entry-point group, adapted — see
    /// [`crate::discovery::EntryPointRegistry`]).
    EntryPoint,
    /// A synthetic plugin synthesized from an orphan provider entry
    /// point with no matching plugin.
    EntryPointProvider,
}

/// A loaded plugin: its manifest, on-disk location (synthetic for
/// entry-point sources), enabled bit, and source tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Plugin {
    /// The validated manifest.
    pub manifest: PluginManifest,
    /// The plugin's root directory, or a synthetic `<entry-point>` path
    /// for non-directory sources.
    pub path: PathBuf,
    /// Whether this plugin is currently enabled (registry overlay
    /// applied).
    pub enabled: bool,
    /// Discovery source.
    pub source: PluginSource,
}

impl Plugin {
    /// The plugin's name, from its manifest.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// The plugin's `commands/` subdirectory, if this is a
    /// directory-sourced plugin.
    #[must_use]
    pub fn subdir(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// Load and validate a manifest from `<plugin_dir>/plugin.yaml`. When
/// `expected_name` is given (directory-sourced discovery), the manifest
/// name must match it exactly.
pub fn load_manifest(plugin_dir: &Path, expected_name: Option<&str>) -> PluginResult<PluginManifest> {
    let manifest_path = plugin_dir.join("plugin.yaml");
    let text = std::fs::read_to_string(&manifest_path).map_err(|source| PluginError::Io {
        path: manifest_path.clone(),
        source,
    })?;
    let manifest: PluginManifest =
        serde_yaml::from_str(&text).map_err(|e| PluginError::InvalidManifest {
            path: manifest_path.clone(),
            reason: e.to_string(),
        })?;
    manifest.validate().map_err(|_| PluginError::InvalidManifest {
        path: manifest_path.clone(),
        reason: format!("invalid plugin name '{}'", manifest.name),
    })?;
    if let Some(expected) = expected_name {
        if manifest.name != expected {
            return Err(PluginError::InvalidManifest {
                path: manifest_path,
                reason: format!(
                    "manifest name '{}' does not match directory name '{expected}'",
                    manifest.name
                ),
            });
        }
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_valid_manifest_matching_directory_name() {
        let tmp = tempfile::tempdir().unwrap();
        let plugin_dir = tmp.path().join("commit-helper");
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(
            plugin_dir.join("plugin.yaml"),
            "name: commit-helper\nversion: \"1.0\"\nhooks: true\n",
        )
        .unwrap();

        let manifest = load_manifest(&plugin_dir, Some("commit-helper")).unwrap();
        assert_eq!(manifest.name, "commit-helper");
        assert!(manifest.hooks);
    }

    #[test]
    fn rejects_name_mismatch_with_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let plugin_dir = tmp.path().join("commit-helper");
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(
            plugin_dir.join("plugin.yaml"),
            "name: other-name\nversion: \"1.0\"\n",
        )
        .unwrap();

        let err = load_manifest(&plugin_dir, Some("commit-helper")).unwrap_err();
        assert!(matches!(err, PluginError::InvalidManifest { .. }));
    }

    #[test]
    fn rejects_invalid_name_pattern() {
        let tmp = tempfile::tempdir().unwrap();
        let plugin_dir = tmp.path().join("Bad_Name");
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(
            plugin_dir.join("plugin.yaml"),
            "name: Bad_Name\nversion: \"1.0\"\n",
        )
        .unwrap();

        let err = load_manifest(&plugin_dir, None).unwrap_err();
        assert!(matches!(err, PluginError::InvalidManifest { .. }));
    }
}
