//! `PluginRegistry`: persisted enable/disable overlay on top of
//! discovered plugins.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};
use crate::manifest::Plugin;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryState {
    #[serde(default)]
    disabled: Vec<String>,
}

/// Applies a persisted `disabled: [names]` overlay to a discovered
/// plugin set. State lives at `~/.config/brynhild/plugins.yaml` and is
/// written back on every change.
pub struct PluginRegistry {
    plugins: Vec<Plugin>,
    disabled: HashSet<String>,
    state_path: PathBuf,
}

impl PluginRegistry {
    /// Load the disabled-names overlay from `state_path` (missing file
    /// treated as empty) and apply it to `plugins`.
    pub fn load(plugins: Vec<Plugin>, state_path: PathBuf) -> PluginResult<Self> {
        let disabled = read_state(&state_path)?;
        let mut plugins = plugins;
        for plugin in &mut plugins {
            plugin.enabled = !disabled.contains(plugin.name());
        }
        Ok(Self {
            plugins,
            disabled,
            state_path,
        })
    }

    /// The default state path, `~/.config/brynhild/plugins.yaml`.
    #[must_use]
    pub fn default_state_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("brynhild").join("plugins.yaml"))
    }

    /// Every discovered plugin, with the enable overlay applied.
    #[must_use]
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Enabled plugins only.
    #[must_use]
    pub fn get_enabled_plugins(&self) -> Vec<&Plugin> {
        self.plugins.iter().filter(|p| p.enabled).collect()
    }

    /// Whether `name` is currently enabled. Unknown names are treated as
    /// disabled.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .is_some_and(|p| p.enabled)
    }

    /// Enable a plugin by name and persist the change.
    pub fn enable(&mut self, name: &str) -> PluginResult<()> {
        self.disabled.remove(name);
        if let Some(plugin) = self.plugins.iter_mut().find(|p| p.name() == name) {
            plugin.enabled = true;
        }
        self.persist()
    }

    /// Disable a plugin by name and persist the change.
    pub fn disable(&mut self, name: &str) -> PluginResult<()> {
        self.disabled.insert(name.to_string());
        if let Some(plugin) = self.plugins.iter_mut().find(|p| p.name() == name) {
            plugin.enabled = false;
        }
        self.persist()
    }

    fn persist(&self) -> PluginResult<()> {
        let mut disabled: Vec<String> = self.disabled.iter().cloned().collect();
        disabled.sort();
        let state = RegistryState { disabled };
        if let Some(parent) = self.state_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PluginError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = serde_yaml::to_string(&state).expect("RegistryState always serializes");
        std::fs::write(&self.state_path, text).map_err(|source| PluginError::Io {
            path: self.state_path.clone(),
            source,
        })
    }
}

fn read_state(path: &Path) -> PluginResult<HashSet<String>> {
    if !path.is_file() {
        return Ok(HashSet::new());
    }
    let text = std::fs::read_to_string(path).map_err(|source| PluginError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let state: RegistryState = serde_yaml::from_str(&text).unwrap_or_default();
    Ok(state.disabled.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{PluginManifest, PluginSource};

    fn plugin(name: &str) -> Plugin {
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
            path: PathBuf::from(name),
            enabled: true,
            source: PluginSource::Directory,
        }
    }

    #[test]
    fn disable_then_enable_round_trips_through_persisted_state() {
        let tmp = tempfile::tempdir().unwrap();
        let state_path = tmp.path().join("plugins.yaml");

        let mut registry =
            PluginRegistry::load(vec![plugin("foo"), plugin("bar")], state_path.clone()).unwrap();
        registry.disable("foo").unwrap();
        assert!(!registry.is_enabled("foo"));
        assert!(registry.is_enabled("bar"));

        let reloaded =
            PluginRegistry::load(vec![plugin("foo"), plugin("bar")], state_path).unwrap();
        assert!(!reloaded.is_enabled("foo"));
        assert_eq!(reloaded.get_enabled_plugins().len(), 1);
    }

    #[test]
    fn missing_state_file_means_everything_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        let state_path = tmp.path().join("does-not-exist.yaml");
        let registry = PluginRegistry::load(vec![plugin("foo")], state_path).unwrap();
        assert!(registry.is_enabled("foo"));
    }
}
