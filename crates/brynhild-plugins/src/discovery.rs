//! `PluginDiscovery`: merges plugins from global, `BRYNHILD_PLUGIN_PATH`,
//! project, and entry-point sources.
//!
//! Python entry points (`importlib.metadata`) have no Rust equivalent
//! without dynamically loading arbitrary code, which this runtime does
//! not do. The adaptation kept here is a static
//! [`EntryPointRegistry`]: a host binary that links in a plugin crate
//! calls [`EntryPointRegistry::register`] at startup, exactly the way
//! the original's entry-point callables returned a manifest at import
//! time. The opt-out environment variable is honored identically.

use std::path::{Path, PathBuf};

use crate::manifest::{load_manifest, Plugin, PluginManifest, PluginSource};

const DISABLE_ENTRY_POINTS_VAR: &str = "BRYNHILD_DISABLE_ENTRY_POINT_PLUGINS";
const PLUGIN_PATH_VAR: &str = "BRYNHILD_PLUGIN_PATH";

fn entry_points_disabled() -> bool {
    std::env::var(DISABLE_ENTRY_POINTS_VAR)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// A statically registered entry-point plugin, analogous to the
/// original's `brynhild.plugins` entry-point group.
#[derive(Debug, Clone)]
pub struct EntryPointPlugin {
    /// The manifest this entry point supplies.
    pub manifest: PluginManifest,
    /// Synthetic path, used only for logging and `BRYNHILD_PLUGIN_PATH`
    /// style identification.
    pub path: PathBuf,
}

/// An orphan provider entry point (the original's `brynhild.providers`
/// group) with no matching plugin directory.
#[derive(Debug, Clone)]
pub struct EntryPointProvider {
    /// The provider's declared name.
    pub name: String,
}

/// In-process registry of statically linked entry-point plugins and
/// orphan providers. Call [`register`](Self::register) /
/// [`register_provider`](Self::register_provider) during host startup
/// before running discovery.
#[derive(Debug, Default)]
pub struct EntryPointRegistry {
    plugins: Vec<EntryPointPlugin>,
    providers: Vec<EntryPointProvider>,
}

impl EntryPointRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a statically linked entry-point plugin.
    pub fn register(&mut self, plugin: EntryPointPlugin) {
        self.plugins.push(plugin);
    }

    /// Register an orphan provider entry point.
    pub fn register_provider(&mut self, provider: EntryPointProvider) {
        self.providers.push(provider);
    }
}

/// Discover plugins from every source, later sources overriding earlier
/// ones by name (spec.md §4.5).
#[derive(Debug, Default, Clone, Copy)]
pub struct PluginDiscovery;

impl PluginDiscovery {
    /// Discover from the global config directory, `BRYNHILD_PLUGIN_PATH`,
    /// the project's `.brynhild/plugins/`, and any statically registered
    /// entry points. A missing or unreadable directory is treated as
    /// empty; invalid manifests are logged and skipped. Discovery as a
    /// whole never fails.
    #[must_use]
    pub fn discover(
        global_dir: Option<&Path>,
        project_root: Option<&Path>,
        entry_points: &EntryPointRegistry,
    ) -> Vec<Plugin> {
        let mut by_name: std::collections::BTreeMap<String, Plugin> =
            std::collections::BTreeMap::new();

        if let Some(dir) = global_dir {
            for plugin in discover_directory(dir) {
                by_name.insert(plugin.name().to_string(), plugin);
            }
        }

        for dir in plugin_path_dirs() {
            for plugin in discover_directory(&dir) {
                by_name.insert(plugin.name().to_string(), plugin);
            }
        }

        if let Some(root) = project_root {
            let project_plugins_dir = root.join(".brynhild").join("plugins");
            for plugin in discover_directory(&project_plugins_dir) {
                by_name.insert(plugin.name().to_string(), plugin);
            }
        }

        if !entry_points_disabled() {
            for ep in &entry_points.plugins {
                if let Err(reason) = ep.manifest.validate() {
                    tracing::warn!(plugin = %ep.manifest.name, error = %reason, "skipping invalid entry-point manifest");
                    continue;
                }
                by_name.insert(
                    ep.manifest.name.clone(),
                    Plugin {
                        manifest: ep.manifest.clone(),
                        path: ep.path.clone(),
                        enabled: true,
                        source: PluginSource::EntryPoint,
                    },
                );
            }

            for provider in &entry_points.providers {
                if by_name
                    .values()
                    .any(|p| p.manifest.providers.as_deref().unwrap_or(&[]).iter().any(|n| n == &provider.name))
                {
                    continue;
                }
                let synthetic_name = format!("provider-{}", provider.name);
                by_name.insert(
                    synthetic_name.clone(),
                    Plugin {
                        manifest: PluginManifest {
                            name: synthetic_name,
                            version: "0.0.0".to_string(),
                            description: Some(format!("orphan provider: {}", provider.name)),
                            commands: Vec::new(),
                            tools: Vec::new(),
                            hooks: false,
                            skills: Vec::new(),
                            providers: Some(vec![provider.name.clone()]),
                        },
                        path: PathBuf::from(format!("<entry-point:{}>", provider.name)),
                        enabled: true,
                        source: PluginSource::EntryPointProvider,
                    },
                );
            }
        }

        by_name.into_values().collect()
    }
}

fn plugin_path_dirs() -> Vec<PathBuf> {
    std::env::var(PLUGIN_PATH_VAR)
        .ok()
        .map(|raw| raw.split(':').map(PathBuf::from).collect())
        .unwrap_or_default()
}

fn discover_directory(dir: &Path) -> Vec<Plugin> {
    let mut plugins = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return plugins;
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
    paths.sort();

    for plugin_dir in paths {
        if !plugin_dir.is_dir() {
            continue;
        }
        if !plugin_dir.join("plugin.yaml").is_file() {
            continue;
        }
        let expected_name = plugin_dir.file_name().and_then(|n| n.to_str());
        match load_manifest(&plugin_dir, expected_name) {
            Ok(manifest) => plugins.push(Plugin {
                manifest,
                path: plugin_dir,
                enabled: true,
                source: PluginSource::Directory,
            }),
            Err(err) => {
                tracing::warn!(path = %plugin_dir.display(), error = %err, "skipping invalid plugin manifest");
            }
        }
    }
    plugins
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_plugin(dir: &Path, name: &str) {
        let plugin_dir = dir.join(name);
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(
            plugin_dir.join("plugin.yaml"),
            format!("name: {name}\nversion: \"1.0\"\n"),
        )
        .unwrap();
    }

    #[test]
    fn discovers_from_global_and_project_with_project_override() {
        let global = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        write_plugin(global.path(), "shared-plugin");
        let project_plugins = project.path().join(".brynhild").join("plugins");
        std::fs::create_dir_all(&project_plugins).unwrap();
        write_plugin(&project_plugins, "shared-plugin");
        write_plugin(&project_plugins, "project-only");

        let plugins = PluginDiscovery::discover(
            Some(global.path()),
            Some(project.path()),
            &EntryPointRegistry::new(),
        );
        assert_eq!(plugins.len(), 2);
        let shared = plugins.iter().find(|p| p.name() == "shared-plugin").unwrap();
        assert_eq!(shared.source, PluginSource::Directory);
        assert!(plugins.iter().any(|p| p.name() == "project-only"));
    }

    #[test]
    fn invalid_manifest_is_skipped_not_fatal() {
        let global = tempfile::tempdir().unwrap();
        let bad_dir = global.path().join("broken");
        std::fs::create_dir_all(&bad_dir).unwrap();
        std::fs::write(bad_dir.join("plugin.yaml"), "not: [valid").unwrap();
        write_plugin(global.path(), "good-plugin");

        let plugins = PluginDiscovery::discover(Some(global.path()), None, &EntryPointRegistry::new());
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name(), "good-plugin");
    }

    #[test]
    fn entry_point_plugins_are_included_unless_disabled() {
        let mut registry = EntryPointRegistry::new();
        registry.register(EntryPointPlugin {
            manifest: PluginManifest {
                name: "linked-plugin".into(),
                version: "1.0".into(),
                description: None,
                commands: Vec::new(),
                tools: Vec::new(),
                hooks: false,
                skills: Vec::new(),
                providers: None,
            },
            path: PathBuf::from("<entry-point>"),
        });

        let plugins = PluginDiscovery::discover(None, None, &registry);
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].source, PluginSource::EntryPoint);
    }
}
