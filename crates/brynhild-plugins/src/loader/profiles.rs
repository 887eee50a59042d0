//! Profile loader: parses `<plugin>/profiles/*.yaml` and registers them
//! into a [`ProfileManager`], raising on name collisions between
//! plugins.

use std::collections::HashMap;

use brynhild_profiles::{ModelProfile, ProfileManager};

use crate::error::PluginResult;
use crate::manifest::Plugin;

/// Parse every `<plugin>/profiles/*.yaml` into [`ModelProfile`]s, keyed
/// by name. Malformed files are logged and skipped.
#[must_use]
pub fn load_from_plugin(plugin: &Plugin) -> HashMap<String, ModelProfile> {
    let mut out = HashMap::new();
    let dir = plugin.subdir("profiles");
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return out;
    };

    let mut paths: Vec<_> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        match serde_yaml::from_str::<ModelProfile>(&text) {
            Ok(profile) => {
                out.insert(profile.name.clone(), profile);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping invalid plugin profile");
            }
        }
    }
    out
}

/// Load and register every enabled plugin's profiles into `manager`.
/// Returns `Err` on the first cross-plugin name collision (spec.md
/// §4.6: fatal, unlike other per-component loader failures).
pub fn register_all(manager: &mut ProfileManager, plugins: &[&Plugin]) -> PluginResult<()> {
    for plugin in plugins {
        for profile in load_from_plugin(plugin).into_values() {
            manager.insert_plugin(profile, plugin.name())?;
        }
    }
    Ok(())
}
