//! Hooks loader: parses a plugin's single `hooks.yaml` and registers its
//! definitions into a [`HookManager`].

use brynhild_core::HookEvent;
use brynhild_hooks::{HookManager, HooksManifest};

use crate::manifest::Plugin;

/// Parse `<plugin>/hooks.yaml`, if present, into its manifest form.
/// A missing file is `None`; a malformed one is logged and treated as
/// absent (discovery never fails for one bad plugin).
#[must_use]
pub fn load_from_plugin(plugin: &Plugin) -> Option<HooksManifest> {
    let path = plugin.path.join("hooks.yaml");
    let text = std::fs::read_to_string(&path).ok()?;
    match serde_yaml::from_str::<HooksManifest>(&text) {
        Ok(manifest) => Some(manifest),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "skipping invalid hooks.yaml");
            None
        }
    }
}

/// Register every hook definition from `<plugin>/hooks.yaml` into
/// `manager`. Event names not recognized are logged and skipped.
pub fn register_from_plugin(manager: &mut HookManager, plugin: &Plugin) {
    let Some(manifest) = load_from_plugin(plugin) else {
        return;
    };
    for (event_name, definitions) in manifest.hooks {
        let Some(event) = HookEvent::from_str_opt(&event_name) else {
            tracing::warn!(plugin = %plugin.name(), event = %event_name, "unknown hook event, skipping");
            continue;
        };
        for definition in definitions {
            manager.register(event, definition);
        }
    }
}
