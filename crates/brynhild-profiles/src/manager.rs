//! `ProfileManager`: three-tier (user > plugin > builtin) resolution of
//! [`ModelProfile`]s by exact model name, family prefix, or `default`.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ProfileError, ProfileResult};
use crate::types::ModelProfile;

/// Holds user, plugin, and builtin profile maps in decreasing priority
/// and resolves a profile for a given model name.
#[derive(Debug, Default, Clone)]
pub struct ProfileManager {
    user: HashMap<String, ModelProfile>,
    plugin: HashMap<String, ModelProfile>,
    builtin: HashMap<String, ModelProfile>,
    plugin_sources: HashMap<String, String>,
}

impl ProfileManager {
    /// An empty manager with no profiles registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builtin profile, keyed by its name.
    pub fn insert_builtin(&mut self, profile: ModelProfile) {
        self.builtin.insert(profile.name.clone(), profile);
    }

    /// Register a user profile (highest priority), keyed by its name.
    pub fn insert_user(&mut self, profile: ModelProfile) {
        self.user.insert(profile.name.clone(), profile);
    }

    /// Register a plugin-provided profile. Returns
    /// [`ProfileError::Collision`] if another enabled plugin already
    /// registered a profile with this name.
    pub fn insert_plugin(&mut self, profile: ModelProfile, plugin_name: &str) -> ProfileResult<()> {
        if let Some(existing) = self.plugin_sources.get(&profile.name) {
            return Err(ProfileError::Collision {
                name: profile.name.clone(),
                existing_plugin: existing.clone(),
                new_plugin: plugin_name.to_string(),
            });
        }
        self.plugin_sources
            .insert(profile.name.clone(), plugin_name.to_string());
        self.plugin.insert(profile.name.clone(), profile);
        Ok(())
    }

    /// Load every `*.yaml` file directly under `dir` as a user profile.
    /// Missing directories are treated as empty.
    pub fn load_user_profiles_dir(&mut self, dir: &Path) -> ProfileResult<()> {
        if !dir.is_dir() {
            return Ok(());
        }
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|source| ProfileError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("yaml"))
            .collect();
        entries.sort();

        for path in entries {
            let text = std::fs::read_to_string(&path).map_err(|source| ProfileError::Io {
                path: path.clone(),
                source,
            })?;
            let profile: ModelProfile =
                serde_yaml::from_str(&text).map_err(|source| ProfileError::Parse {
                    path: path.clone(),
                    source,
                })?;
            self.insert_user(profile);
        }
        Ok(())
    }

    /// Exact lookup by profile name: user, then plugin, then builtin.
    #[must_use]
    pub fn get_profile(&self, name: &str) -> Option<&ModelProfile> {
        self.user
            .get(name)
            .or_else(|| self.plugin.get(name))
            .or_else(|| self.builtin.get(name))
    }

    /// Resolve a profile for `model` (and optional `provider`). Tries,
    /// in order: exact `model` name, then the longest-prefix match of a
    /// profile's `family` against the normalized model name, then a
    /// profile named `default`. Returns `None` if nothing matches.
    #[must_use]
    pub fn resolve(&self, model: &str, provider: Option<&str>) -> Option<&ModelProfile> {
        if let Some(profile) = self.get_profile(model) {
            return Some(profile);
        }

        let normalized = normalize_model_name(model, provider);
        let mut best: Option<(&ModelProfile, usize)> = None;
        for profile in self.all_profiles() {
            let Some(family) = profile.family.as_deref() else {
                continue;
            };
            let normalized_family = normalize_model_name(family, provider);
            if normalized.starts_with(&normalized_family) {
                let len = normalized_family.len();
                if best.is_none_or(|(_, best_len)| len > best_len) {
                    best = Some((profile, len));
                }
            }
        }
        if let Some((profile, _)) = best {
            return Some(profile);
        }

        self.get_profile("default")
    }

    /// Every profile across all three tiers, user entries shadowing
    /// plugin and builtin entries of the same name.
    fn all_profiles(&self) -> impl Iterator<Item = &ModelProfile> {
        let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
        self.user
            .values()
            .chain(self.plugin.values())
            .chain(self.builtin.values())
            .filter(move |p| seen.insert(p.name.as_str()))
    }
}

/// Strip a leading `provider/` prefix (explicit or inferred) and unify
/// `:`/`-` separators so that `openai/gpt-oss-120b` and `gpt-oss:120b`
/// normalize to the same family-matchable string.
fn normalize_model_name(name: &str, provider: Option<&str>) -> String {
    let stripped = if let Some(provider) = provider {
        name.strip_prefix(&format!("{provider}/")).unwrap_or(name)
    } else if let Some((prefix, rest)) = name.split_once('/') {
        let _ = prefix;
        rest
    } else {
        name
    };
    stripped.replace(':', "-").to_ascii_lowercase()
}
