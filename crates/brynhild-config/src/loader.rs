//! Assembles a [`crate::DeepChainMap`] from brynhild's on-disk and
//! environment configuration sources.
//!
//! Layer precedence, highest priority first:
//! 1. Environment overrides (`BRYNHILD_<SECTION>__<KEY>`).
//! 2. Project config (`<project_root>/.brynhild/config.yaml`).
//! 3. User config (`~/.config/brynhild/config.yaml`).
//! 4. Deployment config (`$BRYNHILD_DEPLOYMENT_CONFIG`).
//! 5. Site config (`$BRYNHILD_SITE_CONFIG`).
//! 6. Built-in defaults (packaged YAML).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::map::DeepChainMap;
use crate::value::Value;

/// Embedded built-in defaults, always present as the lowest-priority layer.
const DEFAULTS_YAML: &str = include_str!("defaults.yaml");

/// Maximum size accepted for any on-disk config layer (1 MiB), matching
/// the limit used elsewhere in brynhild for untrusted file reads.
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Which source a loaded layer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerKind {
    /// `BRYNHILD_<SECTION>__<KEY>` environment variables.
    EnvOverrides,
    /// `<project_root>/.brynhild/config.yaml`.
    Project,
    /// `~/.config/brynhild/config.yaml`.
    User,
    /// `$BRYNHILD_DEPLOYMENT_CONFIG`.
    Deployment,
    /// `$BRYNHILD_SITE_CONFIG`.
    Site,
    /// The packaged built-in defaults.
    Defaults,
}

/// Record of one layer that actually contributed to the assembled map.
#[derive(Debug, Clone)]
pub struct LoadedLayer {
    /// Which source this layer came from.
    pub kind: ConfigLayerKind,
    /// The file path, if this layer was file-backed.
    pub path: Option<PathBuf>,
}

/// Builds a [`DeepChainMap`] out of brynhild's standard configuration
/// sources.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    project_root: Option<PathBuf>,
    allow_home_directory: bool,
    track_provenance: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader that auto-discovers the project root from the current
    /// directory and rejects a project root that resolves to the home
    /// directory or filesystem root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            project_root: None,
            allow_home_directory: false,
            track_provenance: false,
        }
    }

    /// Use an explicit project root instead of discovering one from `cwd`.
    #[must_use]
    pub fn with_project_root(mut self, root: PathBuf) -> Self {
        self.project_root = Some(root);
        self
    }

    /// Allow the project root to resolve to the home directory or
    /// filesystem root without error.
    #[must_use]
    pub fn allow_home_directory(mut self, allow: bool) -> Self {
        self.allow_home_directory = allow;
        self
    }

    /// Enable provenance tracking on the assembled [`DeepChainMap`].
    #[must_use]
    pub fn track_provenance(mut self, track: bool) -> Self {
        self.track_provenance = track;
        self
    }

    /// Assemble the layered map, returning it alongside the list of layers
    /// that actually contributed (for diagnostics / `brynhild config
    /// sources`-style reporting).
    ///
    /// # Errors
    /// Returns [`ConfigError::ParseError`] if any layer's YAML is
    /// malformed, or [`ConfigError::RootTooBroad`] if the discovered
    /// project root is too broad and `allow_home_directory` is false.
    pub fn load(&self) -> ConfigResult<(DeepChainMap, Vec<LoadedLayer>)> {
        self.load_from_env(std::env::vars())
    }

    /// Like [`ConfigLoader::load`], but takes the environment explicitly
    /// rather than reading the process environment — used by tests so
    /// assertions don't depend on ambient process state.
    ///
    /// # Errors
    /// See [`ConfigLoader::load`].
    pub fn load_from_env(
        &self,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> ConfigResult<(DeepChainMap, Vec<LoadedLayer>)> {
        let env: BTreeMap<String, String> = env.into_iter().collect();
        let mut layers = Vec::new();
        let mut loaded = Vec::new();

        let overrides = env_overrides(&env);
        if !overrides.as_map().is_some_and(|m| m.is_empty()) {
            layers.push(overrides);
            loaded.push(LoadedLayer {
                kind: ConfigLayerKind::EnvOverrides,
                path: None,
            });
        }

        let project_root = match &self.project_root {
            Some(root) => Some(root.clone()),
            None => discover_project_root(&std::env::current_dir().map_err(|e| {
                ConfigError::Io {
                    path: ".".to_string(),
                    source: e,
                }
            })?),
        };
        if let Some(root) = &project_root {
            self.check_root_breadth(root, &env)?;
            let path = root.join(".brynhild").join("config.yaml");
            if let Some(value) = try_load_yaml_file(&path)? {
                layers.push(value);
                loaded.push(LoadedLayer {
                    kind: ConfigLayerKind::Project,
                    path: Some(path),
                });
            }
        }

        if let Some(home) = home_dir(&env) {
            let path = home.join(".config").join("brynhild").join("config.yaml");
            if let Some(value) = try_load_yaml_file(&path)? {
                layers.push(value);
                loaded.push(LoadedLayer {
                    kind: ConfigLayerKind::User,
                    path: Some(path),
                });
            }
        }

        if let Some(raw) = env.get("BRYNHILD_DEPLOYMENT_CONFIG") {
            let path = expand_path(raw, &env);
            if let Some(value) = try_load_yaml_file(&path)? {
                layers.push(value);
                loaded.push(LoadedLayer {
                    kind: ConfigLayerKind::Deployment,
                    path: Some(path),
                });
            }
        }

        if let Some(raw) = env.get("BRYNHILD_SITE_CONFIG") {
            let path = expand_path(raw, &env);
            if let Some(value) = try_load_yaml_file(&path)? {
                layers.push(value);
                loaded.push(LoadedLayer {
                    kind: ConfigLayerKind::Site,
                    path: Some(path),
                });
            }
        }

        let defaults: serde_yaml::Value =
            serde_yaml::from_str(DEFAULTS_YAML).map_err(|e| ConfigError::ParseError {
                layer: "<built-in defaults>".to_string(),
                source: e,
            })?;
        layers.push(Value::from(defaults));
        loaded.push(LoadedLayer {
            kind: ConfigLayerKind::Defaults,
            path: None,
        });

        let map = DeepChainMap::with_provenance(layers, self.track_provenance);
        Ok((map, loaded))
    }

    /// Fail with [`ConfigError::RootTooBroad`] if `root` is the home
    /// directory or the filesystem root and `allow_home_directory` is
    /// false.
    fn check_root_breadth(&self, root: &Path, env: &BTreeMap<String, String>) -> ConfigResult<()> {
        if self.allow_home_directory {
            return Ok(());
        }
        if root.parent().is_none() {
            return Err(ConfigError::RootTooBroad(root.display().to_string()));
        }
        if let Some(home) = home_dir(env) {
            if root == home {
                return Err(ConfigError::RootTooBroad(root.display().to_string()));
            }
        }
        Ok(())
    }
}

/// Walk up from `start` looking for `pyproject.toml`, `setup.py`, `.git`,
/// or `.brynhild/`. Returns `start` itself if nothing is found, matching
/// the "fall back to cwd" behavior of the original project-root scan.
fn discover_project_root(start: &Path) -> Option<PathBuf> {
    const MARKERS: &[&str] = &["pyproject.toml", "setup.py", ".git", ".brynhild"];
    let mut current = Some(start);
    while let Some(dir) = current {
        if MARKERS.iter().any(|m| dir.join(m).exists()) {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    Some(start.to_path_buf())
}

/// Try to load and parse a YAML config file.
///
/// Returns `Ok(None)` if the file does not exist or is empty (whitespace
/// only) — both are silently skipped per the loader's contract. A
/// genuine I/O error or a parse failure is surfaced, naming the layer.
fn try_load_yaml_file(path: &Path) -> ConfigResult<Option<Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config layer not found, skipping");
            return Ok(None);
        }
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source: e,
            });
        }
    };

    if content.trim().is_empty() {
        debug!(path = %path.display(), "config layer is empty, skipping");
        return Ok(None);
    }

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        warn!(path = %path.display(), size = content.len(), "config layer exceeds size limit, skipping");
        return Ok(None);
    }

    let parsed: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            layer: path.display().to_string(),
            source: e,
        })?;
    Ok(Some(Value::from(parsed)))
}

/// Build the environment-override layer from `BRYNHILD_<SECTION>__<KEY>`
/// variables. `__` nests; the leaf value is parsed as bool/int/float where
/// possible, falling back to a string. Single-underscore `BRYNHILD_*`
/// variables with special meaning (`BRYNHILD_DEPLOYMENT_CONFIG`, etc.)
/// naturally don't match this pattern and are handled separately.
fn env_overrides(env: &BTreeMap<String, String>) -> Value {
    let mut root = BTreeMap::new();
    for (key, raw) in env {
        let Some(rest) = key.strip_prefix("BRYNHILD_") else {
            continue;
        };
        if !rest.contains("__") {
            continue;
        }
        let parts: Vec<String> = rest.split("__").map(|p| p.to_lowercase()).collect();
        insert_nested(&mut root, &parts, parse_env_value(raw));
    }
    Value::Map(root)
}

fn insert_nested(map: &mut BTreeMap<String, Value>, path: &[String], value: Value) {
    match path {
        [] => {}
        [leaf] => {
            map.insert(leaf.clone(), value);
        }
        [head, tail @ ..] => {
            let entry = map
                .entry(head.clone())
                .or_insert_with(Value::empty_map);
            if entry.as_map_mut().is_none() {
                *entry = Value::empty_map();
            }
            if let Some(child) = entry.as_map_mut() {
                insert_nested(child, tail, value);
            }
        }
    }
}

fn parse_env_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Bool(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    Value::String(raw.to_string())
}

/// Expand `~` and `${VAR}` references in a path-shaped env var value.
fn expand_path(raw: &str, env: &BTreeMap<String, String>) -> PathBuf {
    let mut expanded = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let name: String = chars.by_ref().take_while(|c| *c != '}').collect();
            if let Some(value) = env.get(&name) {
                expanded.push_str(value);
            }
        } else {
            expanded.push(c);
        }
    }
    if let Some(rest) = expanded.strip_prefix('~') {
        if let Some(home) = home_dir(env) {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(expanded)
}

fn home_dir(env: &BTreeMap<String, String>) -> Option<PathBuf> {
    if let Some(home) = env.get("HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    dirs::home_dir()
}
