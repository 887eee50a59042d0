//! Plugin subsystem errors.

/// Errors raised while discovering, registering, or loading plugins.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// I/O failure reading a plugin directory or manifest.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The offending path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A `plugin.yaml` failed to parse or validate.
    #[error("invalid manifest at {path:?}: {reason}")]
    InvalidManifest {
        /// The offending file.
        path: std::path::PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Two enabled plugins registered the same provider name.
    #[error("provider '{name}' registered by both '{existing_plugin}' and '{new_plugin}'")]
    ProviderCollision {
        /// The conflicting provider name.
        name: String,
        /// The plugin whose provider was already registered.
        existing_plugin: String,
        /// The plugin attempting to register the same name.
        new_plugin: String,
    },

    /// A profile name collision, surfaced from `brynhild-profiles`.
    #[error(transparent)]
    Profile(#[from] brynhild_profiles::ProfileError),
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
