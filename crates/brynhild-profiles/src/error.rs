//! Profile loading errors.

/// Errors raised while loading or resolving model profiles.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// A profile YAML file failed to parse.
    #[error("failed to parse profile {path:?}: {source}")]
    Parse {
        /// The offending file.
        path: std::path::PathBuf,
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// I/O failure reading a profile file.
    #[error("I/O error reading {path:?}: {source}")]
    Io {
        /// The offending path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Two enabled plugins provided a profile with the same name.
    #[error("profile '{name}' provided by plugin '{new_plugin}' conflicts with profile from plugin '{existing_plugin}'; plugin profiles must have unique names (use a user profile to override)")]
    Collision {
        /// The conflicting profile's name.
        name: String,
        /// The plugin whose profile was already registered.
        existing_plugin: String,
        /// The plugin attempting to register the same name.
        new_plugin: String,
    },
}

/// Result type for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;
