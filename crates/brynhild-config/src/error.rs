//! Configuration error types.

use thiserror::Error;

/// Errors raised by [`crate::DeepChainMap`] and [`crate::ConfigLoader`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested key is not visible in any layer.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Attempted to mutate a frozen view.
    #[error("cannot mutate a frozen {kind}")]
    Frozen {
        /// `mapping` or `sequence`.
        kind: &'static str,
    },

    /// Attempted to hash an unhashable value (a frozen view or a
    /// `ReplaceMarker`).
    #[error("{0} is not hashable")]
    Unhashable(&'static str),

    /// Provenance was requested but tracking is disabled on this map.
    #[error("provenance tracking is not enabled on this map")]
    ProvenanceDisabled,

    /// A config layer file failed to parse.
    #[error("failed to parse config layer {layer}: {source}")]
    ParseError {
        /// Path or name of the offending layer.
        layer: String,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The resolved project root is too broad (home directory or
    /// filesystem root) and `allow_home_directory` is false.
    #[error("project root resolved to '{0}', which is too broad (set allow_home_directory to override)")]
    RootTooBroad(String),

    /// I/O error reading a config file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// The path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
