//! Rules discovery errors.

/// Errors raised while discovering or reading rule files.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// I/O failure reading a rules file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// The offending path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for rules operations.
pub type RulesResult<T> = Result<T, RulesError>;
