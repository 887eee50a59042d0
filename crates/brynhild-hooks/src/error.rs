//! Error types for hook registration and dispatch.

/// Errors that can occur while loading or dispatching hooks.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// `hooks.yaml` failed to parse.
    #[error("failed to parse hooks.yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A matcher pattern was not a valid regex.
    #[error("invalid matcher pattern {pattern:?}: {source}")]
    InvalidMatcher {
        /// The offending pattern.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The hook script path did not exist or was not executable.
    #[error("hook script {0:?} is not executable")]
    ScriptNotExecutable(std::path::PathBuf),

    /// I/O failure spawning or communicating with a hook process.
    #[error("hook I/O error: {0}")]
    Io(#[from] std::io::Error),
}
