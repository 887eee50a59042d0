//! Session persistence errors.

/// Errors raised while validating, loading, or saving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session id failed the format check in spec.md §3 (also guards
    /// against path traversal).
    #[error("invalid session id: '{0}'")]
    InvalidId(String),

    /// No session file exists for the given id.
    #[error("session not found: {0}")]
    NotFound(String),

    /// A rename target already has a session file.
    #[error("session already exists: {0}")]
    AlreadyExists(String),

    /// I/O failure reading or writing a session file.
    #[error("I/O error for session {id}: {source}")]
    Io {
        /// The session id involved.
        id: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A session file's JSON failed to serialize or deserialize.
    #[error("serialization error for session {id}: {source}")]
    Serialize {
        /// The session id involved.
        id: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
