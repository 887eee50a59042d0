//! Conversation log error types.

use thiserror::Error;

/// Errors raised by [`crate::ConversationLogger`] and [`crate::LogReader`].
#[derive(Debug, Error)]
pub enum LogError {
    /// I/O error opening or writing the log file.
    #[error("I/O error on conversation log {path}: {source}")]
    Io {
        /// The path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An event could not be serialized to JSON.
    #[error("failed to serialize log event: {0}")]
    Serialize(#[source] serde_json::Error),

    /// No `context_init` event exists in the log.
    #[error("log contains no context_init event")]
    MissingContextInit,

    /// The requested turn has no matching user message.
    #[error("no user message found for turn {0}")]
    TurnNotFound(usize),
}

/// Result type for conversation log operations.
pub type LogResult<T> = Result<T, LogError>;
