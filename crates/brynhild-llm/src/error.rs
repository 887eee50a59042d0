//! Errors surfaced across the provider boundary.

/// Errors a provider implementation may return. The conversation processor
/// treats every variant as a recoverable, per-turn failure: it writes an
/// error assistant message, fires the `Error` hook, and returns — it never
/// panics on a provider error.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The provider rejected the request (bad API key, quota, etc.).
    #[error("provider rejected request: {0}")]
    Rejected(String),

    /// The underlying transport failed (connection reset, DNS, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The stream ended with malformed or truncated data.
    #[error("malformed stream event: {0}")]
    MalformedStream(String),

    /// The model was not recognized by this provider.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Generation was cancelled by the caller.
    #[error("generation cancelled")]
    Cancelled,
}
