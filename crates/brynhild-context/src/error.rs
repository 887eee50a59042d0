//! Context assembly errors.

/// Errors raised while assembling a system prompt.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Rule file discovery or reading failed.
    #[error(transparent)]
    Rules(#[from] brynhild_rules::RulesError),
}

/// Result type for context assembly.
pub type ContextResult<T> = Result<T, ContextError>;
