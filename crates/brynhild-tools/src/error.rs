//! Tool execution errors.

/// Errors a built-in tool can raise. These never propagate past
/// `ConversationProcessor::dispatch` — they are always captured into a
/// failed `ToolResult` (spec.md §7).
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// I/O failure reading/writing a file or spawning a process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The call's input failed schema validation.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool ran but failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A referenced path does not exist.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// A path fell outside the sandbox root / allowed paths.
    #[error("path {0:?} is outside the sandboxed workspace")]
    PathNotAllowed(std::path::PathBuf),

    /// The tool exceeded its timeout and was killed.
    #[error("timed out after {0}ms")]
    Timeout(u64),
}

/// The result of a tool execution, always a structured success/failure —
/// never a raw exception reaching the caller.
pub type ToolResult = Result<String, ToolError>;
