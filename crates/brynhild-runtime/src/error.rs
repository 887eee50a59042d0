//! Runtime error types.

use thiserror::Error;

/// Errors raised by the conversation processor.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The provider's stream failed or could not be opened.
    #[error("LLM error: {0}")]
    Llm(#[from] brynhild_llm::LlmError),

    /// `MessageValidator` rejected the message list in strict mode.
    #[error("message validation failed: {0}")]
    Validation(#[from] crate::validator::Violation),

    /// The turn exceeded its configured round budget without a finish tool
    /// or a tool-call-free response.
    #[error("exceeded maximum rounds ({0}) for this turn")]
    MaxRoundsExceeded(u32),

    /// The `PRE_TOOL_USE` or `USER_PROMPT_SUBMIT` hook chain blocked the
    /// operation.
    #[error("blocked by hook: {0}")]
    HookBlocked(String),

    /// The user message named a skill that isn't registered.
    #[error("unknown skill: {0}")]
    UnknownSkill(String),
}

/// Result type for conversation-processor operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
