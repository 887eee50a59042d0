//! The narrow interface `ConversationProcessor` programs against.
//!
//! No wire protocol lives here — only the shape a provider adapter must
//! present. Concrete providers (Anthropic, OpenAI-compatible, Ollama, ...)
//! are external collaborators per spec.md §1.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::LlmError;
use crate::types::{Message, StreamEvent, ToolDefinition};

/// A boxed stream of provider events.
pub type StreamBox = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// A language model provider, consumed by `ConversationProcessor` through
/// this trait alone.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// The provider's registered name (e.g. `anthropic`, `openrouter`).
    fn name(&self) -> &str;

    /// The model identifier currently in use.
    fn model(&self) -> &str;

    /// The model's maximum context length in tokens, for compaction and
    /// budget checks upstream of this crate.
    fn max_context_tokens(&self) -> usize;

    /// Open a streaming completion.
    async fn stream(
        &self,
        messages: &[Message],
        system: &str,
        tools: &[ToolDefinition],
    ) -> Result<StreamBox, LlmError>;
}

#[async_trait]
impl LlmProvider for Box<dyn LlmProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn max_context_tokens(&self) -> usize {
        (**self).max_context_tokens()
    }

    async fn stream(
        &self,
        messages: &[Message],
        system: &str,
        tools: &[ToolDefinition],
    ) -> Result<StreamBox, LlmError> {
        (**self).stream(messages, system, tools).await
    }
}
