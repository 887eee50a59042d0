//! Brynhild LLM - the narrow provider boundary.
//!
//! Defines `Message`, `ToolUse`/`ToolDefinition`, `StreamEvent`, and the
//! `LlmProvider` trait the conversation processor programs against. No
//! specific wire protocol is implemented here — that is an external
//! collaborator's job (spec.md §1).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod provider;
pub mod types;

pub use error::LlmError;
pub use provider::{LlmProvider, StreamBox};
pub use types::{Message, StreamEvent, ToolDefinition, ToolUse, Usage};
