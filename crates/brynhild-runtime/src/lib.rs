//! Brynhild Runtime - the streaming, tool-calling conversation loop that
//! orchestrates hooks, tool execution, recovery, and logging for one
//! session turn at a time (spec.md §4.16).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod callbacks;
pub mod error;
pub mod processor;
pub mod validator;

pub use callbacks::ConversationCallbacks;
pub use error::{RuntimeError, RuntimeResult};
pub use processor::{ConversationProcessor, TurnOutcome};
pub use validator::{MessageValidator, ToolCallPairReport, Violation};
