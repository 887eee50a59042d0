//! Brynhild Context - assembles the final system prompt from project
//! rules, skill metadata, and a resolved model profile (spec.md §4.8).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod builder;
pub mod error;
pub mod types;

pub use builder::ContextBuilder;
pub use error::{ContextError, ContextResult};
pub use types::{ConversationContext, Injection, InjectionLocation};
