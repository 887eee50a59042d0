//! Brynhild Hooks - the event-driven pre/post interception layer.
//!
//! A [`HookManager`] holds ordered chains of [`HookDefinition`]s keyed by
//! [`brynhild_core::HookEvent`] and dispatches them against a
//! [`HookContext`], producing a [`DispatchOutcome`] the caller applies.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod context;
pub mod definition;
pub mod error;
pub mod manager;
pub mod result;

pub use context::{HookContext, ToolOutcome};
pub use definition::{HookDefinition, HookKind, HookTimeout, HooksManifest, OnTimeout};
pub use error::HookError;
pub use manager::{DispatchOutcome, HookManager};
pub use result::{HookAction, HookResult};
