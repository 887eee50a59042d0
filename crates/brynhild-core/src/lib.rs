//! Brynhild Core - foundation types shared across the agentic runtime.
//!
//! This crate provides:
//! - `HookEvent`, the lifecycle event enum shared by the hooks, plugins, and
//!   runtime crates (kept dependency-free to avoid cycles between them).
//! - The environment variable policy used when spawning child processes for
//!   hook and tool execution.
//! - Name validation shared by plugins, skills, and sessions.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod env_policy;
pub mod hook_event;
pub mod name;
pub mod project_root;

pub use hook_event::HookEvent;
pub use project_root::{discover_project_root, is_root_too_broad};
