#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Built-in tools, the tool registry, and thinking-text tool-call recovery
//! for the Brynhild agentic runtime.

mod bash;
mod context;
mod error;
mod file_ops;
mod inspect;
mod learn_skill;
mod recovery;
mod registry;

pub use bash::BashTool;
pub use context::ToolContext;
pub use error::{ToolError, ToolResult};
pub use file_ops::{EditFileTool, ReadFileTool, WriteFileTool};
pub use inspect::InspectTool;
pub use learn_skill::{LearnSkillTool, SkillLookup};
pub use recovery::{try_recover_tool_call_from_thinking, RecoveryResult, RecoveryType};
pub use registry::{BuiltinTool, ToolRegistry};
