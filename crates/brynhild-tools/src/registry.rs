//! `BuiltinTool` trait and the `ToolRegistry` that exposes them.

use std::collections::HashMap;

use brynhild_llm::ToolDefinition;
use serde_json::Value;

use crate::context::ToolContext;
use crate::error::ToolResult;

/// A tool a session can execute directly in-process, without going through
/// the provider's wire format.
#[async_trait::async_trait]
pub trait BuiltinTool: Send + Sync {
    /// Tool name, as the model sees it.
    fn name(&self) -> &'static str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &'static str;

    /// JSON Schema for the tool's input.
    fn input_schema(&self) -> Value;

    /// Whether executing this tool requires an interactive permission
    /// check (spec.md §4.16 step 4.4). Read-only tools (inspect, skill
    /// loading) return `false`.
    fn requires_permission(&self) -> bool {
        false
    }

    /// Run the tool.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult;
}

/// Registers built-in tools and produces provider-format schema lists.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn BuiltinTool>>,
}

impl ToolRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any existing registration of the same
    /// name.
    pub fn register(&mut self, tool: Box<dyn BuiltinTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn BuiltinTool> {
        self.tools.get(name).map(AsRef::as_ref)
    }

    /// Whether a name refers to a registered tool.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All registered tools, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn BuiltinTool> {
        self.tools.values().map(AsRef::as_ref)
    }

    /// Native-format tool definitions, as `brynhild_llm::ToolDefinition`.
    #[must_use]
    pub fn native_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// OpenAI-style `function` wrapper form of the same definitions.
    #[must_use]
    pub fn openai_definitions(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.input_schema(),
                    }
                })
            })
            .collect()
    }
}
