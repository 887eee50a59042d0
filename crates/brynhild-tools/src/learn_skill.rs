//! The model's explicit interface to the skill registry.
//!
//! `brynhild-tools` is built before `brynhild-skills` in the workspace, so
//! rather than depend on it directly, this narrow trait is the seam: the
//! runtime wires a `brynhild_skills::SkillRegistry` (which implements this)
//! into a `LearnSkillTool` at startup.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ToolContext;
use crate::error::{ToolError, ToolResult};
use crate::registry::BuiltinTool;

/// What `LearnSkillTool` needs from a skill registry. Implemented by
/// `brynhild_skills::SkillRegistry`.
#[async_trait]
pub trait SkillLookup: Send + Sync {
    /// Metadata for every discovered skill: `(name, description)` pairs.
    fn list_skills(&self) -> Vec<(String, String)>;

    /// The full markdown body of a skill, if it exists.
    fn get_skill_body(&self, name: &str) -> Option<String>;

    /// Names of `references/*.md` and `scripts/*` entries available for a skill.
    fn list_resources(&self, name: &str) -> Option<Vec<String>>;

    /// The contents of one reference file belonging to a skill.
    fn get_reference_file(&self, name: &str, resource: &str) -> Option<String>;

    /// The filesystem path of one script belonging to a skill, if it exists.
    fn get_script_path(&self, name: &str, script: &str) -> Option<String>;
}

/// Progressive-disclosure tool the model uses to list, load, and fetch
/// skill resources on demand. Never requires permission: it only reads
/// from the skill registry.
pub struct LearnSkillTool<L: SkillLookup> {
    lookup: L,
}

impl<L: SkillLookup> LearnSkillTool<L> {
    /// Wrap a skill lookup implementation as a tool.
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl<L: SkillLookup> BuiltinTool for LearnSkillTool<L> {
    fn name(&self) -> &'static str {
        "learn_skill"
    }

    fn description(&self) -> &'static str {
        "Lists available skills, loads a skill's full body, lists its bundled resources, \
         or fetches a reference file or script path by name."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["list", "load", "list_resources", "get_reference", "get_script"]
                },
                "name": {"type": "string", "description": "Skill name, required for all operations except list"},
                "resource": {"type": "string", "description": "Reference file name, for get_reference"},
                "script": {"type": "string", "description": "Script name, for get_script"}
            },
            "required": ["operation"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
        let operation = args
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("operation is required".into()))?;

        if operation == "list" {
            let skills = self.lookup.list_skills();
            if skills.is_empty() {
                return Ok("(no skills available)".to_string());
            }
            let mut out = String::new();
            for (name, description) in skills {
                out.push_str(&format!("- {name}: {description}\n"));
            }
            return Ok(out);
        }

        let name = args
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("name is required".into()))?;

        match operation {
            "load" => self
                .lookup
                .get_skill_body(name)
                .ok_or_else(|| ToolError::ExecutionFailed(format!("unknown skill {name:?}"))),
            "list_resources" => self
                .lookup
                .list_resources(name)
                .map(|r| {
                    if r.is_empty() {
                        "(no bundled resources)".to_string()
                    } else {
                        r.join("\n")
                    }
                })
                .ok_or_else(|| ToolError::ExecutionFailed(format!("unknown skill {name:?}"))),
            "get_reference" => {
                let resource = args
                    .get("resource")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ToolError::InvalidArguments("resource is required".into()))?;
                self.lookup.get_reference_file(name, resource).ok_or_else(|| {
                    ToolError::PathNotFound(format!("{name}/references/{resource}"))
                })
            }
            "get_script" => {
                let script = args
                    .get("script")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ToolError::InvalidArguments("script is required".into()))?;
                self.lookup
                    .get_script_path(name, script)
                    .ok_or_else(|| ToolError::PathNotFound(format!("{name}/scripts/{script}")))
            }
            other => Err(ToolError::InvalidArguments(format!("unknown operation {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeLookup;

    #[async_trait]
    impl SkillLookup for FakeLookup {
        fn list_skills(&self) -> Vec<(String, String)> {
            vec![("writing-prs".to_string(), "Draft a pull request description".to_string())]
        }
        fn get_skill_body(&self, name: &str) -> Option<String> {
            (name == "writing-prs").then(|| "# Writing PRs\n\nBe terse.".to_string())
        }
        fn list_resources(&self, name: &str) -> Option<Vec<String>> {
            (name == "writing-prs").then(|| vec!["references/style.md".to_string()])
        }
        fn get_reference_file(&self, name: &str, resource: &str) -> Option<String> {
            (name == "writing-prs" && resource == "style.md").then(|| "be terse".to_string())
        }
        fn get_script_path(&self, _name: &str, _script: &str) -> Option<String> {
            None
        }
    }

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    #[tokio::test]
    async fn lists_skills() {
        let tool = LearnSkillTool::new(FakeLookup);
        let r = tool
            .execute(serde_json::json!({"operation": "list"}), &ctx())
            .await
            .unwrap();
        assert!(r.contains("writing-prs"));
    }

    #[tokio::test]
    async fn loads_skill_body() {
        let tool = LearnSkillTool::new(FakeLookup);
        let r = tool
            .execute(
                serde_json::json!({"operation": "load", "name": "writing-prs"}),
                &ctx(),
            )
            .await
            .unwrap();
        assert!(r.contains("Be terse"));
    }

    #[tokio::test]
    async fn unknown_skill_fails() {
        let tool = LearnSkillTool::new(FakeLookup);
        let r = tool
            .execute(
                serde_json::json!({"operation": "load", "name": "nope"}),
                &ctx(),
            )
            .await;
        assert!(r.is_err());
    }

    #[tokio::test]
    async fn fetches_reference_file() {
        let tool = LearnSkillTool::new(FakeLookup);
        let r = tool
            .execute(
                serde_json::json!({"operation": "get_reference", "name": "writing-prs", "resource": "style.md"}),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(r, "be terse");
    }
}
