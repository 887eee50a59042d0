//! `SKILL.md` YAML frontmatter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frontmatter parsed from a `SKILL.md` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFrontmatter {
    /// Skill identifier; `^[a-z0-9]([a-z0-9-]*[a-z0-9])?$`, 1-64 chars,
    /// must match the enclosing directory name.
    pub name: String,
    /// What the skill does and when to use it.
    pub description: String,
    /// License for the skill, if any.
    #[serde(default)]
    pub license: Option<String>,
    /// Tools pre-approved for use with this skill.
    #[serde(default, rename = "allowed-tools")]
    pub allowed_tools: Vec<String>,
    /// Custom metadata for client-specific data.
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

impl SkillFrontmatter {
    /// Validate the fields spec.md §3 requires beyond what serde already
    /// enforces (required presence, types): name pattern/length and a
    /// non-empty description.
    pub fn validate(&self) -> Result<(), String> {
        if !brynhild_core::name::is_valid_component_name(&self.name) {
            return Err(format!(
                "name {:?} must match ^[a-z0-9]([a-z0-9-]*[a-z0-9])?$, 1-64 chars",
                self.name
            ));
        }
        if self.description.is_empty() || self.description.len() > 1024 {
            return Err("description must be 1-1024 characters".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_frontmatter() {
        let yaml = "name: commit-helper\ndescription: Helps write commits\n";
        let fm: SkillFrontmatter = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fm.name, "commit-helper");
        assert!(fm.validate().is_ok());
    }

    #[test]
    fn rejects_bad_name() {
        let yaml = "name: Bad_Name\ndescription: x\n";
        let fm: SkillFrontmatter = serde_yaml::from_str(yaml).unwrap();
        assert!(fm.validate().is_err());
    }

    #[test]
    fn parses_allowed_tools_alias() {
        let yaml = "name: x\ndescription: y\nallowed-tools:\n  - Bash\n  - ReadFile\n";
        let fm: SkillFrontmatter = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fm.allowed_tools, vec!["Bash", "ReadFile"]);
    }
}
