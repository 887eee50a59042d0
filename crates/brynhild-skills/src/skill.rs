//! Parsed skills and `SKILL.md` parsing.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{SkillError, SkillResult};
use crate::frontmatter::SkillFrontmatter;

/// Soft limit for a `SKILL.md` body, in lines. Exceeding it only warns.
pub const SKILL_BODY_SOFT_LIMIT: usize = 500;

fn frontmatter_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*\n?(.*)$").expect("valid regex"))
}

/// Where a skill was discovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillSource {
    /// Packaged with brynhild itself.
    Builtin,
    /// `~/.config/brynhild/skills/*`.
    Global,
    /// A plugin's `skills/` directory.
    Plugin(String),
    /// `<project_root>/.brynhild/skills/*`.
    Project,
}

impl SkillSource {
    /// The tag recorded against the skill (`plugin:<name>` for plugin
    /// sources, matching spec.md §4.6).
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            Self::Builtin => "builtin".to_string(),
            Self::Global => "global".to_string(),
            Self::Plugin(name) => format!("plugin:{name}"),
            Self::Project => "project".to_string(),
        }
    }
}

/// A parsed skill, ready for progressive disclosure.
#[derive(Debug, Clone)]
pub struct Skill {
    /// Parsed frontmatter.
    pub frontmatter: SkillFrontmatter,
    /// The markdown body after the frontmatter block.
    pub body: String,
    /// The skill's directory.
    pub path: PathBuf,
    /// Where this skill was discovered from.
    pub source: SkillSource,
}

impl Skill {
    /// Skill name, from frontmatter.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.frontmatter.name
    }

    /// Skill description, from frontmatter.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.frontmatter.description
    }

    /// Number of lines in the body.
    #[must_use]
    pub fn body_line_count(&self) -> usize {
        self.body.lines().count()
    }

    /// Whether the body exceeds [`SKILL_BODY_SOFT_LIMIT`].
    #[must_use]
    pub fn exceeds_soft_limit(&self) -> bool {
        self.body_line_count() > SKILL_BODY_SOFT_LIMIT
    }

    /// Reference files under `references/*`, plus (for backwards
    /// compatibility) any top-level `*.md` file other than `SKILL.md`.
    #[must_use]
    pub fn list_reference_files(&self) -> Vec<PathBuf> {
        let mut refs = Vec::new();
        let refs_dir = self.path.join("references");
        if let Ok(entries) = std::fs::read_dir(&refs_dir) {
            for entry in entries.flatten() {
                let p = entry.path();
                if p.is_file() && !is_dotfile(&p) {
                    refs.push(p);
                }
            }
        }
        if let Ok(entries) = std::fs::read_dir(&self.path) {
            for entry in entries.flatten() {
                let p = entry.path();
                if p.extension().is_some_and(|e| e == "md")
                    && p.file_name().is_some_and(|n| n != "SKILL.md")
                {
                    refs.push(p);
                }
            }
        }
        refs
    }

    /// Executable scripts under `scripts/*`.
    #[must_use]
    pub fn list_scripts(&self) -> Vec<PathBuf> {
        let mut scripts = Vec::new();
        let scripts_dir = self.path.join("scripts");
        if let Ok(entries) = std::fs::read_dir(&scripts_dir) {
            for entry in entries.flatten() {
                let p = entry.path();
                if p.is_file() && !is_dotfile(&p) {
                    scripts.push(p);
                }
            }
        }
        scripts
    }

    /// Level 1 metadata: name and description only.
    #[must_use]
    pub fn metadata_for_prompt(&self) -> String {
        format!("**{}**: {}", self.name(), self.description())
    }

    /// Level 2 content: the full body, wrapped for message injection.
    #[must_use]
    pub fn triggered_body(&self) -> String {
        format!("<skill name=\"{}\">\n{}\n</skill>", self.name(), self.body)
    }
}

fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Parse a `SKILL.md` file's raw content into frontmatter and body.
///
/// # Errors
/// Returns [`SkillError::MissingFrontmatter`] or
/// [`SkillError::InvalidFrontmatter`]/[`SkillError::InvalidFields`].
pub fn parse_skill_markdown(content: &str, source_path: &Path) -> SkillResult<(SkillFrontmatter, String)> {
    let caps = frontmatter_pattern()
        .captures(content)
        .ok_or_else(|| SkillError::MissingFrontmatter(source_path.to_path_buf()))?;
    let frontmatter_yaml = &caps[1];
    let body = caps[2].trim().to_string();

    let frontmatter: SkillFrontmatter =
        serde_yaml::from_str(frontmatter_yaml).map_err(|source| SkillError::InvalidFrontmatter {
            path: source_path.to_path_buf(),
            source,
        })?;
    frontmatter.validate().map_err(|reason| SkillError::InvalidFields {
        path: source_path.to_path_buf(),
        reason,
    })?;

    Ok((frontmatter, body))
}

/// Load a skill from a directory (must contain `SKILL.md`).
///
/// Logs a `tracing::warn!` (not an error) when the body exceeds
/// [`SKILL_BODY_SOFT_LIMIT`].
///
/// # Errors
/// See [`parse_skill_markdown`]. Also returns [`SkillError::NotFound`] if
/// no `SKILL.md` exists, and [`SkillError::Io`] on read failure.
pub fn load_skill(skill_dir: &Path, source: SkillSource) -> SkillResult<Skill> {
    let skill_file = skill_dir.join("SKILL.md");
    if !skill_file.is_file() {
        return Err(SkillError::NotFound(skill_file));
    }
    let content = std::fs::read_to_string(&skill_file).map_err(|source| SkillError::Io {
        path: skill_file.clone(),
        source,
    })?;
    let (frontmatter, body) = parse_skill_markdown(&content, &skill_file)?;

    let line_count = body.lines().count();
    if line_count > SKILL_BODY_SOFT_LIMIT {
        tracing::warn!(
            skill = %frontmatter.name,
            lines = line_count,
            limit = SKILL_BODY_SOFT_LIMIT,
            "skill body exceeds recommended length"
        );
    }

    Ok(Skill {
        frontmatter,
        body,
        path: skill_dir.to_path_buf(),
        source,
    })
}
