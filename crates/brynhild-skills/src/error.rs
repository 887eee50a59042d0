//! Skill discovery and parsing errors.

/// Errors raised while loading or discovering skills.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// `SKILL.md` does not exist in the given directory.
    #[error("SKILL.md not found: {0:?}")]
    NotFound(std::path::PathBuf),

    /// `SKILL.md` has no YAML frontmatter block.
    #[error("SKILL.md must have YAML frontmatter (---): {0:?}")]
    MissingFrontmatter(std::path::PathBuf),

    /// Frontmatter YAML failed to parse.
    #[error("invalid YAML in frontmatter of {path:?}: {source}")]
    InvalidFrontmatter {
        /// The offending file.
        path: std::path::PathBuf,
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// Frontmatter parsed but failed validation (e.g. bad name pattern).
    #[error("invalid skill frontmatter in {path:?}: {reason}")]
    InvalidFields {
        /// The offending file.
        path: std::path::PathBuf,
        /// Why validation failed.
        reason: String,
    },

    /// I/O failure reading a skill file.
    #[error("I/O error reading {path:?}: {source}")]
    Io {
        /// The offending path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for skill operations.
pub type SkillResult<T> = Result<T, SkillError>;
