//! Brynhild Skills - progressive-disclosure skill discovery and
//! triggering.
//!
//! Skills are directories containing `SKILL.md` (YAML frontmatter plus a
//! markdown body). [`SkillRegistry`] aggregates them from built-in,
//! global, plugin, and project sources and serves three disclosure
//! levels: metadata for the catalog, full body on explicit trigger, and
//! reference files or script paths on demand.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod frontmatter;
pub mod preprocessor;
pub mod registry;
pub mod skill;

pub use error::{SkillError, SkillResult};
pub use frontmatter::SkillFrontmatter;
pub use preprocessor::{preprocess, PreprocessOutcome};
pub use registry::{discover_default, SkillRegistry};
pub use skill::{load_skill, parse_skill_markdown, Skill, SkillSource, SKILL_BODY_SOFT_LIMIT};
