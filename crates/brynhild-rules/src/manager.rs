//! `RulesManager`: discovers and concatenates project and global rule
//! files.

use std::path::{Path, PathBuf};

use crate::error::{RulesError, RulesResult};

/// Filenames checked at every directory level while walking from the
/// start directory up to the project root, in the fixed order they are
/// looked for (all matches at a level are included, not just the first).
const RULE_FILENAMES: &[&str] = &["AGENTS.md", ".cursorrules", "rules.md", ".brynhild/rules.md"];

/// One discovered rule file and its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFile {
    /// Path the rule file was read from.
    pub path: PathBuf,
    /// Raw file contents.
    pub content: String,
}

/// Discovers `AGENTS.md`/`.cursorrules`/`rules.md`/`.brynhild/rules.md`
/// walking from a start directory up to a boundary (usually the project
/// root), plus any global rules under `~/.config/brynhild/rules/*.md`.
///
/// Concatenation order is global rules first, then project rules
/// parent-to-leaf (the project root's rules come before the start
/// directory's own rules). The XML-wrapped `<project_rules>` form
/// consumed by the system prompt is assembled by `brynhild-context`, not
/// here — this crate only discovers and concatenates raw file contents.
pub struct RulesManager {
    start_dir: PathBuf,
    boundary: Option<PathBuf>,
    global_rules_dir: Option<PathBuf>,
    cache: Option<Vec<RuleFile>>,
}

impl RulesManager {
    /// Construct a manager that walks from `start_dir` up to `boundary`
    /// (inclusive), plus the default global rules directory
    /// (`~/.config/brynhild/rules/`).
    #[must_use]
    pub fn new(start_dir: PathBuf, boundary: Option<PathBuf>) -> Self {
        Self {
            start_dir,
            boundary,
            global_rules_dir: dirs::config_dir().map(|d| d.join("brynhild").join("rules")),
            cache: None,
        }
    }

    /// Override the global rules directory (used by tests).
    #[must_use]
    pub fn with_global_rules_dir(mut self, dir: PathBuf) -> Self {
        self.global_rules_dir = Some(dir);
        self
    }

    /// Discover every rule file in concatenation order: global rules
    /// first (sorted by filename), then project rules from the boundary
    /// down to the start directory.
    ///
    /// # Errors
    /// Returns [`RulesError::Io`] if a discovered file exists but cannot
    /// be read.
    pub fn discover(&self) -> RulesResult<Vec<RuleFile>> {
        let mut files = Vec::new();

        if let Some(global_dir) = &self.global_rules_dir {
            if global_dir.is_dir() {
                let mut entries: Vec<PathBuf> = std::fs::read_dir(global_dir)
                    .map_err(|source| RulesError::Io {
                        path: global_dir.clone(),
                        source,
                    })?
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
                    .collect();
                entries.sort();
                for path in entries {
                    files.push(read_rule_file(&path)?);
                }
            }
        }

        let mut levels: Vec<PathBuf> = Vec::new();
        let mut current: Option<&Path> = Some(self.start_dir.as_path());
        while let Some(dir) = current {
            levels.push(dir.to_path_buf());
            if self.boundary.as_deref() == Some(dir) {
                break;
            }
            current = dir.parent();
        }
        // Outermost (nearest boundary) first, start directory last.
        levels.reverse();

        for dir in &levels {
            for filename in RULE_FILENAMES {
                let path = dir.join(filename);
                if path.is_file() {
                    files.push(read_rule_file(&path)?);
                }
            }
        }

        Ok(files)
    }

    /// Concatenate every discovered rule file's contents with `\n---\n`
    /// separators. Cached after the first call.
    ///
    /// # Errors
    /// See [`RulesManager::discover`].
    pub fn load_rules(&mut self, force_reload: bool) -> RulesResult<String> {
        if force_reload {
            self.cache = None;
        }
        if self.cache.is_none() {
            self.cache = Some(self.discover()?);
        }
        let files = self.cache.as_ref().expect("just populated");
        Ok(files
            .iter()
            .map(|f| f.content.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n"))
    }
}

fn read_rule_file(path: &Path) -> RulesResult<RuleFile> {
    let content = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(RuleFile {
        path: path.to_path_buf(),
        content,
    })
}
