//! Shared context and sandbox policy available to every built-in tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::ToolError;

/// Shared, mutable state threaded through every tool invocation in a turn.
pub struct ToolContext {
    /// The sandbox root: file tools may only write under this path or an
    /// entry of `allowed_paths`.
    pub workspace_root: PathBuf,
    /// Additional paths writes may target, beyond the workspace root.
    pub allowed_paths: Vec<PathBuf>,
    /// Current working directory for the bash tool; persists across
    /// invocations within a session (spec.md §4.12).
    pub cwd: Arc<RwLock<PathBuf>>,
    /// Whether the session is in auto-approve mode (skips permission
    /// prompts for tools that declare `requires_permission`).
    pub auto_approve: bool,
}

impl ToolContext {
    /// Construct a context rooted at `workspace_root`, with `cwd` starting
    /// there too.
    #[must_use]
    pub fn new(workspace_root: PathBuf) -> Self {
        let cwd = Arc::new(RwLock::new(workspace_root.clone()));
        Self {
            workspace_root,
            allowed_paths: Vec::new(),
            cwd,
            auto_approve: false,
        }
    }

    /// Add an additional path file tools may write under.
    #[must_use]
    pub fn with_allowed_path(mut self, path: PathBuf) -> Self {
        self.allowed_paths.push(path);
        self
    }

    /// Validate that `path` lies under the workspace root or an allowed
    /// path. Canonicalizes both sides so `..`-traversal can't escape.
    pub fn validate_write_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        let normalized = normalize(&candidate);

        let roots = std::iter::once(&self.workspace_root).chain(self.allowed_paths.iter());
        for root in roots {
            let normalized_root = normalize(root);
            if normalized.starts_with(&normalized_root) {
                return Ok(normalized);
            }
        }

        Err(ToolError::PathNotAllowed(normalized))
    }
}

/// Lexically normalize a path (resolve `.`/`..`) without touching the
/// filesystem, so validation works for paths that don't exist yet (e.g. a
/// file about to be created by `write_file`).
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_paths_under_root() {
        let ctx = ToolContext::new(PathBuf::from("/workspace"));
        assert!(ctx.validate_write_path(Path::new("/workspace/src/main.rs")).is_ok());
        assert!(ctx.validate_write_path(Path::new("src/main.rs")).is_ok());
    }

    #[test]
    fn rejects_traversal_outside_root() {
        let ctx = ToolContext::new(PathBuf::from("/workspace"));
        assert!(ctx
            .validate_write_path(Path::new("/workspace/../etc/passwd"))
            .is_err());
        assert!(ctx.validate_write_path(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn allows_additional_allowed_paths() {
        let ctx = ToolContext::new(PathBuf::from("/workspace"))
            .with_allowed_path(PathBuf::from("/tmp/scratch"));
        assert!(ctx
            .validate_write_path(Path::new("/tmp/scratch/out.txt"))
            .is_ok());
    }
}
