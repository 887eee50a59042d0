//! Read-only filesystem inspection: `cwd`, `ls`, `stat`, `exists`.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde_json::Value;

use crate::context::ToolContext;
use crate::error::{ToolError, ToolResult};
use crate::registry::BuiltinTool;

/// Exposes read-only filesystem queries. Never requires permission, since
/// it cannot mutate anything.
pub struct InspectTool;

#[async_trait::async_trait]
impl BuiltinTool for InspectTool {
    fn name(&self) -> &'static str {
        "inspect"
    }

    fn description(&self) -> &'static str {
        "Read-only filesystem queries: cwd, ls (with sort/filter/limit), stat, exists."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["cwd", "ls", "stat", "exists"]
                },
                "path": {"type": "string", "description": "Path argument for ls/stat/exists"},
                "sort": {"type": "string", "enum": ["name", "mtime", "size"], "description": "ls sort key"},
                "filter": {"type": "string", "description": "ls: only include entries whose name contains this substring"},
                "limit": {"type": "integer", "description": "ls: maximum entries to return"}
            },
            "required": ["operation"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let operation = args
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("operation is required".into()))?;

        match operation {
            "cwd" => Ok(ctx.cwd.read().await.display().to_string()),
            "ls" => ls(args, ctx).await,
            "stat" => stat(args, ctx).await,
            "exists" => exists(args, ctx).await,
            other => Err(ToolError::InvalidArguments(format!("unknown operation {other:?}"))),
        }
    }
}

fn resolve_path(args: &Value, ctx: &ToolContext, default_cwd: &PathBuf) -> PathBuf {
    match args.get("path").and_then(Value::as_str) {
        Some(p) if !p.is_empty() => {
            let candidate = PathBuf::from(p);
            if candidate.is_absolute() {
                candidate
            } else {
                ctx.workspace_root.join(candidate)
            }
        }
        _ => default_cwd.clone(),
    }
}

async fn ls(args: Value, ctx: &ToolContext) -> ToolResult {
    let cwd = ctx.cwd.read().await.clone();
    let dir = resolve_path(&args, ctx, &cwd);

    if !dir.exists() {
        return Err(ToolError::PathNotFound(dir.display().to_string()));
    }

    let filter = args.get("filter").and_then(Value::as_str);
    let sort = args.get("sort").and_then(Value::as_str).unwrap_or("name");
    let limit = args
        .get("limit")
        .and_then(Value::as_u64)
        .map(|v| usize::try_from(v).unwrap_or(usize::MAX));

    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(&dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(f) = filter {
            if !name.contains(f) {
                continue;
            }
        }
        let metadata = entry.metadata().await?;
        entries.push((name, metadata));
    }

    match sort {
        "mtime" => entries.sort_by_key(|(_, m)| std::cmp::Reverse(m.modified().ok())),
        "size" => entries.sort_by_key(|(_, m)| std::cmp::Reverse(m.len())),
        _ => entries.sort_by(|a, b| a.0.cmp(&b.0)),
    }

    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if entries.is_empty() {
        return Ok("(empty directory)".to_string());
    }

    let mut output = String::new();
    for (name, metadata) in &entries {
        let kind = if metadata.is_dir() { "d" } else { "f" };
        let _ = writeln!(output, "{kind} {:>10} {name}", metadata.len());
    }
    Ok(output)
}

async fn stat(args: Value, ctx: &ToolContext) -> ToolResult {
    let cwd = ctx.cwd.read().await.clone();
    let path = resolve_path(&args, ctx, &cwd);

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|_| ToolError::PathNotFound(path.display().to_string()))?;

    let kind = if metadata.is_dir() {
        "directory"
    } else if metadata.is_file() {
        "file"
    } else {
        "other"
    };

    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or_else(|| "unknown".to_string(), |d| d.as_secs().to_string());

    Ok(format!(
        "type={kind} size={} modified_unix={modified}",
        metadata.len()
    ))
}

async fn exists(args: Value, ctx: &ToolContext) -> ToolResult {
    let cwd = ctx.cwd.read().await.clone();
    let path = resolve_path(&args, ctx, &cwd);
    Ok(path.exists().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(root: PathBuf) -> ToolContext {
        ToolContext::new(root)
    }

    #[tokio::test]
    async fn cwd_reports_context_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ctx(dir.path().to_path_buf());
        let r = InspectTool
            .execute(serde_json::json!({"operation": "cwd"}), &ctx)
            .await
            .unwrap();
        assert_eq!(r, dir.path().display().to_string());
    }

    #[tokio::test]
    async fn ls_filters_and_sorts_by_name() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a.txt"), "xx").unwrap();
        std::fs::write(dir.path().join("a.log"), "skip").unwrap();
        let ctx = ctx(dir.path().to_path_buf());

        let r = InspectTool
            .execute(serde_json::json!({"operation": "ls", "filter": ".txt"}), &ctx)
            .await
            .unwrap();
        let a_pos = r.find("a.txt").unwrap();
        let b_pos = r.find("b.txt").unwrap();
        assert!(a_pos < b_pos);
        assert!(!r.contains("a.log"));
    }

    #[tokio::test]
    async fn ls_respects_limit() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["a", "b", "c"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let ctx = ctx(dir.path().to_path_buf());
        let r = InspectTool
            .execute(serde_json::json!({"operation": "ls", "limit": 1}), &ctx)
            .await
            .unwrap();
        assert_eq!(r.lines().count(), 1);
    }

    #[tokio::test]
    async fn stat_reports_file_type_and_size() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("f.txt"), "hello").unwrap();
        let ctx = ctx(dir.path().to_path_buf());
        let r = InspectTool
            .execute(
                serde_json::json!({"operation": "stat", "path": "f.txt"}),
                &ctx,
            )
            .await
            .unwrap();
        assert!(r.contains("type=file"));
        assert!(r.contains("size=5"));
    }

    #[tokio::test]
    async fn exists_true_and_false() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("f.txt"), "").unwrap();
        let ctx = ctx(dir.path().to_path_buf());

        let r = InspectTool
            .execute(serde_json::json!({"operation": "exists", "path": "f.txt"}), &ctx)
            .await
            .unwrap();
        assert_eq!(r, "true");

        let r = InspectTool
            .execute(serde_json::json!({"operation": "exists", "path": "missing"}), &ctx)
            .await
            .unwrap();
        assert_eq!(r, "false");
    }
}
