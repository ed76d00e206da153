use async_trait::async_trait;
use loopwright_domain::{ToolExecutionContext, ToolKind, ToolResult};
use serde_json::Value;

/// A single named capability the registry can dispatch to. Mirrors the
/// shape `ExecutionPipeline::execute` needs, one tool per implementor
/// rather than one big match statement.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> Value;
    fn kind(&self) -> ToolKind;

    async fn call(&self, params: Value, ctx: &ToolExecutionContext) -> ToolResult;
}

/// Rejects any path outside `workspace_root`, including absolute paths that
/// merely happen to not share the prefix and relative paths that escape it
/// via `..`. Every filesystem tool below must route through this before
/// touching disk.
pub fn resolve_workspace_path(raw: &str, ctx: &ToolExecutionContext) -> anyhow::Result<std::path::PathBuf> {
    let candidate = std::path::Path::new(raw);
    let joined = if candidate.is_absolute() { candidate.to_path_buf() } else { ctx.workspace_root.join(candidate) };

    let root = ctx.workspace_root.canonicalize().unwrap_or_else(|_| ctx.workspace_root.clone());
    let normalized = normalize(&joined);

    if !normalized.starts_with(&root) {
        anyhow::bail!("path '{raw}' escapes the workspace root");
    }
    Ok(normalized)
}

/// `Path::canonicalize` requires the path to exist, which isn't true for a
/// file a tool is about to create. Lexically resolves `.`/`..` instead.
fn normalize(path: &std::path::Path) -> std::path::PathBuf {
    use std::path::Component;

    let mut out = std::path::PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn ctx(root: PathBuf) -> ToolExecutionContext {
        ToolExecutionContext::new("s", root)
    }

    #[test]
    fn relative_path_resolves_under_root() {
        let resolved = resolve_workspace_path("a/b.txt", &ctx(PathBuf::from("/workspace"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/workspace/a/b.txt"));
    }

    #[test]
    fn parent_traversal_escaping_root_is_rejected() {
        let err = resolve_workspace_path("../../etc/passwd", &ctx(PathBuf::from("/workspace"))).unwrap_err();
        assert!(err.to_string().contains("escapes"));
    }

    #[test]
    fn absolute_path_outside_root_is_rejected() {
        let err = resolve_workspace_path("/etc/passwd", &ctx(PathBuf::from("/workspace"))).unwrap_err();
        assert!(err.to_string().contains("escapes"));
    }
}
