use async_trait::async_trait;
use loopwright_domain::{ToolError, ToolExecutionContext, ToolKind, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tool::{resolve_workspace_path, Tool};

#[derive(Deserialize)]
struct Params {
    path: String,
    content: String,
}

/// Writes a UTF-8 file inside the workspace root, creating parent
/// directories as needed.
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Writes the given content to a file at the given path, relative to the workspace root."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "content": { "type": "string" },
            },
            "required": ["path", "content"],
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Write
    }

    async fn call(&self, params: Value, ctx: &ToolExecutionContext) -> ToolResult {
        let params: Params = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::failure(ToolError::new("invalid_params", e.to_string())),
        };
        let resolved = match resolve_workspace_path(&params.path, ctx) {
            Ok(p) => p,
            Err(e) => return ToolResult::failure(ToolError::new("invalid_path", e.to_string())),
        };
        if let Some(parent) = resolved.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolResult::failure(ToolError::execution(format!("failed to create {}: {e}", parent.display())));
            }
        }
        match tokio::fs::write(&resolved, &params.content).await {
            Ok(()) => ToolResult::success(Value::String(format!("wrote {} bytes to {}", params.content.len(), resolved.display()))),
            Err(e) => ToolResult::failure(ToolError::execution(format!("failed to write {}: {e}", resolved.display()))),
        }
    }
}
