use async_trait::async_trait;
use loopwright_domain::{ToolError, ToolExecutionContext, ToolKind, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tool::{resolve_workspace_path, Tool};

#[derive(Deserialize)]
struct Params {
    path: String,
}

/// Reads a UTF-8 file from inside the workspace root.
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Reads the contents of a file at the given path, relative to the workspace root."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"],
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::ReadOnly
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
        match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => ToolResult::success(Value::String(content)),
            Err(e) => ToolResult::failure(ToolError::execution(format!("failed to read {}: {e}", resolved.display()))),
        }
    }
}
