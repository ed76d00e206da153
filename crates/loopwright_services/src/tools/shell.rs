use async_trait::async_trait;
use loopwright_domain::{ToolError, ToolExecutionContext, ToolKind, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::tool::Tool;

#[derive(Deserialize)]
struct Params {
    command: String,
}

/// Runs a shell command inside the workspace root via `sh -c`. Success is
/// determined by exit status, not by the presence of stderr output — many
/// well-behaved commands write warnings there.
pub struct Shell;

#[async_trait]
impl Tool for Shell {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn description(&self) -> &'static str {
        "Executes a shell command in the workspace root and returns its stdout/stderr."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "command": { "type": "string" } },
            "required": ["command"],
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Execute
    }

    async fn call(&self, params: Value, ctx: &ToolExecutionContext) -> ToolResult {
        let params: Params = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::failure(ToolError::new("invalid_params", e.to_string())),
        };

        let output = Command::new("sh").arg("-c").arg(&params.command).current_dir(&ctx.workspace_root).output().await;

        let output = match output {
            Ok(o) => o,
            Err(e) => return ToolResult::failure(ToolError::execution(format!("failed to spawn shell: {e}"))),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let mut formatted = String::new();
        if !stdout.trim().is_empty() {
            formatted.push_str(&format!("<stdout>{stdout}</stdout>"));
        }
        if !stderr.trim().is_empty() {
            if !formatted.is_empty() {
                formatted.push('\n');
            }
            formatted.push_str(&format!("<stderr>{stderr}</stderr>"));
        }
        if formatted.is_empty() {
            formatted.push_str("<status>command completed with no output</status>");
        }

        if output.status.success() {
            ToolResult::success(Value::String(formatted))
        } else {
            ToolResult::failure(ToolError::execution(formatted))
        }
    }
}
