use async_trait::async_trait;
use loopwright_domain::{ToolError, ToolExecutionContext, ToolKind, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tool::Tool;

#[derive(Deserialize)]
struct Params {
    result: String,
}

/// Signals that the model considers the task done. Sets `shouldExitLoop` so
/// the loop ends the run after this turn instead of asking for another one.
pub struct AttemptCompletion;

#[async_trait]
impl Tool for AttemptCompletion {
    fn name(&self) -> &'static str {
        "attempt_completion"
    }

    fn description(&self) -> &'static str {
        "Declares the task complete with a final result summary, ending the run."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "result": { "type": "string" } },
            "required": ["result"],
        })
    }

    fn kind(&self) -> ToolKind {
        ToolKind::ReadOnly
    }

    async fn call(&self, params: Value, _ctx: &ToolExecutionContext) -> ToolResult {
        let params: Params = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::failure(ToolError::new("invalid_params", e.to_string())),
        };
        let mut result = ToolResult::success(Value::String(params.result));
        let mut metadata = serde_json::Map::new();
        metadata.insert("shouldExitLoop".into(), Value::Bool(true));
        result.metadata = Some(metadata);
        result
    }
}
