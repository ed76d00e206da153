use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use loopwright_domain::{ExecutionPipeline, ToolDefinition, ToolError, ToolExecutionContext, ToolKind, ToolResult};
use serde_json::Value;
use tracing::debug;

use crate::tool::Tool;
use crate::tools::{AttemptCompletion, ReadFile, Shell, WriteFile};

/// A registry-backed `ExecutionPipeline`: each call is dispatched to the
/// `Tool` registered under that name. Unknown tool names fail the call
/// rather than panicking, since they can originate from a model
/// hallucinating a tool that was never declared.
pub struct InMemoryPipeline {
    tools: HashMap<&'static str, Arc<dyn Tool>>,
}

impl InMemoryPipeline {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name(), tool);
        self
    }

    /// The four reference tools: `read_file`, `write_file`, `shell`, and
    /// `attempt_completion`.
    pub fn with_default_tools() -> Self {
        Self::new()
            .register(Arc::new(ReadFile))
            .register(Arc::new(WriteFile))
            .register(Arc::new(Shell))
            .register(Arc::new(AttemptCompletion))
    }

    /// LLM-shaped declarations for every registered tool, suitable for
    /// `LoopConfig::tools`.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.parameters())).collect()
    }
}

impl Default for InMemoryPipeline {
    fn default() -> Self {
        Self::with_default_tools()
    }
}

#[async_trait]
impl ExecutionPipeline for InMemoryPipeline {
    async fn execute(&self, name: &str, params: Value, ctx: &ToolExecutionContext) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::failure(ToolError::new("unknown_tool", format!("no tool registered under '{name}'")));
        };
        debug!(tool = name, session_id = %ctx.session_id, "executing tool");
        tool.call(params, ctx).await
    }

    fn tool_kind(&self, name: &str) -> Option<ToolKind> {
        self.tools.get(name).map(|tool| tool.kind())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn unknown_tool_name_fails_without_panicking() {
        let pipeline = InMemoryPipeline::with_default_tools();
        let ctx = ToolExecutionContext::new("s", PathBuf::from("/workspace"));
        let result = pipeline.execute("does_not_exist", json!({}), &ctx).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().r#type, "unknown_tool");
    }

    #[tokio::test]
    async fn write_then_read_round_trips_through_the_registry() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = InMemoryPipeline::with_default_tools();
        let ctx = ToolExecutionContext::new("s", dir.path().to_path_buf());

        let write = pipeline.execute("write_file", json!({"path": "a.txt", "content": "hi"}), &ctx).await;
        assert!(write.success);

        let read = pipeline.execute("read_file", json!({"path": "a.txt"}), &ctx).await;
        assert!(read.success);
        assert_eq!(read.llm_content, Value::String("hi".into()));
    }

    #[tokio::test]
    async fn attempt_completion_sets_should_exit_loop() {
        let pipeline = InMemoryPipeline::with_default_tools();
        let ctx = ToolExecutionContext::new("s", PathBuf::from("/workspace"));
        let result = pipeline.execute("attempt_completion", json!({"result": "done"}), &ctx).await;
        assert!(result.should_exit_loop());
    }

    #[test]
    fn tool_kind_reports_none_for_unregistered_tool() {
        let pipeline = InMemoryPipeline::with_default_tools();
        assert_eq!(pipeline.tool_kind("ghost"), None);
        assert_eq!(pipeline.tool_kind("shell"), Some(ToolKind::Execute));
    }
}
