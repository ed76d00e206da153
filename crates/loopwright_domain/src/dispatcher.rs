use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use uuid::Uuid;

use crate::execution::{ExecutionPipeline, ToolExecutionContext};
use crate::hooks::{BeforeToolExecInfo, Hooks};
use crate::tool_call::{apply_argument_repairs, ToolCallRequest};
use crate::tool_result::{ToolError, ToolResult};

pub struct DispatchedResult {
    pub tool_call: ToolCallRequest,
    pub result: ToolResult,
    pub tool_use_uuid: Option<Uuid>,
}

/// Fans a turn's `function`-typed tool calls out to the execution pipeline,
/// one concurrent task per call, and reports results back in call order —
/// the policy that lets the model reason about "first call, second call"
/// determinism even though tools run concurrently. Does not enforce
/// file-level locking itself; that's the pipeline's job.
pub struct ToolDispatcher;

impl ToolDispatcher {
    pub async fn run_all(
        tool_calls: Vec<ToolCallRequest>,
        ctx: &ToolExecutionContext,
        pipeline: &Arc<dyn ExecutionPipeline>,
        hooks: &Hooks,
    ) -> Vec<DispatchedResult> {
        let futures = tool_calls.into_iter().map(|tool_call| Self::run_one(tool_call, ctx, pipeline, hooks));
        join_all(futures).await
    }

    async fn run_one(
        tool_call: ToolCallRequest,
        ctx: &ToolExecutionContext,
        pipeline: &Arc<dyn ExecutionPipeline>,
        hooks: &Hooks,
    ) -> DispatchedResult {
        let params = match serde_json::from_str::<Value>(&tool_call.raw_arguments_text) {
            Ok(value) => value,
            Err(err) => {
                let result = ToolResult::failure(ToolError::new(
                    "execution_error",
                    format!("invalid arguments for '{}': {err}", tool_call.name),
                ));
                return DispatchedResult { tool_call, result, tool_use_uuid: None };
            }
        };

        let mut params = params;
        apply_argument_repairs(&tool_call.name, &mut params);

        let tool_use_uuid = match &hooks.on_before_tool_exec {
            Some(hook) => {
                hook.run(BeforeToolExecInfo { tool_call: tool_call.clone(), params: params.clone() }).await
            }
            None => None,
        };

        let result = pipeline.execute(&tool_call.name, params, ctx).await;
        DispatchedResult { tool_call, result, tool_use_uuid }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::execution::ToolKind;

    struct EchoPipeline {
        started: AtomicUsize,
    }

    #[async_trait]
    impl ExecutionPipeline for EchoPipeline {
        async fn execute(&self, name: &str, params: Value, _ctx: &ToolExecutionContext) -> ToolResult {
            self.started.fetch_add(1, Ordering::SeqCst);
            ToolResult::success(json!({ "name": name, "params": params }))
        }

        fn tool_kind(&self, _name: &str) -> Option<ToolKind> {
            Some(ToolKind::ReadOnly)
        }
    }

    #[tokio::test]
    async fn results_preserve_call_order() {
        let pipeline: Arc<dyn ExecutionPipeline> = Arc::new(EchoPipeline { started: AtomicUsize::new(0) });
        let ctx = ToolExecutionContext::new("session", PathBuf::from("/tmp"));
        let hooks = Hooks::default();
        let calls = vec![
            ToolCallRequest::new("call_1", "First", "{}"),
            ToolCallRequest::new("call_2", "Second", "{}"),
            ToolCallRequest::new("call_3", "Third", "{}"),
        ];

        let results = ToolDispatcher::run_all(calls, &ctx, &pipeline, &hooks).await;
        let ids: Vec<_> = results.iter().map(|r| r.tool_call.id.clone()).collect();
        assert_eq!(ids, vec!["call_1", "call_2", "call_3"]);
    }

    #[tokio::test]
    async fn invalid_json_arguments_produce_synthetic_failure() {
        let pipeline: Arc<dyn ExecutionPipeline> = Arc::new(EchoPipeline { started: AtomicUsize::new(0) });
        let ctx = ToolExecutionContext::new("session", PathBuf::from("/tmp"));
        let hooks = Hooks::default();
        let calls = vec![ToolCallRequest::new("call_1", "Bad", "not json")];

        let results = ToolDispatcher::run_all(calls, &ctx, &pipeline, &hooks).await;
        assert!(!results[0].result.success);
        assert_eq!(results[0].result.error.as_ref().unwrap().r#type, "execution_error");
    }

    #[tokio::test]
    async fn task_tool_gets_a_fabricated_subagent_session_id() {
        let pipeline: Arc<dyn ExecutionPipeline> = Arc::new(EchoPipeline { started: AtomicUsize::new(0) });
        let ctx = ToolExecutionContext::new("session", PathBuf::from("/tmp"));
        let hooks = Hooks::default();
        let calls = vec![ToolCallRequest::new("call_1", "Task", "{}")];

        let results = ToolDispatcher::run_all(calls, &ctx, &pipeline, &hooks).await;
        let params = &results[0].result.llm_content["params"];
        assert!(params["subagent_session_id"].is_string());
    }
}
