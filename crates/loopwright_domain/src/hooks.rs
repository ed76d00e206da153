use std::sync::Arc;

use futures::stream::BoxStream;
use serde_json::Value;
use uuid::Uuid;

use crate::event::Event;
use crate::message::Message;
use crate::tool_call::ToolCallRequest;
use crate::tool_result::ToolResult;

#[derive(Clone, Debug)]
pub struct BeforeTurnContext {
    pub turn: u32,
    pub messages: Vec<Message>,
    pub last_prompt_tokens: Option<u64>,
}

/// Produces loop events (typically `compacting{true/false}`) as it runs;
/// its terminal value indicates whether compaction happened. The loop uses
/// that boolean only as a journal signal, never as control flow.
#[async_trait::async_trait]
pub trait BeforeTurnHook: Send + Sync {
    async fn run(&self, ctx: BeforeTurnContext) -> (BoxStream<'static, Event>, bool);
}

#[derive(Clone, Debug)]
pub struct AssistantMessageInfo {
    pub content: String,
    pub reasoning_content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    pub turn: u32,
}

#[async_trait::async_trait]
pub trait OnAssistantMessageHook: Send + Sync {
    async fn run(&self, info: AssistantMessageInfo);
}

#[derive(Clone, Debug)]
pub struct BeforeToolExecInfo {
    pub tool_call: ToolCallRequest,
    pub params: Value,
}

/// Returned UUID is stored and threaded to the matching
/// [`OnAfterToolExecHook`] call as `tool_use_uuid`.
#[async_trait::async_trait]
pub trait OnBeforeToolExecHook: Send + Sync {
    async fn run(&self, info: BeforeToolExecInfo) -> Option<Uuid>;
}

#[derive(Clone, Debug)]
pub struct AfterToolExecInfo {
    pub tool_call: ToolCallRequest,
    pub result: ToolResult,
    pub tool_use_uuid: Option<Uuid>,
}

/// Side effects only. This is also where an external `ModelManager` would
/// react to a `modelId`/`model` metadata override (see design note on
/// mid-loop model switching) — the loop itself never re-binds anything.
#[async_trait::async_trait]
pub trait OnAfterToolExecHook: Send + Sync {
    async fn run(&self, info: AfterToolExecInfo);
}

#[derive(Clone, Debug)]
pub struct CompleteInfo {
    pub content: String,
    pub turn: u32,
}

#[async_trait::async_trait]
pub trait OnCompleteHook: Send + Sync {
    async fn run(&self, info: CompleteInfo);
}

#[derive(Clone, Debug)]
pub struct StopCheckInfo {
    pub content: String,
    pub turn: u32,
}

#[derive(Clone, Debug, Default)]
pub struct StopCheckResponse {
    pub should_stop: bool,
    pub continue_reason: Option<String>,
    pub warning: Option<String>,
}

impl StopCheckResponse {
    pub fn stop() -> Self {
        Self { should_stop: true, ..Default::default() }
    }

    pub fn keep_going(continue_reason: Option<String>) -> Self {
        Self { should_stop: false, continue_reason, warning: None }
    }
}

/// Any thrown/raised failure from this hook is treated as `should_stop:true`
/// by the caller (the loop never lets a failing veto keep it spinning).
#[async_trait::async_trait]
pub trait StopCheckHook: Send + Sync {
    async fn run(&self, info: StopCheckInfo) -> anyhow::Result<StopCheckResponse>;
}

#[derive(Clone, Copy, Debug)]
pub struct TurnLimitReachedInfo {
    pub turns_count: u32,
}

#[derive(Clone, Debug, Default)]
pub struct TurnLimitReachedResponse {
    pub r#continue: bool,
    pub reason: Option<String>,
}

/// Its absence (not its presence with `continue:false`) is what makes the
/// turn-limit path non-interactive; see [`crate::turn_limit::TurnLimitController`].
#[async_trait::async_trait]
pub trait OnTurnLimitReachedHook: Send + Sync {
    async fn run(&self, info: TurnLimitReachedInfo) -> TurnLimitReachedResponse;
}

#[derive(Clone, Debug)]
pub struct TurnLimitCompactInfo {
    pub messages: Vec<Message>,
    pub context_messages: Vec<Message>,
}

#[derive(Clone, Debug, Default)]
pub struct TurnLimitCompactResponse {
    pub success: bool,
    pub compacted_messages: Option<Vec<Message>>,
    pub continue_message: Option<Message>,
}

#[async_trait::async_trait]
pub trait OnTurnLimitCompactHook: Send + Sync {
    async fn run(&self, info: TurnLimitCompactInfo) -> TurnLimitCompactResponse;
}

/// All hooks are optional. Using `Option<Arc<dyn Trait>>` per hook (instead
/// of one big trait with default no-op methods) lets policy that depends on
/// "is this hook configured at all" — [`crate::turn_limit::TurnLimitController`]
/// in particular — distinguish absence from a present-but-declining hook.
#[derive(Clone, Default)]
pub struct Hooks {
    pub before_turn: Option<Arc<dyn BeforeTurnHook>>,
    pub on_assistant_message: Option<Arc<dyn OnAssistantMessageHook>>,
    pub on_before_tool_exec: Option<Arc<dyn OnBeforeToolExecHook>>,
    pub on_after_tool_exec: Option<Arc<dyn OnAfterToolExecHook>>,
    pub on_complete: Option<Arc<dyn OnCompleteHook>>,
    pub stop_check: Option<Arc<dyn StopCheckHook>>,
    pub on_turn_limit_reached: Option<Arc<dyn OnTurnLimitReachedHook>>,
    pub on_turn_limit_compact: Option<Arc<dyn OnTurnLimitCompactHook>>,
}
