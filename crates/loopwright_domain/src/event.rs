use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::execution::ToolKind;
use crate::tool_call::ToolCallRequest;
use crate::tool_result::ToolResult;

/// The only output channel of [`crate::agent_loop::AgentLoop::run`]. Every
/// variant here is a fact the loop has already decided; consumers never
/// drive loop behaviour by reacting to an event mid-stream (the signal is
/// the only feedback channel back into the loop).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    AgentStart,
    AgentEnd,
    TurnStart { turn: u32, max_turns: u32 },
    TurnEnd { turn: u32, has_tool_calls: bool },
    ContentDelta { delta: String },
    ThinkingDelta { delta: String },
    StreamEnd,
    Content { text: String },
    Thinking { text: String },
    ToolStart { tool_call: ToolCallRequest, tool_kind: Option<ToolKind> },
    ToolResult { tool_call: ToolCallRequest, result: ToolResult },
    TokenUsage { input: u64, output: u64, total: u64, max_context: u64 },
    Compacting { is_compacting: bool },
    TodoUpdate { todos: Value },
    Error { message: String },
}
