//! OpenAI-compatible chat-completions wire format: request/response shapes
//! and their conversions to/from the domain's provider-agnostic types.

use loopwright_domain::{Message, Role, ToolCallRequest, ToolDefinition, Usage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize)]
pub struct WireRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
}

#[derive(Serialize)]
pub struct WireMessage {
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct WireToolCall {
    pub id: String,
    pub r#type: &'static str,
    pub function: WireFunctionCall,
}

#[derive(Serialize)]
pub struct WireFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Serialize)]
pub struct WireTool {
    pub r#type: &'static str,
    pub function: WireFunctionDef,
}

#[derive(Serialize)]
pub struct WireFunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let tool_calls = message.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    r#type: "function",
                    function: WireFunctionCall { name: call.name.clone(), arguments: call.raw_arguments_text.clone() },
                })
                .collect()
        });
        Self {
            role: role_str(message.role),
            content: Some(message.content.clone()),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
            name: message.tool_name.clone(),
        }
    }
}

impl From<&ToolDefinition> for WireTool {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            r#type: "function",
            function: WireFunctionDef { name: def.name.clone(), description: def.description.clone(), parameters: def.parameters.clone() },
        }
    }
}

/// A non-streaming completion response, or the shape of a single streamed
/// chunk (both share this envelope; `delta` vs `message` distinguishes
/// them).
#[derive(Deserialize, Debug)]
pub struct WireCompletion {
    #[serde(default)]
    pub choices: Vec<WireChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Deserialize, Debug)]
pub struct WireChoice {
    #[serde(default)]
    pub message: Option<WireResponseMessage>,
    #[serde(default)]
    pub delta: Option<WireResponseMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct WireResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireResponseToolCall>>,
}

#[derive(Deserialize, Debug)]
pub struct WireResponseToolCall {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: WireResponseFunctionCall,
}

#[derive(Deserialize, Debug, Default)]
pub struct WireResponseFunctionCall {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct WireUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl From<WireUsage> for Usage {
    fn from(usage: WireUsage) -> Self {
        Usage { prompt: usage.prompt_tokens, completion: usage.completion_tokens, total: usage.total_tokens }
    }
}

/// A reconstructed tool call once every argument-delta chunk has been
/// folded in.
#[derive(Debug, Default, Clone)]
pub struct PendingToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl From<PendingToolCall> for ToolCallRequest {
    fn from(pending: PendingToolCall) -> Self {
        ToolCallRequest::new(pending.id, pending.name, pending.arguments)
    }
}
