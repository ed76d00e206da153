use derive_setters::Setters;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::message::Message;
use crate::tool_call::ToolCallRequest;
use crate::tool_definition::ToolDefinition;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

/// A finished chat completion, whether returned directly or reconstructed
/// from a fragment stream by [`crate::turn_runner::TurnRunner`].
#[derive(Clone, Debug, Default, Setters)]
#[setters(strip_option, into)]
pub struct ChatResponse {
    pub content: String,
    pub reasoning_content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Option<Usage>,
}

/// One incremental fragment of a streamed response.
#[derive(Clone, Debug)]
pub enum ChatFragment {
    Content { delta: String },
    Reasoning { delta: String },
}

/// A streaming call terminates with the accumulated [`ChatResponse`] as its
/// final item; everything before that is a [`ChatFragment`].
#[derive(Clone, Debug)]
pub enum ChatStreamEvent {
    Fragment(ChatFragment),
    Final(Box<ChatResponse>),
}

pub type ChatStream = BoxStream<'static, anyhow::Result<ChatStreamEvent>>;

/// Either a live fragment stream or an already-finished response, depending
/// on whether the underlying provider call supports streaming.
pub enum ChatCall {
    Streaming(ChatStream),
    Complete(ChatResponse),
}

#[derive(Clone, Debug)]
pub struct ChatServiceConfig {
    pub model: String,
    pub max_context_tokens: u64,
    pub max_output_tokens: Option<u64>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Transport to the LLM. Entirely out of the loop's concern beyond this
/// typed interface: HTTP, streaming parse, and provider routing are the Chat
/// Service's problem.
#[async_trait::async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        signal: Option<CancellationToken>,
    ) -> anyhow::Result<ChatCall>;

    fn get_config(&self) -> ChatServiceConfig;
}
