use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::BoxStream;
use loopwright_config::RetryConfig;
use loopwright_domain::{ChatCall, ChatService, ChatServiceConfig, ChatStream, ChatStreamEvent, Message, ToolDefinition};
use reqwest_eventsource::Event;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::accumulator::Accumulator;
use crate::retry::open_event_source;
use crate::wire::{WireMessage, WireRequest, WireTool};

/// A `ChatService` backed by any OpenAI-compatible `/chat/completions`
/// endpoint (OpenAI itself, a local vLLM/Ollama-compatible gateway, or a
/// proxy presenting the same wire format). Always requests streaming; a
/// backend that ignores `stream` and replies with a single JSON body
/// instead of SSE will simply produce a one-chunk stream.
pub struct OpenAiChatService {
    client: reqwest::Client,
    config: ChatServiceConfig,
    retry_config: RetryConfig,
}

impl OpenAiChatService {
    pub fn new(config: ChatServiceConfig) -> Self {
        Self { client: reqwest::Client::new(), config, retry_config: RetryConfig::default() }
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or("https://api.openai.com/v1");
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatService for OpenAiChatService {
    async fn chat(&self, messages: &[Message], tools: &[ToolDefinition], signal: Option<CancellationToken>) -> anyhow::Result<ChatCall> {
        let body = WireRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(WireMessage::from).collect(),
            tools: tools.iter().map(WireTool::from).collect(),
            stream: true,
            max_tokens: self.config.max_output_tokens,
        };
        let body_json = serde_json::to_value(&body)?;

        let endpoint = self.endpoint();
        let api_key = self.config.api_key.clone();
        let build = || {
            let mut request = self.client.post(&endpoint).json(&body_json);
            if let Some(api_key) = &api_key {
                request = request.bearer_auth(api_key);
            }
            request
        };

        debug!(model = %self.config.model, endpoint = %endpoint, "dispatching chat completion request");

        let (source, leftover) = open_event_source(build, &self.retry_config).await?;

        Ok(ChatCall::Streaming(build_stream(source, leftover, signal)))
    }

    fn get_config(&self) -> ChatServiceConfig {
        self.config.clone()
    }
}

struct StreamState {
    source: reqwest_eventsource::EventSource,
    accumulator: Option<Accumulator>,
    pending: VecDeque<ChatStreamEvent>,
    signal: Option<CancellationToken>,
    done: bool,
}

fn build_stream(source: reqwest_eventsource::EventSource, leftover: Option<Event>, signal: Option<CancellationToken>) -> ChatStream {
    let mut state = StreamState { source, accumulator: Some(Accumulator::default()), pending: VecDeque::new(), signal, done: false };
    if let Some(Event::Message(message)) = leftover {
        ingest_message(&mut state, &message.data);
    }
    Box::pin(futures::stream::unfold(Some(state), step)) as BoxStream<'static, anyhow::Result<ChatStreamEvent>>
}

/// Parses one SSE payload, folding it into the accumulator or — on the
/// `[DONE]` sentinel — finishing it and queuing the terminal `Final` event.
/// Shared between the leftover-event seed in `build_stream` and the
/// steady-state `step` loop so a message processed during the connect retry
/// is handled identically to one seen mid-stream.
fn ingest_message(state: &mut StreamState, data: &str) {
    if data == "[DONE]" {
        finish(state);
        return;
    }
    if let Ok(chunk) = serde_json::from_str(data) {
        let accumulator = state.accumulator.as_mut().expect("accumulator present until finished");
        state.pending.extend(accumulator.push_chunk(chunk).into_iter().map(ChatStreamEvent::Fragment));
    }
}

fn finish(state: &mut StreamState) {
    state.done = true;
    let response = state.accumulator.take().expect("accumulator present until finished").finish();
    state.pending.push_back(ChatStreamEvent::Final(Box::new(response)));
}

async fn step(state: Option<StreamState>) -> Option<(anyhow::Result<ChatStreamEvent>, Option<StreamState>)> {
    let mut state = state?;

    loop {
        if let Some(event) = state.pending.pop_front() {
            return Some((Ok(event), Some(state)));
        }
        if state.done {
            return None;
        }
        if state.signal.as_ref().is_some_and(|s| s.is_cancelled()) {
            return Some((Err(anyhow::anyhow!("chat call aborted")), None));
        }

        match state.source.next().await {
            Some(Ok(Event::Open)) => continue,
            Some(Ok(Event::Message(message))) => {
                ingest_message(&mut state, &message.data);
                continue;
            }
            Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                finish(&mut state);
                continue;
            }
            Some(Err(e)) => return Some((Err(anyhow::anyhow!(e)), None)),
        }
    }
}
