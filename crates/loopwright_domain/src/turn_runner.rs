use futures::StreamExt;
use loopwright_stream::EventSink;
use tokio_util::sync::CancellationToken;

use crate::chat::{ChatCall, ChatFragment, ChatResponse, ChatService, ChatStreamEvent};
use crate::event::Event;
use crate::message::Message;
use crate::result::LoopError;
use crate::tool_definition::ToolDefinition;

/// Translates one chat call into loop-level events and a finished
/// [`ChatResponse`]. The loop — not `TurnRunner` — decides when to emit
/// `stream_end`; this keeps that whitespace-trimming rule in one place.
pub struct TurnRunner;

impl TurnRunner {
    pub async fn run_turn(
        chat_service: &dyn ChatService,
        messages: &[Message],
        tools: &[ToolDefinition],
        signal: Option<CancellationToken>,
        events: &EventSink<Event>,
    ) -> anyhow::Result<ChatResponse> {
        match chat_service.chat(messages, tools, signal).await? {
            ChatCall::Complete(response) => Ok(response),
            ChatCall::Streaming(mut stream) => {
                let mut content = String::new();
                let mut reasoning = String::new();

                while let Some(event) = stream.next().await {
                    match event? {
                        ChatStreamEvent::Fragment(ChatFragment::Content { delta }) => {
                            content.push_str(&delta);
                            events.send(Event::ContentDelta { delta }).await;
                        }
                        ChatStreamEvent::Fragment(ChatFragment::Reasoning { delta }) => {
                            reasoning.push_str(&delta);
                            events.send(Event::ThinkingDelta { delta }).await;
                        }
                        ChatStreamEvent::Final(mut response) => {
                            if response.content.is_empty() {
                                response.content = content.clone();
                            }
                            if response.reasoning_content.is_none() && !reasoning.is_empty() {
                                response.reasoning_content = Some(reasoning.clone());
                            }
                            return Ok(*response);
                        }
                    }
                }

                // Stream closed without a `Final` event: reconstruct from the
                // accumulated buffers rather than treat it as an error.
                Ok(ChatResponse {
                    content,
                    reasoning_content: (!reasoning.is_empty()).then_some(reasoning),
                    tool_calls: Vec::new(),
                    usage: None,
                })
            }
        }
    }
}

/// Maps a propagated chat-service failure to the loop's terminal error
/// taxonomy: an exception identifying itself as an abort (by convention, a
/// message containing "aborted") becomes `aborted`; everything else is
/// `api_error`.
pub fn classify_chat_error(err: &anyhow::Error) -> LoopError {
    let message = err.to_string();
    if message.to_lowercase().contains("aborted") {
        LoopError::aborted()
    } else {
        LoopError::api_error(message)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::stream;

    use super::*;
    use crate::chat::{ChatServiceConfig, ChatStream};

    struct StreamingMock;

    #[async_trait]
    impl ChatService for StreamingMock {
        async fn chat(
            &self,
            _messages: &[Message],
            _tools: &[ToolDefinition],
            _signal: Option<CancellationToken>,
        ) -> anyhow::Result<ChatCall> {
            let events: Vec<anyhow::Result<ChatStreamEvent>> = vec![
                Ok(ChatStreamEvent::Fragment(ChatFragment::Content { delta: "Hel".into() })),
                Ok(ChatStreamEvent::Fragment(ChatFragment::Content { delta: "lo!".into() })),
                Ok(ChatStreamEvent::Final(Box::new(ChatResponse::default()))),
            ];
            let boxed: ChatStream = Box::pin(stream::iter(events));
            Ok(ChatCall::Streaming(boxed))
        }

        fn get_config(&self) -> ChatServiceConfig {
            ChatServiceConfig { model: "mock".into(), max_context_tokens: 128_000, max_output_tokens: None, api_key: None, base_url: None }
        }
    }

    #[tokio::test]
    async fn streaming_accumulates_content_into_final_response() {
        let (sink, mut stream) = loopwright_stream::channel::<Event>(16);
        let service = StreamingMock;
        let handle = tokio::spawn(async move {
            let response = TurnRunner::run_turn(&service, &[], &[], None, &sink).await.unwrap();
            drop(sink);
            response
        });

        let mut deltas = Vec::new();
        while let Some(event) = stream.next().await {
            if let Event::ContentDelta { delta } = event {
                deltas.push(delta);
            }
        }
        let response = handle.await.unwrap();
        assert_eq!(deltas, vec!["Hel", "lo!"]);
        assert_eq!(response.content, "Hello!");
    }

    #[test]
    fn classify_chat_error_detects_abort_by_message() {
        let err = anyhow::anyhow!("request aborted by signal");
        assert_eq!(classify_chat_error(&err).r#type, crate::result::LoopErrorType::Aborted);
    }

    #[test]
    fn classify_chat_error_defaults_to_api_error() {
        let err = anyhow::anyhow!("connection reset");
        assert_eq!(classify_chat_error(&err).r#type, crate::result::LoopErrorType::ApiError);
    }
}
