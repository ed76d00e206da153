use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use loopwright_config::RetryConfig;
use loopwright_domain::{ChatCall, ChatService, ChatServiceConfig, CompactionOutcome, CompactionRequest, CompactionService, Message, ToolDefinition};
use loopwright_provider::OpenAiChatService;

const SUMMARY_PROMPT: &str = "Summarize the conversation so far, preserving any decisions, file paths, and \
open tasks the assistant will need to continue. Respond with the summary only.";

/// Compacts by asking an LLM (any `ChatService`) to summarize the message
/// range handed to it. Token counts are a rough whitespace-split estimate —
/// good enough to drive the compaction-stats journal record, not a real
/// tokenizer.
pub struct LlmCompactionService {
    chat: Arc<dyn ChatService>,
}

impl LlmCompactionService {
    pub fn new(chat: Arc<dyn ChatService>) -> Self {
        Self { chat }
    }

    /// Builds a service that summarizes using the same model/credentials
    /// the loop itself talks to, via a second `OpenAiChatService` instance
    /// sharing the same connect-retry policy.
    pub fn from_config(config: ChatServiceConfig, retry_config: RetryConfig) -> Self {
        Self::new(Arc::new(OpenAiChatService::new(config).with_retry_config(retry_config)))
    }
}

fn estimate_tokens(messages: &[Message]) -> u64 {
    messages.iter().map(|m| m.content.split_whitespace().count() as u64).sum()
}

#[async_trait]
impl CompactionService for LlmCompactionService {
    async fn compact(&self, request: CompactionRequest) -> anyhow::Result<CompactionOutcome> {
        let pre_tokens = request.actual_pre_tokens.unwrap_or_else(|| estimate_tokens(&request.messages));

        let mut transcript = String::new();
        for message in &request.messages {
            transcript.push_str(&format!("{:?}: {}\n", message.role, message.content));
        }

        let prompt_messages =
            vec![Message::system(SUMMARY_PROMPT), Message::user(transcript)];

        let call = self.chat.chat(&prompt_messages, &[] as &[ToolDefinition], None).await?;
        let summary = match call {
            ChatCall::Complete(response) => response.content,
            ChatCall::Streaming(mut stream) => {
                let mut content = String::new();
                while let Some(event) = stream.next().await {
                    if let loopwright_domain::ChatStreamEvent::Final(response) = event? {
                        content = response.content;
                        break;
                    }
                }
                content
            }
        };

        let compacted_messages = vec![Message::user(format!("Summary of earlier conversation:\n{summary}"))];
        let post_tokens = estimate_tokens(&compacted_messages);

        Ok(CompactionOutcome {
            success: !summary.trim().is_empty(),
            compacted_messages,
            summary,
            pre_tokens,
            post_tokens,
            files_included: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use loopwright_domain::{ChatResponse, CompactionTrigger};
    use tokio_util::sync::CancellationToken;

    use super::*;

    struct StubChat;

    #[async_trait]
    impl ChatService for StubChat {
        async fn chat(&self, _messages: &[Message], _tools: &[ToolDefinition], _signal: Option<CancellationToken>) -> anyhow::Result<ChatCall> {
            Ok(ChatCall::Complete(ChatResponse { content: "the user wants X".into(), ..Default::default() }))
        }

        fn get_config(&self) -> ChatServiceConfig {
            ChatServiceConfig { model: "stub".into(), max_context_tokens: 1000, max_output_tokens: None, api_key: None, base_url: None }
        }
    }

    #[tokio::test]
    async fn compact_wraps_the_model_summary_in_a_user_message() {
        let service = LlmCompactionService::new(Arc::new(StubChat));
        let outcome = service
            .compact(CompactionRequest {
                messages: vec![Message::user("a"), Message::assistant("b", None, None)],
                trigger: CompactionTrigger::Auto,
                model_name: "stub".into(),
                max_context_tokens: 1000,
                api_key: None,
                base_url: None,
                actual_pre_tokens: Some(50),
            })
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.compacted_messages.len(), 1);
        assert!(outcome.compacted_messages[0].content.contains("the user wants X"));
        assert_eq!(outcome.pre_tokens, 50);
    }
}
