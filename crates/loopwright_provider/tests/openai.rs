use futures::StreamExt;
use loopwright_domain::{ChatCall, ChatServiceConfig, ChatStreamEvent, ChatService, Message};
use loopwright_provider::OpenAiChatService;

fn sse_body() -> String {
    let chunk_a = serde_json::json!({"choices":[{"delta":{"content":"Hel"}}]});
    let chunk_b = serde_json::json!({"choices":[{"delta":{"content":"lo"}}]});
    format!("data: {chunk_a}\n\ndata: {chunk_b}\n\ndata: [DONE]\n\n")
}

#[tokio::test]
async fn streams_content_deltas_and_terminates_with_final_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body())
        .create_async()
        .await;

    let config = ChatServiceConfig {
        model: "gpt-4o".into(),
        max_context_tokens: 128_000,
        max_output_tokens: None,
        api_key: None,
        base_url: Some(server.url()),
    };
    let service = OpenAiChatService::new(config);

    let call = service.chat(&[Message::user("hi")], &[], None).await.unwrap();
    let ChatCall::Streaming(mut stream) = call else { panic!("expected a streaming call") };

    let mut collected = String::new();
    let mut saw_final = false;
    while let Some(event) = stream.next().await {
        match event.unwrap() {
            ChatStreamEvent::Fragment(loopwright_domain::ChatFragment::Content { delta }) => collected.push_str(&delta),
            ChatStreamEvent::Fragment(loopwright_domain::ChatFragment::Reasoning { .. }) => {}
            ChatStreamEvent::Final(response) => {
                assert_eq!(response.content, "Hello");
                saw_final = true;
            }
        }
    }

    assert_eq!(collected, "Hello");
    assert!(saw_final);
    mock.assert_async().await;
}
