use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use loopwright_config::RetryConfig;
use loopwright_domain::Error as DomainError;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource, RequestBuilderExt};
use tracing::warn;

/// Opens an SSE connection, retrying the connect step (not the stream body)
/// against the caller's [`RetryConfig`]. `build` must construct a fresh
/// request on every call since a `RequestBuilder` is consumed by use.
///
/// Returns the open `EventSource` plus a leftover `Event::Message` if one
/// arrived bundled with the same poll that produced `Event::Open` — callers
/// must feed it through the same parsing path as subsequent messages rather
/// than discard it.
pub async fn open_event_source(
    build: impl Fn() -> reqwest::RequestBuilder,
    retry_config: &RetryConfig,
) -> anyhow::Result<(EventSource, Option<Event>)> {
    let strategy = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(retry_config.min_delay_ms))
        .with_factor(retry_config.backoff_factor as f32)
        .with_max_times(retry_config.max_retry_attempts)
        .with_jitter();

    let retry_status_codes = retry_config.retry_status_codes.clone();

    let attempt = || async {
        let mut source = build().eventsource()?;
        source.set_retry_policy(Box::new(reqwest_eventsource::retry::Never));
        match source.next().await {
            Some(Ok(Event::Open)) => Ok((source, None)),
            Some(Ok(event @ Event::Message(_))) => Ok((source, Some(event))),
            Some(Err(err)) => Err(classify(err, &retry_status_codes)),
            None => Ok((source, None)),
        }
    };

    attempt.retry(&strategy).when(is_retryable).notify(|err, delay| warn!(%err, ?delay, "retrying chat completion connect")).await
}

fn classify(err: EventSourceError, retry_status_codes: &[u16]) -> anyhow::Error {
    let retryable = match &err {
        EventSourceError::InvalidStatusCode(status, _) => retry_status_codes.contains(&status.as_u16()),
        EventSourceError::Transport(_) => true,
        _ => false,
    };
    if retryable {
        anyhow::Error::new(DomainError::Retryable(anyhow::anyhow!(err)))
    } else {
        anyhow::Error::new(err)
    }
}

fn is_retryable(error: &anyhow::Error) -> bool {
    error.downcast_ref::<DomainError>().is_some_and(|e| matches!(e, DomainError::Retryable(_)))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn retries_on_configured_status_code_and_eventually_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();

        // mockito matches the most-recently-created mock first, falling back to
        // earlier ones once a mock's `expect` count is exhausted — create the
        // fallback response before the one that should be tried first.
        let succeeding = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("data: [DONE]\n\n")
            .expect(1)
            .create_async()
            .await;
        let failing = server.mock("POST", "/chat").with_status(503).expect(1).create_async().await;

        let client = reqwest::Client::new();
        let url = format!("{}/chat", server.url());
        let retry_config = RetryConfig::default().max_retry_attempts(3usize).min_delay_ms(1u64);

        let build = || {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            client.post(&url)
        };

        let (_, leftover) = open_event_source(build, &retry_config).await.unwrap();
        assert!(leftover.is_none());
        assert!(attempts.load(Ordering::SeqCst) >= 2);
        failing.assert_async().await;
        succeeding.assert_async().await;
    }
}
