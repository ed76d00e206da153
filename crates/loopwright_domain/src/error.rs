use thiserror::Error;

/// Internal errors surfaced by domain plumbing (argument parsing, config
/// validation). Not to be confused with [`crate::LoopErrorType`], which is
/// the taxonomy reported on the terminal `LoopResult`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid tool call arguments for '{name}': {source}")]
    ToolCallArguments { name: String, source: serde_json::Error },

    #[error("no chat service configured")]
    MissingChatService,

    /// Wraps a transport failure the caller's `RetryConfig` says is worth
    /// retrying (e.g. a 429/500-series HTTP status). Anything else bubbles
    /// up unwrapped and is not retried.
    #[error(transparent)]
    Retryable(#[from] anyhow::Error),
}
