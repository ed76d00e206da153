//! Transport to the language model. The loop core depends only on
//! `loopwright_domain::ChatService`; this crate is one concrete
//! implementation of it, talking to any OpenAI-compatible
//! `/chat/completions` endpoint over SSE.

mod accumulator;
mod openai;
mod retry;
mod wire;

pub use openai::OpenAiChatService;
