//! Layered configuration for the binaries and services that embed the loop
//! runtime. The core loop itself treats configuration as a non-goal — it
//! only ever sees a fully-resolved `LoopConfig` handed to it by a caller.
//! This crate is that caller-side concern: load `.env` secrets, layer a
//! TOML file over built-in defaults, let environment variables win, and
//! hand back a typed [`RuntimeConfig`].

mod error;
mod retry_config;
mod runtime_config;

pub use error::ConfigError;
pub use retry_config::RetryConfig;
pub use runtime_config::{RuntimeConfig, CONFIG_ENV_PREFIX};
