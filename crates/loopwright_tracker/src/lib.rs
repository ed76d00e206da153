//! Structured logging bootstrap shared by the CLI and long-running
//! services. Mirrors the inline tracing-subscriber setup used by the
//! runner binaries: an `EnvFilter` read from `RUST_LOG` (falling back to a
//! sensible default), writing to stderr so stdout stays free for the event
//! stream, with an optional rolling file appender for persistent logs.

mod log;

pub use log::{default_log_dir, init_tracing, Guard};
