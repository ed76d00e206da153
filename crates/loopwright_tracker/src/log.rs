use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Keeps the non-blocking file writer's background thread alive. Drop this
/// only once the process is shutting down; dropping it early truncates
/// in-flight log lines.
pub struct Guard {
    _file_guard: Option<WorkerGuard>,
}

/// Initializes the global tracing subscriber: stderr always gets a
/// human-readable layer gated by `RUST_LOG` (default `info`), and if a log
/// directory is supplied a second layer writes JSON lines to a
/// daily-rotated file under it. Returns a [`Guard`] the caller must hold for
/// the life of the process.
///
/// Safe to call once per process; a second call returns an error from the
/// underlying `tracing` global-default registration, which this function
/// swallows since tests frequently run many loops in one process.
pub fn init_tracing(log_dir: Option<PathBuf>) -> anyhow::Result<Guard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, "loopwright.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false).json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(stderr_layer).with(file_layer);

    // Best-effort: a second call in the same process (e.g. repeated
    // `#[tokio::test]` setup) would otherwise panic on the global default.
    let _ = registry.try_init();

    Ok(Guard { _file_guard: file_guard })
}

/// Default log directory: `~/.loopwright/logs`, mirroring the dotfile
/// convention used for per-user config/state.
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".loopwright").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_without_log_dir_succeeds() {
        let guard = init_tracing(None);
        assert!(guard.is_ok());
    }

    #[test]
    fn init_tracing_with_log_dir_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");
        let guard = init_tracing(Some(log_dir.clone()));
        assert!(guard.is_ok());
        assert!(log_dir.is_dir());
    }
}
