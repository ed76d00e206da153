use std::path::PathBuf;

use clap::Parser;

/// Runs a single agent-loop turn sequence against a user message and
/// streams events to stdout until the loop terminates.
#[derive(Parser, Debug)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// The user message to send. Read from stdin if omitted.
    #[arg(long, short = 'p')]
    pub prompt: Option<String>,

    /// Workspace root the filesystem and shell tools are sandboxed to.
    #[arg(long, short = 'w', default_value = ".")]
    pub workspace: PathBuf,

    /// Path to a TOML configuration file (see `loopwright_config`). Falls
    /// back to `~/.loopwright/config.toml`, then built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides the configured max-turns cap for this run.
    #[arg(long)]
    pub max_turns: Option<i64>,

    /// Enables YOLO mode: turns cap at the 100-turn safety ceiling instead
    /// of the configured limit, and the turn-limit hook path is never hit.
    #[arg(long, default_value_t = false)]
    pub yolo: bool,

    /// Directory the JSONL journal and compaction records are written to.
    #[arg(long)]
    pub journal_dir: Option<PathBuf>,
}
