mod cli;

use std::io::Read as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use futures::StreamExt;
use loopwright_app::{journaled_compaction_coordinator, journaled_hooks, JsonlJournal};
use loopwright_config::RuntimeConfig;
use loopwright_domain::{AgentLoop, ChatServiceConfig, Event, LoopConfig, ToolExecutionContext};
use loopwright_provider::OpenAiChatService;
use loopwright_services::InMemoryPipeline;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _tracing_guard = loopwright_tracker::init_tracing(loopwright_tracker::default_log_dir())?;

    let runtime_config = RuntimeConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let prompt = match cli.prompt {
        Some(prompt) => prompt,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading prompt from stdin")?;
            buf
        }
    };

    let chat_config = ChatServiceConfig {
        model: runtime_config.model.clone(),
        max_context_tokens: runtime_config.max_context_tokens as u64,
        max_output_tokens: runtime_config.max_output_tokens.map(|v| v as u64),
        api_key: runtime_config.api_key.clone(),
        base_url: runtime_config.base_url.clone(),
    };

    let chat_service = Arc::new(OpenAiChatService::new(chat_config.clone()).with_retry_config(runtime_config.retry.clone()));
    let pipeline = Arc::new(InMemoryPipeline::with_default_tools());

    let workspace_root = std::fs::canonicalize(&cli.workspace).unwrap_or(cli.workspace.clone());
    let session_id = uuid::Uuid::new_v4().to_string();
    let signal = CancellationToken::new();

    let execution_context = ToolExecutionContext::new(session_id.clone(), workspace_root).with_signal(signal.clone());

    let journal_dir = cli.journal_dir.clone().unwrap_or_else(default_journal_dir);
    let journal: Arc<dyn loopwright_domain::Journal> = JsonlJournal::new(journal_dir);

    let hooks = journaled_hooks(journal.clone(), &session_id);
    let compaction = journaled_compaction_coordinator(chat_config, runtime_config.retry.clone(), Some(journal));

    let max_turns = cli.max_turns.unwrap_or(runtime_config.max_turns as i64);

    let mut config = LoopConfig::new(chat_service, pipeline.clone(), execution_context)
        .with_signal(signal.clone())
        .with_hooks(hooks)
        .with_compaction(compaction);
    config.tools = pipeline.tool_definitions();
    config.messages = vec![loopwright_domain::Message::user(prompt)];
    config.max_turns = max_turns;
    config.is_yolo_mode = cli.yolo;
    config.max_context_tokens = runtime_config.max_context_tokens as u64;

    let ctrl_c_signal = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_signal.cancel();
        }
    });

    let (mut events, handle) = AgentLoop::run(config).split();
    while let Some(event) = events.next().await {
        print_event(&event);
    }

    let result = handle.await.context("agent loop task panicked")?;
    if let Some(error) = &result.error {
        eprintln!("error: {}", error.message);
    }
    if let Some(final_message) = &result.final_message {
        println!("\n{final_message}");
    }

    std::process::exit(if result.success { 0 } else { 1 });
}

fn default_journal_dir() -> PathBuf {
    dirs::home_dir().map(|home| home.join(".loopwright").join("journal")).unwrap_or_else(|| PathBuf::from(".loopwright/journal"))
}

fn print_event(event: &Event) {
    match event {
        Event::ContentDelta { delta } => {
            use std::io::Write as _;
            print!("{delta}");
            let _ = std::io::stdout().flush();
        }
        Event::ToolStart { tool_call, .. } => {
            println!("\n[tool] {} {}", tool_call.name, tool_call.raw_arguments_text);
        }
        Event::ToolResult { tool_call, result } => {
            println!("[tool:{}] {}", tool_call.name, if result.success { "ok" } else { "failed" });
        }
        Event::Compacting { is_compacting } if *is_compacting => {
            println!("\n[compacting context...]");
        }
        Event::Error { message } => {
            eprintln!("\n[error] {message}");
        }
        _ => {}
    }
}
