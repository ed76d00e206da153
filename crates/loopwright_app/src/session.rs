use std::sync::Arc;

use loopwright_config::RetryConfig;
use loopwright_domain::{ChatServiceConfig, CompactionCoordinator, Hooks, Journal};

use crate::compaction_service::LlmCompactionService;
use crate::journal_hooks::JournalHooks;

/// Wires a [`JournalHooks`] instance into every hook slot it implements.
/// Callers that need additional behaviour (a stop-check policy, a
/// turn-limit continuation handler) can start from this and fill in the
/// remaining `Hooks` fields themselves.
pub fn journaled_hooks(journal: Arc<dyn Journal>, session_id: &str) -> Hooks {
    let journal_hooks = JournalHooks::new(journal, session_id);
    Hooks {
        on_assistant_message: Some(journal_hooks.clone()),
        on_before_tool_exec: Some(journal_hooks.clone()),
        on_after_tool_exec: Some(journal_hooks.clone()),
        on_complete: Some(journal_hooks),
        ..Default::default()
    }
}

/// An LLM-backed compaction coordinator that journals every compaction it
/// performs, suitable for `LoopConfig::with_compaction`. Shares `retry_config`
/// with the loop's own `ChatService` so a flaky upstream doesn't make
/// compaction fail any more eagerly than the main turn loop does.
pub fn journaled_compaction_coordinator(
    chat_config: ChatServiceConfig,
    retry_config: RetryConfig,
    journal: Option<Arc<dyn Journal>>,
) -> Arc<CompactionCoordinator> {
    let service = Arc::new(LlmCompactionService::from_config(chat_config, retry_config));
    Arc::new(CompactionCoordinator::new(service, journal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonl_journal::JsonlJournal;

    #[test]
    fn journaled_hooks_fills_all_four_journal_backed_slots() {
        let dir = tempfile::tempdir().unwrap();
        let journal: Arc<dyn Journal> = JsonlJournal::new(dir.path().to_path_buf());
        let hooks = journaled_hooks(journal, "s1");
        assert!(hooks.on_assistant_message.is_some());
        assert!(hooks.on_before_tool_exec.is_some());
        assert!(hooks.on_after_tool_exec.is_some());
        assert!(hooks.on_complete.is_some());
        assert!(hooks.before_turn.is_none());
        assert!(hooks.stop_check.is_none());
    }
}
