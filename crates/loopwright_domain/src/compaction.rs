use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::chat::ChatServiceConfig;
use crate::journal::{CompactionStats, Journal};
use crate::message::{Message, Role};

const FALLBACK_TRUNCATE_KEEP: usize = 80;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactionTrigger {
    Auto,
    TurnLimit,
}

#[derive(Clone, Debug)]
pub struct CompactionRequest {
    pub messages: Vec<Message>,
    pub trigger: CompactionTrigger,
    pub model_name: String,
    pub max_context_tokens: u64,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub actual_pre_tokens: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct CompactionOutcome {
    pub success: bool,
    pub compacted_messages: Vec<Message>,
    pub summary: String,
    pub pre_tokens: u64,
    pub post_tokens: u64,
    pub files_included: Vec<String>,
}

/// Summarisation of the earlier portion of `messages`. The core calls this
/// and uses its return value; how a summary is produced is entirely this
/// collaborator's concern.
#[async_trait::async_trait]
pub trait CompactionService: Send + Sync {
    async fn compact(&self, request: CompactionRequest) -> anyhow::Result<CompactionOutcome>;
}

/// Owns the two compaction call sites (§4.5): pre-turn threshold checks and
/// turn-limit continuation. Unlike the rest of the loop's journal writes —
/// which flow only through hooks — this component holds a direct `Journal`
/// handle, because the dependency chain names `Journal` as one of its own
/// leaf dependencies rather than one reached only via hook closures.
pub struct CompactionCoordinator {
    service: Arc<dyn CompactionService>,
    journal: Option<Arc<dyn Journal>>,
}

impl CompactionCoordinator {
    pub fn new(service: Arc<dyn CompactionService>, journal: Option<Arc<dyn Journal>>) -> Self {
        Self { service, journal }
    }

    /// Computes `available = maxContextTokens - maxOutputTokens`,
    /// `threshold = floor(available * 0.8)`. Returns `None` when
    /// `last_prompt_tokens` is unknown (first turn) or below threshold —
    /// the caller should then skip compaction entirely, not just no-op it.
    pub fn pre_turn_threshold(config: &ChatServiceConfig, last_prompt_tokens: Option<u64>) -> Option<u64> {
        let last_prompt_tokens = last_prompt_tokens?;
        let max_output = config.max_output_tokens.unwrap_or(0);
        let available = config.max_context_tokens.saturating_sub(max_output);
        let threshold = (available as f64 * 0.8).floor() as u64;
        (last_prompt_tokens >= threshold).then_some(last_prompt_tokens)
    }

    /// Runs the pre-turn compaction call. Returns `true` iff compaction
    /// happened; on failure, logs and returns `false` without failing the
    /// run, per §4.6.
    pub async fn run_pre_turn(
        &self,
        session_id: &str,
        messages: &mut Vec<Message>,
        config: &ChatServiceConfig,
        actual_pre_tokens: u64,
        parent_uuid: Option<Uuid>,
    ) -> bool {
        let request = CompactionRequest {
            messages: messages.clone(),
            trigger: CompactionTrigger::Auto,
            model_name: config.model.clone(),
            max_context_tokens: config.max_context_tokens,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            actual_pre_tokens: Some(actual_pre_tokens),
        };

        match self.service.compact(request).await {
            Ok(outcome) if outcome.success => {
                apply_compaction(messages, outcome.compacted_messages, None);
                self.record(session_id, &outcome, parent_uuid).await;
                true
            }
            Ok(_) => {
                warn!("pre-turn compaction reported failure; continuing without compaction");
                false
            }
            Err(err) => {
                warn!(error = %err, "pre-turn compaction failed; continuing without compaction");
                false
            }
        }
    }

    /// Runs the turn-limit compaction call. `continuation_message` is the
    /// "resume from a summarised conversation" boilerplate appended after
    /// the compacted tail so the model knows to continue. Falls back to
    /// truncating to the last [`FALLBACK_TRUNCATE_KEEP`] messages (after the
    /// pinned system message) on failure; this still counts as success for
    /// the caller's `{action:"continue"}` decision.
    pub async fn run_turn_limit(
        &self,
        session_id: &str,
        messages: &mut Vec<Message>,
        context_messages: Vec<Message>,
        config: &ChatServiceConfig,
        continuation_message: Option<Message>,
    ) {
        let request = CompactionRequest {
            messages: context_messages,
            trigger: CompactionTrigger::TurnLimit,
            model_name: config.model.clone(),
            max_context_tokens: config.max_context_tokens,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            actual_pre_tokens: None,
        };

        match self.service.compact(request).await {
            Ok(outcome) if outcome.success => {
                apply_compaction(messages, outcome.compacted_messages, continuation_message);
                self.record(session_id, &outcome, None).await;
            }
            _ => {
                warn!("turn-limit compaction failed; falling back to truncation");
                fallback_truncate(messages, continuation_message);
            }
        }
    }

    async fn record(&self, session_id: &str, outcome: &CompactionOutcome, parent_uuid: Option<Uuid>) {
        let Some(journal) = &self.journal else { return };
        let stats = CompactionStats {
            pre_tokens: outcome.pre_tokens,
            post_tokens: outcome.post_tokens,
            pre_message_count: 0,
            post_message_count: outcome.compacted_messages.len(),
        };
        if let Err(err) = journal.save_compaction(session_id, &outcome.summary, stats, parent_uuid).await {
            warn!(error = %err, "failed to persist compaction record");
        }
    }
}

/// Invariant 5: the pinned system message (if present) survives compaction
/// at index 0.
pub(crate) fn apply_compaction(messages: &mut Vec<Message>, compacted: Vec<Message>, continuation: Option<Message>) {
    let pinned_system = messages.first().filter(|m| m.has_role(Role::System)).cloned();

    let mut rebuilt = Vec::with_capacity(compacted.len() + 2);
    if let Some(system) = pinned_system {
        rebuilt.push(system);
    }
    rebuilt.extend(compacted);
    if let Some(continuation) = continuation {
        rebuilt.push(continuation);
    }
    *messages = rebuilt;
}

pub(crate) fn fallback_truncate(messages: &mut Vec<Message>, continuation: Option<Message>) {
    let pinned_system = messages.first().filter(|m| m.has_role(Role::System)).cloned();
    let tail_start = messages.len().saturating_sub(FALLBACK_TRUNCATE_KEEP);
    let mut tail: Vec<Message> = messages.split_off(tail_start);

    let mut rebuilt = Vec::with_capacity(tail.len() + 2);
    if let Some(system) = pinned_system {
        rebuilt.push(system);
    }
    rebuilt.append(&mut tail);
    if let Some(continuation) = continuation {
        rebuilt.push(continuation);
    }
    *messages = rebuilt;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_context: u64, max_output: Option<u64>) -> ChatServiceConfig {
        ChatServiceConfig { model: "m".into(), max_context_tokens: max_context, max_output_tokens: max_output, api_key: None, base_url: None }
    }

    #[test]
    fn threshold_is_none_when_last_prompt_tokens_unknown() {
        assert_eq!(CompactionCoordinator::pre_turn_threshold(&config(1000, Some(200)), None), None);
    }

    #[test]
    fn threshold_fires_at_80_percent_of_available() {
        // available = 1000 - 200 = 800; threshold = 640
        assert_eq!(CompactionCoordinator::pre_turn_threshold(&config(1000, Some(200)), Some(640)), Some(640));
        assert_eq!(CompactionCoordinator::pre_turn_threshold(&config(1000, Some(200)), Some(639)), None);
    }

    #[test]
    fn apply_compaction_preserves_pinned_system_message() {
        let mut messages = vec![Message::system("sys"), Message::user("old"), Message::user("also old")];
        apply_compaction(&mut messages, vec![Message::assistant("summary", None, None)], None);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn fallback_truncate_keeps_last_n_and_pins_system() {
        let mut messages = vec![Message::system("sys")];
        for i in 0..100 {
            messages.push(Message::user(format!("msg-{i}")));
        }
        fallback_truncate(&mut messages, None);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages.len(), FALLBACK_TRUNCATE_KEEP + 1);
        assert_eq!(messages.last().unwrap().content, "msg-99");
    }
}
