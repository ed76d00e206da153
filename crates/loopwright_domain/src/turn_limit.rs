use std::time::Duration;

use crate::compaction::{apply_compaction, fallback_truncate};
use crate::hooks::{Hooks, TurnLimitCompactInfo, TurnLimitReachedInfo};
use crate::message::Message;
use crate::result::{LoopError, LoopMetadata, LoopResult};

pub enum TurnLimitAction {
    Continue { messages: Vec<Message> },
    Stop(LoopResult),
}

#[derive(Clone, Copy, Debug)]
pub struct TurnLimitSnapshot {
    pub turns_count: u32,
    pub tool_calls_count: u32,
    pub duration: Duration,
    pub tokens_used: Option<u64>,
    pub configured_max_turns: i64,
    pub actual_max_turns: u32,
}

/// Encodes the quota policy (§4.4): safety ceiling, unlimited mode,
/// user-confirm-then-compact-and-continue, or non-interactive hard stop.
pub struct TurnLimitController;

impl TurnLimitController {
    /// `context_messages` is whatever subset of `messages` the caller wants
    /// the compaction hook to see (e.g. excluding the pinned system
    /// message); `messages` is rebuilt in place on a successful continue.
    pub async fn handle(
        hooks: &Hooks,
        messages: Vec<Message>,
        context_messages: Vec<Message>,
        continuation_message: Option<Message>,
        snapshot: TurnLimitSnapshot,
    ) -> TurnLimitAction {
        let Some(on_turn_limit_reached) = &hooks.on_turn_limit_reached else {
            let metadata = LoopMetadata {
                turns_count: snapshot.turns_count,
                tool_calls_count: snapshot.tool_calls_count,
                duration: snapshot.duration,
                tokens_used: snapshot.tokens_used,
                ..Default::default()
            };
            return TurnLimitAction::Stop(LoopResult::failure(
                LoopError::max_turns_exceeded(snapshot.actual_max_turns),
                metadata,
            ));
        };

        let response = on_turn_limit_reached.run(TurnLimitReachedInfo { turns_count: snapshot.turns_count }).await;

        if !response.r#continue {
            let metadata = LoopMetadata {
                turns_count: snapshot.turns_count,
                tool_calls_count: snapshot.tool_calls_count,
                duration: snapshot.duration,
                tokens_used: snapshot.tokens_used,
                configured_max_turns: Some(snapshot.configured_max_turns),
                actual_max_turns: Some(snapshot.actual_max_turns),
                ..Default::default()
            };
            // Success, because the stop was user-chosen.
            return TurnLimitAction::Stop(LoopResult { success: true, final_message: None, error: None, metadata });
        }

        let mut messages = messages;
        match &hooks.on_turn_limit_compact {
            Some(hook) => {
                let compact_response =
                    hook.run(TurnLimitCompactInfo { messages: messages.clone(), context_messages }).await;
                if compact_response.success {
                    let compacted = compact_response.compacted_messages.unwrap_or_default();
                    apply_compaction(&mut messages, compacted, compact_response.continue_message);
                } else {
                    fallback_truncate(&mut messages, continuation_message);
                }
            }
            None => fallback_truncate(&mut messages, continuation_message),
        }

        TurnLimitAction::Continue { messages }
    }
}
