use std::sync::Arc;

use async_trait::async_trait;
use loopwright_domain::{
    AfterToolExecInfo, AssistantMessageInfo, BeforeToolExecInfo, CompleteInfo, Journal, OnAfterToolExecHook,
    OnAssistantMessageHook, OnBeforeToolExecHook, OnCompleteHook, Role,
};
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// Journals every assistant message, tool call, tool result, and final
/// message for one session, threading `lastMessageUuid` through the calls
/// as a mutable cell rather than re-querying the journal (see the journal
/// UUID chain design note).
pub struct JournalHooks {
    journal: Arc<dyn Journal>,
    session_id: String,
    last_uuid: Mutex<Option<Uuid>>,
}

impl JournalHooks {
    pub fn new(journal: Arc<dyn Journal>, session_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { journal, session_id: session_id.into(), last_uuid: Mutex::new(None) })
    }

    async fn advance(&self, uuid: Uuid) {
        *self.last_uuid.lock().await = Some(uuid);
    }

    async fn parent(&self) -> Option<Uuid> {
        *self.last_uuid.lock().await
    }
}

#[async_trait]
impl OnAssistantMessageHook for JournalHooks {
    async fn run(&self, info: AssistantMessageInfo) {
        let parent = self.parent().await;
        match self.journal.save_message(&self.session_id, Role::Assistant, &info.content, parent, None, None).await {
            Ok(uuid) => self.advance(uuid).await,
            Err(err) => warn!(error = %err, turn = info.turn, "failed to journal assistant message"),
        }
    }
}

#[async_trait]
impl OnBeforeToolExecHook for JournalHooks {
    async fn run(&self, info: BeforeToolExecInfo) -> Option<Uuid> {
        let parent = self.parent().await;
        match self.journal.save_tool_use(&self.session_id, &info.tool_call.name, &info.params, parent, None).await {
            Ok(uuid) => {
                self.advance(uuid).await;
                Some(uuid)
            }
            Err(err) => {
                warn!(error = %err, tool = %info.tool_call.name, "failed to journal tool use");
                None
            }
        }
    }
}

#[async_trait]
impl OnAfterToolExecHook for JournalHooks {
    async fn run(&self, info: AfterToolExecInfo) {
        let output = info.result.success.then(|| info.result.as_message_text());
        let error = (!info.result.success).then(|| info.result.as_message_text());
        let result = self
            .journal
            .save_tool_result(
                &self.session_id,
                &info.tool_call.id,
                &info.tool_call.name,
                output.as_deref(),
                info.tool_use_uuid,
                error.as_deref(),
                None,
                info.result.subagent_session_id(),
            )
            .await;
        match result {
            Ok(uuid) => self.advance(uuid).await,
            Err(err) => warn!(error = %err, tool = %info.tool_call.name, "failed to journal tool result"),
        }
    }
}

#[async_trait]
impl OnCompleteHook for JournalHooks {
    async fn run(&self, info: CompleteInfo) {
        let parent = self.parent().await;
        if let Err(err) = self.journal.save_message(&self.session_id, Role::Assistant, &info.content, parent, None, None).await {
            warn!(error = %err, turn = info.turn, "failed to journal final message");
        }
    }
}

#[cfg(test)]
mod tests {
    use loopwright_domain::{ToolCallRequest, ToolResult};
    use serde_json::json;

    use super::*;
    use crate::jsonl_journal::JsonlJournal;

    #[tokio::test]
    async fn uuid_chain_threads_through_successive_hook_calls() {
        let dir = tempfile::tempdir().unwrap();
        let journal: Arc<dyn Journal> = JsonlJournal::new(dir.path().to_path_buf());
        let hooks = JournalHooks::new(journal, "s1");

        assert!(hooks.parent().await.is_none());
        hooks.run(AssistantMessageInfo { content: "hi".into(), reasoning_content: None, tool_calls: None, turn: 1 }).await;
        let after_message = hooks.parent().await;
        assert!(after_message.is_some());

        let tool_call = ToolCallRequest::new("call_1", "ReadFile", "{}");
        let tool_use_uuid =
            OnBeforeToolExecHook::run(hooks.as_ref(), BeforeToolExecInfo { tool_call: tool_call.clone(), params: json!({}) }).await;
        assert!(tool_use_uuid.is_some());
        assert_ne!(hooks.parent().await, after_message);

        OnAfterToolExecHook::run(
            hooks.as_ref(),
            AfterToolExecInfo { tool_call, result: ToolResult::success(json!("ok")), tool_use_uuid },
        )
        .await;
        assert_ne!(hooks.parent().await, tool_use_uuid);
    }
}
