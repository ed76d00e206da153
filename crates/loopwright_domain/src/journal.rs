use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::message::Role;
use crate::tool_result::SubagentStatus;

/// Sub-agent reference fields forwarded to the journal. The loop forwards
/// these without interpreting them; only the journal (or a rewind reader)
/// gives them meaning.
#[derive(Clone, Debug, Default)]
pub struct SubagentInfo {
    pub subagent_session_id: Option<String>,
    pub subagent_type: Option<String>,
    pub subagent_status: Option<SubagentStatus>,
    pub subagent_summary: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CompactionStats {
    pub pre_tokens: u64,
    pub post_tokens: u64,
    pub pre_message_count: usize,
    pub post_message_count: usize,
}

/// Append-only per-session record. The core never reads this back: each
/// `save_*` call returns a UUID that the caller threads as `parent_uuid` on
/// the next call (the "journal UUID chain"), typically held in a hook
/// closure's captured state rather than re-queried from the journal.
///
/// The loop itself never calls this trait directly — journal writes happen
/// from inside hook implementations (see [`crate::hooks::Hooks`]); this
/// trait exists purely to give those hook implementations a typed target.
#[async_trait::async_trait]
pub trait Journal: Send + Sync {
    async fn save_message(
        &self,
        session_id: &str,
        role: Role,
        text: &str,
        parent_uuid: Option<Uuid>,
        extras: Option<Value>,
        subagent: Option<SubagentInfo>,
    ) -> anyhow::Result<Uuid>;

    async fn save_tool_use(
        &self,
        session_id: &str,
        tool_name: &str,
        params_json: &Value,
        parent_uuid: Option<Uuid>,
        subagent: Option<SubagentInfo>,
    ) -> anyhow::Result<Uuid>;

    #[allow(clippy::too_many_arguments)]
    async fn save_tool_result(
        &self,
        session_id: &str,
        tool_call_id: &str,
        tool_name: &str,
        output: Option<&str>,
        tool_use_uuid: Option<Uuid>,
        error: Option<&str>,
        subagent: Option<SubagentInfo>,
        subagent_ref: Option<&str>,
    ) -> anyhow::Result<Uuid>;

    async fn save_compaction(
        &self,
        session_id: &str,
        summary: &str,
        stats: CompactionStats,
        parent_uuid: Option<Uuid>,
    ) -> anyhow::Result<()>;
}
