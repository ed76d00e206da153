use std::path::PathBuf;
use std::sync::Arc;

use loopwright_domain::{CompactionStats, Journal, Role, SubagentInfo};
use serde::Serialize;
use serde_json::Value;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record<'a> {
    Message {
        uuid: Uuid,
        role: &'static str,
        text: &'a str,
        parent_uuid: Option<Uuid>,
        extras: Option<&'a Value>,
        #[serde(flatten)]
        subagent: SubagentFields,
    },
    ToolUse {
        uuid: Uuid,
        tool_name: &'a str,
        params: &'a Value,
        parent_uuid: Option<Uuid>,
        #[serde(flatten)]
        subagent: SubagentFields,
    },
    ToolResult {
        uuid: Uuid,
        tool_call_id: &'a str,
        tool_name: &'a str,
        output: Option<&'a str>,
        tool_use_uuid: Option<Uuid>,
        error: Option<&'a str>,
        subagent_ref: Option<&'a str>,
        #[serde(flatten)]
        subagent: SubagentFields,
    },
    Compaction {
        summary: &'a str,
        stats: CompactionStats,
        parent_uuid: Option<Uuid>,
    },
}

#[derive(Serialize, Default)]
struct SubagentFields {
    subagent_session_id: Option<String>,
    subagent_type: Option<String>,
    subagent_status: Option<&'static str>,
    subagent_summary: Option<String>,
}

impl From<Option<SubagentInfo>> for SubagentFields {
    fn from(info: Option<SubagentInfo>) -> Self {
        let Some(info) = info else { return Self::default() };
        Self {
            subagent_session_id: info.subagent_session_id,
            subagent_type: info.subagent_type,
            subagent_status: info.subagent_status.map(|status| match status {
                loopwright_domain::SubagentStatus::Running => "running",
                loopwright_domain::SubagentStatus::Completed => "completed",
                loopwright_domain::SubagentStatus::Failed => "failed",
                loopwright_domain::SubagentStatus::Cancelled => "cancelled",
            }),
            subagent_summary: info.subagent_summary,
        }
    }
}

/// Appends one JSON object per line to `<dir>/<session_id>.jsonl`. Every
/// method opens, appends, and closes the file rather than holding it open —
/// simple and correct for the write volumes a single loop run produces;
/// concurrent writers to the same session would need external locking this
/// type doesn't provide.
pub struct JsonlJournal {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonlJournal {
    pub fn new(dir: PathBuf) -> Arc<Self> {
        Arc::new(Self { dir, lock: Mutex::new(()) })
    }

    async fn append(&self, session_id: &str, record: &Record<'_>) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{session_id}.jsonl"));
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Journal for JsonlJournal {
    async fn save_message(
        &self,
        session_id: &str,
        role: Role,
        text: &str,
        parent_uuid: Option<Uuid>,
        extras: Option<Value>,
        subagent: Option<SubagentInfo>,
    ) -> anyhow::Result<Uuid> {
        let uuid = Uuid::new_v4();
        let record = Record::Message {
            uuid,
            role: role_str(role),
            text,
            parent_uuid,
            extras: extras.as_ref(),
            subagent: subagent.into(),
        };
        self.append(session_id, &record).await?;
        Ok(uuid)
    }

    async fn save_tool_use(
        &self,
        session_id: &str,
        tool_name: &str,
        params_json: &Value,
        parent_uuid: Option<Uuid>,
        subagent: Option<SubagentInfo>,
    ) -> anyhow::Result<Uuid> {
        let uuid = Uuid::new_v4();
        let record = Record::ToolUse { uuid, tool_name, params: params_json, parent_uuid, subagent: subagent.into() };
        self.append(session_id, &record).await?;
        Ok(uuid)
    }

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
    ) -> anyhow::Result<Uuid> {
        let uuid = Uuid::new_v4();
        let record = Record::ToolResult {
            uuid,
            tool_call_id,
            tool_name,
            output,
            tool_use_uuid,
            error,
            subagent_ref,
            subagent: subagent.into(),
        };
        self.append(session_id, &record).await?;
        Ok(uuid)
    }

    async fn save_compaction(&self, session_id: &str, summary: &str, stats: CompactionStats, parent_uuid: Option<Uuid>) -> anyhow::Result<()> {
        let record = Record::Compaction { summary, stats, parent_uuid };
        self.append(session_id, &record).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn appends_one_json_line_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JsonlJournal::new(dir.path().to_path_buf());

        journal.save_message("s1", Role::User, "hi", None, None, None).await.unwrap();
        journal.save_message("s1", Role::Assistant, "hello", None, None, None).await.unwrap();

        let content = tokio::fs::read_to_string(dir.path().join("s1.jsonl")).await.unwrap();
        assert_eq!(content.lines().count(), 2);
        for line in content.lines() {
            let value: Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["kind"], "message");
        }
    }

    #[tokio::test]
    async fn separates_sessions_into_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let journal = JsonlJournal::new(dir.path().to_path_buf());
        journal.save_message("a", Role::User, "x", None, None, None).await.unwrap();
        journal.save_message("b", Role::User, "y", None, None, None).await.unwrap();
        assert!(dir.path().join("a.jsonl").exists());
        assert!(dir.path().join("b.jsonl").exists());
    }
}
