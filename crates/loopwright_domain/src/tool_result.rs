use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed error carried by a failed `ToolResult`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolError {
    pub r#type: String,
    pub message: String,
}

impl ToolError {
    pub fn new(r#type: impl Into<String>, message: impl Into<String>) -> Self {
        Self { r#type: r#type.into(), message: message.into() }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new("execution_error", message)
    }
}

/// Status of a nested sub-agent run, forwarded to the journal but never
/// interpreted by the loop itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubagentStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// The outcome of a single tool invocation.
#[derive(Clone, Debug, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct ToolResult {
    pub success: bool,
    /// Content fed back to the model. Serialised to canonical JSON text when
    /// placed into a `tool` message if it isn't already a string.
    pub llm_content: Value,
    pub display_content: Option<String>,
    pub error: Option<ToolError>,
    pub metadata: Option<serde_json::Map<String, Value>>,
}

impl ToolResult {
    pub fn success(llm_content: impl Into<Value>) -> Self {
        Self {
            success: true,
            llm_content: llm_content.into(),
            display_content: None,
            error: None,
            metadata: None,
        }
    }

    pub fn failure(error: ToolError) -> Self {
        Self {
            success: false,
            llm_content: Value::String(error.message.clone()),
            display_content: None,
            error: Some(error),
            metadata: None,
        }
    }

    /// Text placed back into the conversation (invariant: always a string).
    /// The error message is used in place of content when `success = false`.
    pub fn as_message_text(&self) -> String {
        if !self.success {
            if let Some(err) = &self.error {
                return err.message.clone();
            }
        }
        match &self.llm_content {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }

    fn metadata_bool(&self, key: &str) -> Option<bool> {
        self.metadata.as_ref()?.get(key)?.as_bool()
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key)?.as_str()
    }

    pub fn should_exit_loop(&self) -> bool {
        self.metadata_bool("shouldExitLoop").unwrap_or(false)
    }

    pub fn target_mode(&self) -> Option<&str> {
        self.metadata_str("targetMode")
    }

    /// A non-empty, trimmed `modelId`/`model` metadata value, if present,
    /// signalling a mid-loop model swap.
    pub fn model_override(&self) -> Option<&str> {
        for key in ["modelId", "model"] {
            if let Some(value) = self.metadata_str(key) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed);
                }
            }
        }
        None
    }

    pub fn subagent_session_id(&self) -> Option<&str> {
        self.metadata_str("subagentSessionId")
    }

    pub fn subagent_type(&self) -> Option<&str> {
        self.metadata_str("subagentType")
    }

    pub fn subagent_status(&self) -> Option<SubagentStatus> {
        match self.metadata_str("subagentStatus")? {
            "running" => Some(SubagentStatus::Running),
            "completed" => Some(SubagentStatus::Completed),
            "failed" => Some(SubagentStatus::Failed),
            "cancelled" => Some(SubagentStatus::Cancelled),
            _ => None,
        }
    }

    pub fn subagent_summary(&self) -> Option<&str> {
        self.metadata_str("subagentSummary")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn as_message_text_uses_string_content_directly() {
        let result = ToolResult::success(Value::String("hello".into()));
        assert_eq!(result.as_message_text(), "hello");
    }

    #[test]
    fn as_message_text_serialises_non_string_content() {
        let result = ToolResult::success(json!({ "a": 1 }));
        assert_eq!(result.as_message_text(), "{\"a\":1}");
    }

    #[test]
    fn as_message_text_uses_error_message_on_failure() {
        let result = ToolResult::failure(ToolError::execution("boom"));
        assert_eq!(result.as_message_text(), "boom");
    }

    #[test]
    fn should_exit_loop_reads_metadata() {
        let mut result = ToolResult::success(Value::String("x".into()));
        let mut map = serde_json::Map::new();
        map.insert("shouldExitLoop".into(), Value::Bool(true));
        result.metadata = Some(map);
        assert!(result.should_exit_loop());
    }

    #[test]
    fn model_override_prefers_model_id_and_trims() {
        let mut result = ToolResult::success(Value::String("x".into()));
        let mut map = serde_json::Map::new();
        map.insert("modelId".into(), Value::String("  gpt-5  ".into()));
        map.insert("model".into(), Value::String("other".into()));
        result.metadata = Some(map);
        assert_eq!(result.model_override(), Some("gpt-5"));
    }

    #[test]
    fn model_override_ignores_blank_values() {
        let mut result = ToolResult::success(Value::String("x".into()));
        let mut map = serde_json::Map::new();
        map.insert("modelId".into(), Value::String("   ".into()));
        result.metadata = Some(map);
        assert_eq!(result.model_override(), None);
    }
}
