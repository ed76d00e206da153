use std::time::Duration;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Taxonomy observable in [`LoopResult::error`]. Tool-call failures are
/// never represented here — they surface as `success:false` `ToolResult`s
/// inside `tool_result` events instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopErrorType {
    Aborted,
    ChatDisabled,
    MaxTurnsExceeded,
    ApiError,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopError {
    pub r#type: LoopErrorType,
    pub message: String,
    pub details: Option<Value>,
}

impl LoopError {
    pub fn new(r#type: LoopErrorType, message: impl Into<String>) -> Self {
        Self { r#type, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn aborted() -> Self {
        Self::new(LoopErrorType::Aborted, "aborted")
    }

    pub fn chat_disabled() -> Self {
        Self::new(LoopErrorType::ChatDisabled, "chat is disabled (maxTurns=0)")
    }

    pub fn max_turns_exceeded(cap: u32) -> Self {
        Self::new(LoopErrorType::MaxTurnsExceeded, format!("达到最大轮次限制 ({cap})"))
    }

    pub fn api_error(message: impl Into<String>) -> Self {
        Self::new(LoopErrorType::ApiError, message)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct LoopMetadata {
    pub turns_count: u32,
    pub tool_calls_count: u32,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub tokens_used: Option<u64>,
    pub should_exit_loop: Option<bool>,
    pub target_mode: Option<String>,
    pub configured_max_turns: Option<i64>,
    pub actual_max_turns: Option<u32>,
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u128(value.as_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Terminal verdict of a single [`crate::agent_loop::AgentLoop::run`] call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopResult {
    pub success: bool,
    pub final_message: Option<String>,
    pub error: Option<LoopError>,
    pub metadata: LoopMetadata,
}

impl LoopResult {
    pub fn success(final_message: impl Into<String>, metadata: LoopMetadata) -> Self {
        Self { success: true, final_message: Some(final_message.into()), error: None, metadata }
    }

    pub fn failure(error: LoopError, metadata: LoopMetadata) -> Self {
        Self { success: false, final_message: None, error: Some(error), metadata }
    }
}
