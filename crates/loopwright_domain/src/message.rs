use derive_setters::Setters;
use serde::{Deserialize, Serialize};

use crate::tool_call::ToolCallRequest;

/// Role tag for a single turn in the conversation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A role-tagged message in the conversation passed to and mutated by the
/// loop. `messages` is owned by the caller for the duration of a `run` and
/// must not be mutated concurrently while a run is in flight.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Model-internal chain-of-thought, kept for provider replay. Only ever
    /// set on `assistant` messages.
    pub reasoning_content: Option<String>,
    /// Only ever set on `assistant` messages.
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    /// Only ever set on `tool` messages: the call this message answers.
    pub tool_call_id: Option<String>,
    /// Only ever set on `tool` messages.
    pub tool_name: Option<String>,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), ..Default::default() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), ..Default::default() }
    }

    pub fn assistant(
        content: impl Into<String>,
        reasoning_content: Option<String>,
        tool_calls: Option<Vec<ToolCallRequest>>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            reasoning_content,
            tool_calls,
            ..Default::default()
        }
    }

    pub fn tool(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
            tool_name: Some(tool_name.into()),
            ..Default::default()
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
