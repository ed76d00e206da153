use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An LLM-shaped tool declaration sent to the chat service.
#[derive(Clone, Debug, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self { name: name.into(), description: description.into(), parameters }
    }
}
