use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Transport shape the model used to emit a tool call. The loop only ever
/// executes `Function` calls; anything else is filtered out silently before
/// a turn's tool calls are dispatched.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallTransport {
    Function,
    Other(String),
}

impl Default for ToolCallTransport {
    fn default() -> Self {
        ToolCallTransport::Function
    }
}

/// A tool call as emitted by the model. `raw_arguments_text` is JSON text as
/// emitted by the model; the dispatcher parses it before execution.
#[derive(Clone, Debug, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub raw_arguments_text: String,
    #[setters(skip)]
    pub transport: ToolCallTransport,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, raw_arguments_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            raw_arguments_text: raw_arguments_text.into(),
            transport: ToolCallTransport::Function,
        }
    }

    pub fn with_transport(mut self, transport: ToolCallTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn is_function(&self) -> bool {
        matches!(self.transport, ToolCallTransport::Function)
    }
}

/// Context-specific argument repairs applied before execution (see data
/// model §ToolCallRequest):
///
/// 1. if `name == "Task"` and `subagent_session_id` is absent/blank, fabricate
///    one — prefer `resume` if it is a non-empty string, else a fresh random
///    id.
/// 2. if any `todos` field is a string, parse it as JSON; on failure leave it
///    and defer to schema validation downstream.
pub fn apply_argument_repairs(tool_name: &str, params: &mut Value) {
    if tool_name == "Task" {
        repair_task_subagent_session_id(params);
    }
    repair_todos_field(params);
}

fn repair_task_subagent_session_id(params: &mut Value) {
    let Some(obj) = params.as_object_mut() else { return };

    let needs_fabrication = match obj.get("subagent_session_id") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    };
    if !needs_fabrication {
        return;
    }

    let fabricated = match obj.get("resume") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => Uuid::new_v4().to_string(),
    };
    obj.insert("subagent_session_id".to_string(), Value::String(fabricated));
}

fn repair_todos_field(params: &mut Value) {
    let Some(obj) = params.as_object_mut() else { return };
    let Some(Value::String(raw)) = obj.get("todos").cloned() else { return };

    if let Ok(parsed) = serde_json::from_str::<Value>(&raw) {
        obj.insert("todos".to_string(), parsed);
    }
    // else: leave untouched, downstream schema validation will reject it
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fabricates_subagent_session_id_from_resume() {
        let mut params = json!({ "resume": "abc-123" });
        apply_argument_repairs("Task", &mut params);
        assert_eq!(params["subagent_session_id"], "abc-123");
    }

    #[test]
    fn fabricates_fresh_subagent_session_id_when_resume_blank() {
        let mut params = json!({ "resume": "   " });
        apply_argument_repairs("Task", &mut params);
        let id = params["subagent_session_id"].as_str().unwrap();
        assert!(!id.trim().is_empty());
    }

    #[test]
    fn leaves_existing_subagent_session_id_untouched() {
        let mut params = json!({ "subagent_session_id": "keep-me" });
        apply_argument_repairs("Task", &mut params);
        assert_eq!(params["subagent_session_id"], "keep-me");
    }

    #[test]
    fn ignores_non_task_tools() {
        let mut params = json!({});
        apply_argument_repairs("ReadFile", &mut params);
        assert!(params.get("subagent_session_id").is_none());
    }

    #[test]
    fn parses_stringified_todos() {
        let mut params = json!({ "todos": "[{\"text\":\"a\"}]" });
        apply_argument_repairs("Task", &mut params);
        assert!(params["todos"].is_array());
    }

    #[test]
    fn leaves_unparseable_todos_string_untouched() {
        let mut params = json!({ "todos": "not json" });
        apply_argument_repairs("Task", &mut params);
        assert_eq!(params["todos"], "not json");
    }
}
