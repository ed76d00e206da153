use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::tool_result::ToolResult;

/// Permission posture passed through to every tool call and into the
/// pipeline's registry filter. The loop treats this as an opaque value; it
/// never interprets it beyond forwarding.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PermissionMode(pub String);

impl PermissionMode {
    pub const DEFAULT: &'static str = "default";
    pub const PLAN: &'static str = "plan";
    pub const YOLO: &'static str = "yolo";

    pub fn default_mode() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    pub fn plan() -> Self {
        Self(Self::PLAN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PermissionMode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Metadata emitted alongside `tool_start` so consumers can render or police
/// tool calls without knowing the tool's implementation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    ReadOnly,
    Write,
    Execute,
}

#[derive(Clone, Debug)]
pub struct ConfirmationRequest {
    pub tool_name: String,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Clone, Debug, Default)]
pub struct ConfirmationResponse {
    pub approved: bool,
    pub answers: Option<Value>,
}

/// Forwarded unchanged into each pipeline call.
#[async_trait::async_trait]
pub trait ConfirmationHandler: Send + Sync {
    async fn request_confirmation(&self, request: ConfirmationRequest) -> anyhow::Result<ConfirmationResponse>;
}

/// Execution-scoped values threaded into every `ExecutionPipeline::execute`
/// call for the duration of a single run.
#[derive(Clone, Setters)]
#[setters(strip_option, into)]
pub struct ToolExecutionContext {
    pub session_id: String,
    pub user_id: Option<String>,
    pub workspace_root: PathBuf,
    #[setters(skip)]
    pub signal: Option<CancellationToken>,
    #[setters(skip)]
    pub confirmation_handler: Option<Arc<dyn ConfirmationHandler>>,
    pub permission_mode: PermissionMode,
}

impl ToolExecutionContext {
    pub fn new(session_id: impl Into<String>, workspace_root: PathBuf) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
            workspace_root,
            signal: None,
            confirmation_handler: None,
            permission_mode: PermissionMode::default_mode(),
        }
    }

    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_confirmation_handler(mut self, handler: Arc<dyn ConfirmationHandler>) -> Self {
        self.confirmation_handler = Some(handler);
        self
    }
}

/// Tool execution, sandboxing, and permission gating are entirely the
/// pipeline's concern. The loop depends only on this typed interface.
#[async_trait::async_trait]
pub trait ExecutionPipeline: Send + Sync {
    async fn execute(&self, name: &str, params: Value, ctx: &ToolExecutionContext) -> ToolResult;

    /// `None` if the tool is unknown to the registry.
    fn tool_kind(&self, name: &str) -> Option<ToolKind>;
}
