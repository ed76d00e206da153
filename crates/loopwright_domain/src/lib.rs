//! Core turn-scheduling state machine for a multi-turn, tool-using agent
//! runtime: [`agent_loop::AgentLoop`] drives turns against a pluggable
//! [`chat::ChatService`] and [`execution::ExecutionPipeline`], fanning tool
//! calls out through [`dispatcher::ToolDispatcher`], enforcing the turn
//! budget via [`turn_limit::TurnLimitController`], and triggering context
//! compaction through [`compaction::CompactionCoordinator`]. Everything else
//! — transport, tool implementations, journaling, session management — is a
//! typed external collaborator this crate only depends on.

pub mod agent_loop;
pub mod chat;
pub mod compaction;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod execution;
pub mod hooks;
pub mod journal;
pub mod message;
pub mod result;
pub mod retry;
pub mod tool_call;
pub mod tool_definition;
pub mod tool_result;
pub mod turn_limit;
pub mod turn_runner;

pub use agent_loop::AgentLoop;
pub use chat::{ChatCall, ChatFragment, ChatResponse, ChatService, ChatServiceConfig, ChatStream, ChatStreamEvent, Usage};
pub use compaction::{CompactionCoordinator, CompactionOutcome, CompactionRequest, CompactionService, CompactionTrigger};
pub use config::{LoopConfig, CHAT_DISABLED_MAX_TURNS, SAFETY_CEILING, UNLIMITED_MAX_TURNS};
pub use dispatcher::{DispatchedResult, ToolDispatcher};
pub use error::Error;
pub use event::Event;
pub use execution::{
    ConfirmationHandler, ConfirmationRequest, ConfirmationResponse, ExecutionPipeline, PermissionMode, ToolExecutionContext,
    ToolKind,
};
pub use hooks::Hooks;
pub use journal::{CompactionStats, Journal, SubagentInfo};
pub use message::{Message, Role};
pub use result::{LoopError, LoopErrorType, LoopMetadata, LoopResult};
pub use tool_call::{ToolCallRequest, ToolCallTransport};
pub use tool_definition::ToolDefinition;
pub use tool_result::{SubagentStatus, ToolError, ToolResult};
pub use turn_limit::TurnLimitController;
pub use turn_runner::TurnRunner;
