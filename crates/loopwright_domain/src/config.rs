use std::sync::Arc;

use derive_setters::Setters;
use tokio_util::sync::CancellationToken;

use crate::chat::ChatService;
use crate::compaction::CompactionCoordinator;
use crate::execution::{ExecutionPipeline, PermissionMode, ToolExecutionContext};
use crate::hooks::Hooks;
use crate::message::Message;
use crate::tool_definition::ToolDefinition;

/// `maxTurns == -1` means unlimited, subject to [`SAFETY_CEILING`].
pub const UNLIMITED_MAX_TURNS: i64 = -1;
/// `maxTurns == 0` disables chat entirely.
pub const CHAT_DISABLED_MAX_TURNS: i64 = 0;
/// Runaway guard applied whenever the configured cap is unlimited, and the
/// only cap that applies in YOLO mode.
pub const SAFETY_CEILING: u32 = 100;

/// Immutable configuration for a single [`crate::agent_loop::AgentLoop::run`]
/// call. Nothing here outlives that call; see the "stateless agent" design
/// note — `sessionId`, `messages`, and hook wiring are all inputs to one run,
/// never held across runs by the loop itself.
#[derive(Clone, Setters)]
#[setters(strip_option, into)]
pub struct LoopConfig {
    #[setters(skip)]
    pub chat_service: Arc<dyn ChatService>,
    #[setters(skip)]
    pub execution_pipeline: Arc<dyn ExecutionPipeline>,
    pub tools: Vec<ToolDefinition>,
    pub messages: Vec<Message>,
    pub max_turns: i64,
    pub is_yolo_mode: bool,
    #[setters(skip)]
    pub signal: Option<CancellationToken>,
    pub permission_mode: PermissionMode,
    pub max_context_tokens: u64,
    pub execution_context: ToolExecutionContext,
    #[setters(skip)]
    pub hooks: Hooks,
    /// Pre-turn threshold compaction (§4.5). `None` skips that check
    /// entirely — useful for tests and for callers that don't need
    /// automatic context trimming.
    #[setters(skip)]
    pub compaction: Option<Arc<CompactionCoordinator>>,
}

impl LoopConfig {
    pub fn new(
        chat_service: Arc<dyn ChatService>,
        execution_pipeline: Arc<dyn ExecutionPipeline>,
        execution_context: ToolExecutionContext,
    ) -> Self {
        Self {
            chat_service,
            execution_pipeline,
            tools: Vec::new(),
            messages: Vec::new(),
            max_turns: UNLIMITED_MAX_TURNS,
            is_yolo_mode: false,
            signal: None,
            permission_mode: PermissionMode::default_mode(),
            max_context_tokens: 128_000,
            execution_context,
            hooks: Hooks::default(),
            compaction: None,
        }
    }

    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_compaction(mut self, compaction: Arc<CompactionCoordinator>) -> Self {
        self.compaction = Some(compaction);
        self
    }

    /// Effective per-run cap before any YOLO override: `100` when
    /// unlimited, otherwise the configured value clamped to a `u32`.
    pub fn configured_cap(&self) -> u32 {
        if self.max_turns == UNLIMITED_MAX_TURNS {
            SAFETY_CEILING
        } else {
            self.max_turns.max(0) as u32
        }
    }

    /// Effective cap for this run: `SAFETY_CEILING` in YOLO mode, else
    /// [`Self::configured_cap`].
    pub fn effective_max_turns(&self) -> u32 {
        if self.is_yolo_mode {
            SAFETY_CEILING
        } else {
            self.configured_cap()
        }
    }

    pub fn is_chat_disabled(&self) -> bool {
        self.max_turns == CHAT_DISABLED_MAX_TURNS
    }

    pub fn is_aborted(&self) -> bool {
        self.signal.as_ref().is_some_and(|s| s.is_cancelled())
    }
}
