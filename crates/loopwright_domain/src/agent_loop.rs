use std::time::Instant;

use futures::StreamExt;
use loopwright_stream::{channel, DrivenStream, EventSink};
use tracing::{debug, instrument};

use crate::compaction::CompactionCoordinator;
use crate::config::LoopConfig;
use crate::dispatcher::ToolDispatcher;
use crate::event::Event;
use crate::hooks::{AfterToolExecInfo, AssistantMessageInfo, BeforeTurnContext, CompleteInfo, StopCheckInfo};
use crate::message::{Message, Role};
use crate::result::{LoopError, LoopMetadata, LoopResult};
use crate::retry::{should_retry, RETRY_PROMPT};
use crate::tool_result::ToolResult;
use crate::turn_limit::{TurnLimitAction, TurnLimitController, TurnLimitSnapshot};
use crate::turn_runner::{classify_chat_error, TurnRunner};

/// The turn scheduler. `run` is its single operation: it spawns the state
/// machine as a driving task and hands back the event stream paired with a
/// handle to the terminal [`LoopResult`] (see [`loopwright_stream`] for why
/// this shape replaces an async-generator-with-return-value).
pub struct AgentLoop;

impl AgentLoop {
    pub fn run(config: LoopConfig) -> DrivenStream<Event, LoopResult> {
        let (sink, stream) = channel::<Event>(64);
        let handle = tokio::spawn(run_inner(config, sink));
        DrivenStream::new(stream, handle)
    }
}

struct RunState {
    turn: u32,
    turns_count: u32,
    tool_calls_count: u32,
    total_tokens: u64,
    last_prompt_tokens: Option<u64>,
    start: Instant,
}

impl RunState {
    fn new() -> Self {
        Self { turn: 0, turns_count: 0, tool_calls_count: 0, total_tokens: 0, last_prompt_tokens: None, start: Instant::now() }
    }

    fn metadata(&self) -> LoopMetadata {
        LoopMetadata {
            turns_count: self.turns_count,
            tool_calls_count: self.tool_calls_count,
            duration: self.start.elapsed(),
            tokens_used: Some(self.total_tokens),
            should_exit_loop: None,
            target_mode: None,
            configured_max_turns: None,
            actual_max_turns: None,
        }
    }
}

async fn run_inner(mut config: LoopConfig, events: EventSink<Event>) -> LoopResult {
    // maxTurns=0 disables chat before a single event is emitted.
    if config.is_chat_disabled() {
        return LoopResult::failure(LoopError::chat_disabled(), LoopMetadata::default());
    }

    events.send(Event::AgentStart).await;
    let mut state = RunState::new();
    let result = drive(&mut config, &mut state, &events).await;
    events.send(Event::AgentEnd).await;
    result
}

#[instrument(skip_all, fields(session_id = %config.execution_context.session_id))]
async fn drive(config: &mut LoopConfig, state: &mut RunState, events: &EventSink<Event>) -> LoopResult {
    loop {
        if config.is_aborted() {
            return LoopResult::failure(LoopError::aborted(), state.metadata());
        }

        run_pre_turn_compaction(config, state, events).await;
        run_before_turn_hook(config, state, events).await;

        state.turn += 1;
        let effective_max_turns = config.effective_max_turns();
        events.send(Event::TurnStart { turn: state.turn, max_turns: effective_max_turns }).await;

        if config.is_aborted() {
            return LoopResult::failure(LoopError::aborted(), state.metadata());
        }

        let response = match TurnRunner::run_turn(
            config.chat_service.as_ref(),
            &config.messages,
            &config.tools,
            config.signal.clone(),
            events,
        )
        .await
        {
            Ok(response) => response,
            Err(err) => return LoopResult::failure(classify_chat_error(&err), state.metadata()),
        };

        if let Some(usage) = &response.usage {
            state.total_tokens += usage.total;
            state.last_prompt_tokens = Some(usage.prompt);
            events
                .send(Event::TokenUsage {
                    input: usage.prompt,
                    output: usage.completion,
                    total: usage.total,
                    max_context: config.max_context_tokens,
                })
                .await;
        }

        let aborted_mid_turn = config.is_aborted();
        if let Some(reasoning) = &response.reasoning_content {
            if !aborted_mid_turn {
                events.send(Event::Thinking { text: reasoning.clone() }).await;
            }
        }
        if !response.content.trim().is_empty() && !aborted_mid_turn {
            events.send(Event::StreamEnd).await;
        }

        if response.tool_calls.is_empty() {
            if should_retry(&response.content, &config.messages) {
                debug!(turn = state.turn, "incomplete-intent retry");
                config.messages.push(Message::user(RETRY_PROMPT));
                events.send(Event::TurnEnd { turn: state.turn, has_tool_calls: false }).await;
                continue;
            }

            if let Some(should_continue) = evaluate_stop_hook(config, state.turn, &response.content, events).await {
                if should_continue {
                    events.send(Event::TurnEnd { turn: state.turn, has_tool_calls: false }).await;
                    continue;
                }
            }

            state.turns_count = state.turn;
            if let Some(hook) = &config.hooks.on_complete {
                hook.run(CompleteInfo { content: response.content.clone(), turn: state.turn }).await;
            }
            events.send(Event::TurnEnd { turn: state.turn, has_tool_calls: false }).await;
            return LoopResult::success(response.content.clone(), state.metadata());
        }

        config.messages.push(Message::assistant(
            response.content.clone(),
            response.reasoning_content.clone(),
            Some(response.tool_calls.clone()),
        ));
        if let Some(hook) = &config.hooks.on_assistant_message {
            hook.run(AssistantMessageInfo {
                content: response.content.clone(),
                reasoning_content: response.reasoning_content.clone(),
                tool_calls: Some(response.tool_calls.clone()),
                turn: state.turn,
            })
            .await;
        }

        // The loop must not assume a specific transport type beyond
        // `function`; everything else is filtered out silently.
        let function_calls: Vec<_> = response.tool_calls.iter().filter(|c| c.is_function()).cloned().collect();

        for call in &function_calls {
            let tool_kind = config.execution_pipeline.tool_kind(&call.name);
            events.send(Event::ToolStart { tool_call: call.clone(), tool_kind }).await;
        }

        let dispatched =
            ToolDispatcher::run_all(function_calls, &config.execution_context, &config.execution_pipeline, &config.hooks)
                .await;

        let mut exit_result: Option<ToolResult> = None;
        for dispatched in dispatched {
            state.tool_calls_count += 1;
            events.send(Event::ToolResult { tool_call: dispatched.tool_call.clone(), result: dispatched.result.clone() }).await;

            if let Some(hook) = &config.hooks.on_after_tool_exec {
                hook.run(AfterToolExecInfo {
                    tool_call: dispatched.tool_call.clone(),
                    result: dispatched.result.clone(),
                    tool_use_uuid: dispatched.tool_use_uuid,
                })
                .await;
            }

            config.messages.push(Message::tool(
                dispatched.tool_call.id.clone(),
                dispatched.tool_call.name.clone(),
                dispatched.result.as_message_text(),
            ));

            if dispatched.result.should_exit_loop() {
                exit_result = Some(dispatched.result);
                break;
            }
        }

        if let Some(result) = exit_result {
            state.turns_count = state.turn;
            events.send(Event::TurnEnd { turn: state.turn, has_tool_calls: true }).await;
            let mut metadata = state.metadata();
            metadata.should_exit_loop = Some(true);
            metadata.target_mode = result.target_mode().map(str::to_string);
            return LoopResult { success: result.success, final_message: Some(result.as_message_text()), error: None, metadata };
        }

        events.send(Event::TurnEnd { turn: state.turn, has_tool_calls: true }).await;
        state.turns_count = state.turn;

        if config.is_aborted() {
            return LoopResult::failure(LoopError::aborted(), state.metadata());
        }

        if state.turn >= effective_max_turns && !config.is_yolo_mode {
            match handle_turn_limit(config, state, effective_max_turns).await {
                TurnLimitAction::Continue { messages } => {
                    config.messages = messages;
                    state.turn = 0;
                    continue;
                }
                TurnLimitAction::Stop(result) => return result,
            }
        }
    }
}

async fn run_pre_turn_compaction(config: &mut LoopConfig, state: &RunState, events: &EventSink<Event>) {
    let Some(coordinator) = config.compaction.clone() else { return };
    let chat_config = config.chat_service.get_config();
    let Some(actual_pre_tokens) = CompactionCoordinator::pre_turn_threshold(&chat_config, state.last_prompt_tokens)
    else {
        return;
    };

    events.send(Event::Compacting { is_compacting: true }).await;
    let session_id = config.execution_context.session_id.clone();
    let compacted = coordinator.run_pre_turn(&session_id, &mut config.messages, &chat_config, actual_pre_tokens, None).await;
    events.send(Event::Compacting { is_compacting: false }).await;
    debug!(compacted, "pre-turn compaction check");
}

async fn run_before_turn_hook(config: &LoopConfig, state: &RunState, events: &EventSink<Event>) {
    let Some(hook) = &config.hooks.before_turn else { return };
    let ctx = BeforeTurnContext {
        turn: state.turn,
        messages: config.messages.clone(),
        last_prompt_tokens: state.last_prompt_tokens,
    };
    let (mut inner_events, _compaction_happened) = hook.run(ctx).await;
    while let Some(event) = inner_events.next().await {
        events.send(event).await;
    }
}

/// Returns `None` when no stop hook is configured (fall through to
/// completion); `Some(true)` when the loop should append the continuation
/// reminder and keep going; `Some(false)` when the hook confirmed the stop
/// (or failed, which the caller treats identically to `shouldStop:true`).
async fn evaluate_stop_hook(config: &mut LoopConfig, turn: u32, content: &str, _events: &EventSink<Event>) -> Option<bool> {
    let hook = config.hooks.stop_check.clone()?;
    match hook.run(StopCheckInfo { content: content.to_string(), turn }).await {
        Ok(response) if !response.should_stop => {
            let reminder = match response.continue_reason {
                Some(reason) => format!("<system-reminder>{reason}</system-reminder>"),
                None => {
                    "<system-reminder>Continue working on the task silently; do not ask the user to confirm.</system-reminder>"
                        .to_string()
                }
            };
            config.messages.push(Message::user(reminder));
            Some(true)
        }
        _ => Some(false),
    }
}

async fn handle_turn_limit(config: &mut LoopConfig, state: &RunState, effective_max_turns: u32) -> TurnLimitAction {
    let snapshot = TurnLimitSnapshot {
        turns_count: state.turns_count,
        tool_calls_count: state.tool_calls_count,
        duration: state.start.elapsed(),
        tokens_used: Some(state.total_tokens),
        configured_max_turns: config.max_turns,
        actual_max_turns: effective_max_turns,
    };

    let pinned_system = config.messages.first().cloned().filter(|m| m.has_role(Role::System));
    let skip = usize::from(pinned_system.is_some());
    let context_messages: Vec<Message> = config.messages.iter().skip(skip).cloned().collect();

    TurnLimitController::handle(&config.hooks, config.messages.clone(), context_messages, None, snapshot).await
}
