use std::collections::BTreeMap;

use loopwright_domain::{ChatFragment, ChatResponse};

use crate::wire::{PendingToolCall, WireChoice, WireCompletion};

/// Folds a sequence of streamed chunks into the final [`ChatResponse`],
/// yielding a [`ChatFragment`] for each chunk that carries new text.
/// Tool-call argument deltas arrive indexed and split across many chunks
/// (OpenAI's function-calling stream protocol); they're accumulated here
/// and only surface once in the terminal response, since the domain's
/// `ChatFragment` has no tool-call variant.
#[derive(Default)]
pub struct Accumulator {
    content: String,
    reasoning: String,
    tool_calls: BTreeMap<usize, PendingToolCall>,
    usage: Option<loopwright_domain::Usage>,
}

impl Accumulator {
    pub fn push_chunk(&mut self, chunk: WireCompletion) -> Vec<ChatFragment> {
        let mut fragments = Vec::new();

        if let Some(usage) = chunk.usage {
            self.usage = Some(usage.into());
        }

        for choice in &chunk.choices {
            self.apply_choice(choice, &mut fragments);
        }
        fragments
    }

    fn apply_choice(&mut self, choice: &WireChoice, fragments: &mut Vec<ChatFragment>) {
        let Some(delta) = choice.delta.as_ref().or(choice.message.as_ref()) else { return };

        if let Some(delta_text) = &delta.content
            && !delta_text.is_empty()
        {
            self.content.push_str(delta_text);
            fragments.push(ChatFragment::Content { delta: delta_text.clone() });
        }
        if let Some(delta_text) = &delta.reasoning_content
            && !delta_text.is_empty()
        {
            self.reasoning.push_str(delta_text);
            fragments.push(ChatFragment::Reasoning { delta: delta_text.clone() });
        }
        if let Some(calls) = &delta.tool_calls {
            for call in calls {
                let entry = self.tool_calls.entry(call.index).or_default();
                if let Some(id) = &call.id {
                    entry.id = id.clone();
                }
                if let Some(name) = &call.function.name {
                    entry.name.push_str(name);
                }
                if let Some(arguments) = &call.function.arguments {
                    entry.arguments.push_str(arguments);
                }
            }
        }
    }

    pub fn finish(self) -> ChatResponse {
        let tool_calls = self.tool_calls.into_values().map(Into::into).collect();
        ChatResponse {
            content: self.content,
            reasoning_content: if self.reasoning.is_empty() { None } else { Some(self.reasoning) },
            tool_calls,
            usage: self.usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::from_value;

    use super::*;

    fn chunk(json: serde_json::Value) -> WireCompletion {
        from_value(json).unwrap()
    }

    #[test]
    fn accumulates_content_deltas_in_order() {
        let mut acc = Accumulator::default();
        acc.push_chunk(chunk(serde_json::json!({"choices":[{"delta":{"content":"Hel"}}]})));
        acc.push_chunk(chunk(serde_json::json!({"choices":[{"delta":{"content":"lo"}}]})));
        let response = acc.finish();
        assert_eq!(response.content, "Hello");
    }

    #[test]
    fn accumulates_indexed_tool_call_argument_deltas() {
        let mut acc = Accumulator::default();
        acc.push_chunk(chunk(serde_json::json!({
            "choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"ReadFile","arguments":"{\"pa"}}]}}]
        })));
        acc.push_chunk(chunk(serde_json::json!({
            "choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"th\":\"a\"}"}}]}}]
        })));
        let response = acc.finish();
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_1");
        assert_eq!(response.tool_calls[0].name, "ReadFile");
        assert_eq!(response.tool_calls[0].raw_arguments_text, "{\"path\":\"a\"}");
    }

    #[test]
    fn captures_usage_from_final_chunk() {
        let mut acc = Accumulator::default();
        acc.push_chunk(chunk(serde_json::json!({
            "choices":[],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })));
        let response = acc.finish();
        assert_eq!(response.usage.unwrap().total, 15);
    }
}
