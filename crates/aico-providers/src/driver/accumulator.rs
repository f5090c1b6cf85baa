//! Reassembly of tool calls streamed as fragments

use std::collections::BTreeMap;

use super::convert::parse_arguments;
use crate::protocol::openai::OpenAiStreamToolCall;
use crate::types::ToolCall;

#[derive(Debug, Default)]
struct PendingCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Per-stream state keyed by the backend's tool-call index
///
/// Ids and names stick once seen; argument fragments are appended in
/// arrival order.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    pending: BTreeMap<u32, PendingCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fragment into its slot
    pub fn push(&mut self, fragment: &OpenAiStreamToolCall) {
        let slot = self.pending.entry(fragment.index).or_default();

        if slot.id.is_none() {
            slot.id = fragment.id.clone().filter(|id| !id.is_empty());
        }

        if let Some(function) = &fragment.function {
            if slot.name.is_none() {
                slot.name = function.name.clone().filter(|name| !name.is_empty());
            }
            if let Some(arguments) = &function.arguments {
                slot.arguments.push_str(arguments);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Assemble the accumulated calls in ascending index order
    ///
    /// Slots still missing an id or name are dropped.
    pub fn finish(self) -> Vec<ToolCall> {
        self.pending
            .into_iter()
            .filter_map(|(index, call)| {
                let (Some(id), Some(name)) = (call.id, call.name) else {
                    tracing::warn!(index, "dropping streamed tool call without id or name");
                    return None;
                };
                let arguments = parse_arguments(&call.arguments);
                ToolCall::new(id, name, arguments)
                    .inspect_err(|e| tracing::warn!(index, error = %e, "dropping invalid streamed tool call"))
                    .ok()
            })
            .collect()
    }
}
