//! Conversion between the wire model and the OpenAI-compatible backend format

use serde_json::{Map, Value};

use crate::protocol::openai::{
    OpenAiFunction, OpenAiFunctionCall, OpenAiMessage, OpenAiRequest, OpenAiTool, OpenAiToolCall,
};
use crate::types::{ChatMessage, CompletionConfig, FinishReason, Role, ToolCall, ToolDefinition};

// -- Outbound: wire model -> backend request --

/// Build the backend request body for `model`
pub fn build_request(
    model: String,
    messages: &[ChatMessage],
    tools: &[ToolDefinition],
    config: &CompletionConfig,
) -> OpenAiRequest {
    OpenAiRequest {
        model,
        messages: messages.iter().map(Into::into).collect(),
        temperature: config.temperature(),
        top_p: config.top_p(),
        max_tokens: config.max_tokens(),
        stop: (!config.stop_sequences().is_empty()).then(|| config.stop_sequences().to_vec()),
        stream: None,
        tools: (!tools.is_empty()).then(|| tools.iter().map(Into::into).collect()),
        stream_options: None,
    }
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = msg.role();

        if role == Role::Tool {
            let result = msg.tool_result();
            return Self {
                role: role.to_string(),
                content: Some(result.map_or_else(String::new, |r| r.content().to_owned())),
                tool_calls: None,
                tool_call_id: result.map(|r| r.tool_call_id().to_owned()),
            };
        }

        let tool_calls = (!msg.tool_calls().is_empty()).then(|| msg.tool_calls().iter().map(Into::into).collect());

        // Assistant turns may be pure tool calls; other roles always send content
        let content = match (role, msg.content()) {
            (Role::Assistant, content) => content.map(str::to_owned),
            (_, content) => Some(content.unwrap_or_default().to_owned()),
        };

        Self {
            role: role.to_string(),
            content,
            tool_calls,
            tool_call_id: None,
        }
    }
}

impl From<&ToolCall> for OpenAiToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id().to_owned(),
            tool_type: "function".to_owned(),
            function: OpenAiFunctionCall {
                name: call.name().to_owned(),
                arguments: Value::Object(call.arguments().clone()).to_string(),
            },
        }
    }
}

impl From<&ToolDefinition> for OpenAiTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_owned(),
            function: OpenAiFunction {
                name: tool.name().to_owned(),
                description: Some(tool.description().to_owned()),
                parameters: Some(tool.parameters().clone()),
            },
        }
    }
}

// -- Inbound: backend response -> wire model --

/// Map a backend finish reason onto [`FinishReason`]
///
/// Unknown or absent values become `Error`.
pub fn parse_finish_reason(raw: Option<&str>) -> FinishReason {
    match raw {
        Some("stop" | "end_turn" | "stop_sequence") => FinishReason::Stop,
        Some("length" | "max_tokens") => FinishReason::MaxTokens,
        Some("tool_calls" | "function_call" | "tool_use") => FinishReason::ToolUse,
        Some("content_filter") => FinishReason::ContentFilter,
        Some(other) if !other.is_empty() => {
            tracing::warn!(finish_reason = %other, "unknown finish reason");
            FinishReason::Error
        }
        _ => FinishReason::Error,
    }
}

/// Parse JSON-encoded tool arguments
///
/// Anything other than a JSON object yields an empty map.
pub fn parse_arguments(raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(kind = %json_kind(&other), "tool arguments are not a JSON object");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse tool arguments");
            Map::new()
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert complete backend tool calls, skipping any without an id or name
pub fn extract_tool_calls(calls: Vec<OpenAiToolCall>) -> Vec<ToolCall> {
    calls
        .into_iter()
        .filter_map(|call| {
            let arguments = parse_arguments(&call.function.arguments);
            match ToolCall::new(call.id, call.function.name, arguments) {
                Ok(call) => Some(call),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping incomplete tool call");
                    None
                }
            }
        })
        .collect()
}
