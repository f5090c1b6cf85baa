use serde::{Deserialize, Serialize};

use super::{TokenUsage, ToolCall, ValidationError, non_blank};

/// Why generation stopped
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of turn or a stop sequence
    Stop,
    /// Output token limit reached
    MaxTokens,
    /// Model requested tool invocations
    ToolUse,
    /// Output blocked by a content policy
    ContentFilter,
    /// Unknown or failed termination
    Error,
}

impl FinishReason {
    /// Whether a response may legitimately carry neither content nor tool calls
    const fn allows_empty(self) -> bool {
        matches!(self, Self::ContentFilter | Self::Error)
    }
}

/// Result of a non-streaming completion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionResponse {
    content: Option<String>,
    tool_calls: Vec<ToolCall>,
    finish_reason: FinishReason,
    usage: TokenUsage,
    model: String,
    provider_request_id: Option<String>,
}

impl CompletionResponse {
    /// Create a response
    ///
    /// Unless `finish_reason` is `content_filter` or `error`, the response must
    /// carry content or at least one tool call.
    pub fn new(
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
        finish_reason: FinishReason,
        usage: TokenUsage,
        model: impl Into<String>,
        provider_request_id: Option<String>,
    ) -> Result<Self, ValidationError> {
        if content.is_none() && tool_calls.is_empty() && !finish_reason.allows_empty() {
            return Err(ValidationError::new(
                "content",
                format!("response finishing with {finish_reason} needs content or tool calls"),
            ));
        }
        Ok(Self {
            content,
            tool_calls,
            finish_reason,
            usage,
            model: non_blank("model", model.into())?,
            provider_request_id,
        })
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub const fn finish_reason(&self) -> FinishReason {
        self.finish_reason
    }

    pub const fn usage(&self) -> &TokenUsage {
        &self.usage
    }

    /// Model identifier reported by the backend
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Backend request identifier, when the backend returned one
    pub fn provider_request_id(&self) -> Option<&str> {
        self.provider_request_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;

    fn usage() -> TokenUsage {
        TokenUsage::new(1, 1, 2, 0.0).unwrap()
    }

    #[test]
    fn stop_with_content() {
        let response =
            CompletionResponse::new(Some("hi".into()), vec![], FinishReason::Stop, usage(), "m", None).unwrap();
        assert_eq!(response.content(), Some("hi"));
        assert_eq!(response.finish_reason(), FinishReason::Stop);
    }

    #[test]
    fn stop_without_content_or_calls_rejected() {
        let err = CompletionResponse::new(None, vec![], FinishReason::Stop, usage(), "m", None).unwrap_err();
        assert_eq!(err.field(), "content");
    }

    #[test]
    fn tool_calls_satisfy_content_requirement() {
        let call = ToolCall::new("c1", "f", Map::new()).unwrap();
        assert!(CompletionResponse::new(None, vec![call], FinishReason::ToolUse, usage(), "m", None).is_ok());
    }

    #[test]
    fn filtered_and_error_may_be_empty() {
        assert!(CompletionResponse::new(None, vec![], FinishReason::ContentFilter, usage(), "m", None).is_ok());
        assert!(CompletionResponse::new(None, vec![], FinishReason::Error, usage(), "m", None).is_ok());
    }

    #[test]
    fn model_must_not_be_blank() {
        let err = CompletionResponse::new(Some("x".into()), vec![], FinishReason::Stop, usage(), " ", None).unwrap_err();
        assert_eq!(err.field(), "model");
    }
}
