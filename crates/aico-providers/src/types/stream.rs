use serde::Serialize;

use super::{TokenUsage, ToolCall, ValidationError};

/// Discriminant of a [`StreamChunk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StreamEventType {
    ContentDelta,
    ToolCallDelta,
    Usage,
    Error,
    Done,
}

/// One event of a streaming completion
///
/// Each variant carries exactly its own payload, so a chunk with a
/// mismatched field cannot exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Incremental text
    ContentDelta { content: String },
    /// A fully assembled tool call
    ToolCallDelta { tool_call_delta: ToolCall },
    /// Token usage reported by the backend
    Usage { usage: TokenUsage },
    /// In-band error reported by the backend
    Error { error_message: String },
    /// End of stream
    Done,
}

impl StreamChunk {
    pub fn content(content: impl Into<String>) -> Self {
        Self::ContentDelta {
            content: content.into(),
        }
    }

    pub const fn tool_call(tool_call_delta: ToolCall) -> Self {
        Self::ToolCallDelta { tool_call_delta }
    }

    pub const fn usage(usage: TokenUsage) -> Self {
        Self::Usage { usage }
    }

    pub fn error(error_message: impl Into<String>) -> Self {
        Self::Error {
            error_message: error_message.into(),
        }
    }

    pub const fn event_type(&self) -> StreamEventType {
        match self {
            Self::ContentDelta { .. } => StreamEventType::ContentDelta,
            Self::ToolCallDelta { .. } => StreamEventType::ToolCallDelta,
            Self::Usage { .. } => StreamEventType::Usage,
            Self::Error { .. } => StreamEventType::Error,
            Self::Done => StreamEventType::Done,
        }
    }
}

/// Loose field set from which a [`StreamChunk`] is assembled
///
/// Conversion fails when the payload for `event_type` is missing or when any
/// other payload field is populated.
#[derive(Debug, Clone)]
pub struct StreamChunkParts {
    pub event_type: StreamEventType,
    pub content: Option<String>,
    pub tool_call_delta: Option<ToolCall>,
    pub usage: Option<TokenUsage>,
    pub error_message: Option<String>,
}

impl StreamChunkParts {
    pub const fn new(event_type: StreamEventType) -> Self {
        Self {
            event_type,
            content: None,
            tool_call_delta: None,
            usage: None,
            error_message: None,
        }
    }

    fn populated(&self) -> impl Iterator<Item = &'static str> {
        [
            ("content", self.content.is_some()),
            ("tool_call_delta", self.tool_call_delta.is_some()),
            ("usage", self.usage.is_some()),
            ("error_message", self.error_message.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
    }
}

impl TryFrom<StreamChunkParts> for StreamChunk {
    type Error = ValidationError;

    fn try_from(parts: StreamChunkParts) -> Result<Self, ValidationError> {
        let expected = match parts.event_type {
            StreamEventType::ContentDelta => Some("content"),
            StreamEventType::ToolCallDelta => Some("tool_call_delta"),
            StreamEventType::Usage => Some("usage"),
            StreamEventType::Error => Some("error_message"),
            StreamEventType::Done => None,
        };

        if let Some(extra) = parts.populated().find(|field| Some(*field) != expected) {
            return Err(ValidationError::new(
                extra,
                format!("not allowed on {} chunks", parts.event_type),
            ));
        }

        let missing = |field: &'static str| {
            ValidationError::new(field, format!("required on {} chunks", parts.event_type))
        };

        Ok(match parts.event_type {
            StreamEventType::ContentDelta => Self::ContentDelta {
                content: parts.content.ok_or_else(|| missing("content"))?,
            },
            StreamEventType::ToolCallDelta => Self::ToolCallDelta {
                tool_call_delta: parts.tool_call_delta.ok_or_else(|| missing("tool_call_delta"))?,
            },
            StreamEventType::Usage => Self::Usage {
                usage: parts.usage.ok_or_else(|| missing("usage"))?,
            },
            StreamEventType::Error => Self::Error {
                error_message: parts.error_message.ok_or_else(|| missing("error_message"))?,
            },
            StreamEventType::Done => Self::Done,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn usage() -> TokenUsage {
        TokenUsage::new(1, 2, 3, 0.0).unwrap()
    }

    #[test]
    fn content_delta_requires_content() {
        let err = StreamChunk::try_from(StreamChunkParts::new(StreamEventType::ContentDelta)).unwrap_err();
        assert_eq!(err.field(), "content");
    }

    #[test]
    fn content_delta_rejects_extraneous_fields() {
        let parts = StreamChunkParts {
            content: Some("hi".into()),
            usage: Some(usage()),
            ..StreamChunkParts::new(StreamEventType::ContentDelta)
        };
        assert_eq!(StreamChunk::try_from(parts).unwrap_err().field(), "usage");

        let parts = StreamChunkParts {
            content: Some("hi".into()),
            error_message: Some("boom".into()),
            ..StreamChunkParts::new(StreamEventType::ContentDelta)
        };
        assert_eq!(StreamChunk::try_from(parts).unwrap_err().field(), "error_message");
    }

    #[test]
    fn done_carries_no_payload() {
        assert_eq!(
            StreamChunk::try_from(StreamChunkParts::new(StreamEventType::Done)).unwrap(),
            StreamChunk::Done
        );
        let parts = StreamChunkParts {
            content: Some(String::new()),
            ..StreamChunkParts::new(StreamEventType::Done)
        };
        assert!(StreamChunk::try_from(parts).is_err());
    }

    #[test]
    fn matching_payload_accepted() {
        let parts = StreamChunkParts {
            usage: Some(usage()),
            ..StreamChunkParts::new(StreamEventType::Usage)
        };
        let chunk = StreamChunk::try_from(parts).unwrap();
        assert_eq!(chunk.event_type(), StreamEventType::Usage);
    }

    #[test]
    fn serializes_with_event_type_tag() {
        let value = serde_json::to_value(StreamChunk::content("he")).unwrap();
        assert_eq!(value, json!({"event_type": "content_delta", "content": "he"}));
        let value = serde_json::to_value(StreamChunk::Done).unwrap();
        assert_eq!(value, json!({"event_type": "done"}));
    }
}
