use serde::{Deserialize, Serialize};

use super::{ToolCall, ToolResult, ValidationError};

/// Conversation participant role
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in a conversation
///
/// The role decides which fields may be populated:
///
/// - `tool` carries a tool result and never tool calls
/// - `assistant` may carry tool calls but never a tool result
/// - `system` and `user` carry neither
///
/// Every message other than `tool` needs content or at least one tool call.
/// Empty content is valid and distinct from absent content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_result: Option<ToolResult>,
}

impl ChatMessage {
    /// Create a message, checking role constraints
    pub fn new(
        role: Role,
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
        tool_result: Option<ToolResult>,
    ) -> Result<Self, ValidationError> {
        match role {
            Role::Tool => {
                if tool_result.is_none() {
                    return Err(ValidationError::new("tool_result", "required for tool messages"));
                }
                if !tool_calls.is_empty() {
                    return Err(ValidationError::new("tool_calls", "not allowed on tool messages"));
                }
            }
            Role::Assistant => {
                if tool_result.is_some() {
                    return Err(ValidationError::new("tool_result", "not allowed on assistant messages"));
                }
            }
            Role::System | Role::User => {
                if !tool_calls.is_empty() {
                    return Err(ValidationError::new("tool_calls", format!("not allowed on {role} messages")));
                }
                if tool_result.is_some() {
                    return Err(ValidationError::new("tool_result", format!("not allowed on {role} messages")));
                }
            }
        }

        if role != Role::Tool && content.is_none() && tool_calls.is_empty() {
            return Err(ValidationError::new("content", "message needs content or tool calls"));
        }

        Ok(Self {
            role,
            content,
            tool_calls,
            tool_result,
        })
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content.into())
    }

    /// Assistant turn that requests tool invocations
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Result<Self, ValidationError> {
        Self::new(Role::Assistant, content, tool_calls, None)
    }

    /// Tool turn answering an earlier call
    pub fn tool(result: ToolResult) -> Self {
        Self {
            role: Role::Tool,
            content: None,
            tool_calls: Vec::new(),
            tool_result: Some(result),
        }
    }

    const fn text(role: Role, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_result: None,
        }
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub const fn tool_result(&self) -> Option<&ToolResult> {
        self.tool_result.as_ref()
    }
}
