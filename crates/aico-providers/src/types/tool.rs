use serde::Serialize;
use serde_json::{Map, Value};

use super::{ValidationError, non_blank};

/// A function the model may call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    name: String,
    description: String,
    parameters: Value,
}

impl ToolDefinition {
    /// Create a tool definition
    ///
    /// `parameters` must be a JSON Schema object.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Result<Self, ValidationError> {
        if !parameters.is_object() {
            return Err(ValidationError::new("parameters", "must be a JSON object schema"));
        }
        Ok(Self {
            name: non_blank("name", name.into())?,
            description: description.into(),
            parameters,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON Schema describing the arguments
    pub const fn parameters(&self) -> &Value {
        &self.parameters
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    id: String,
    name: String,
    arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: non_blank("id", id.into())?,
            name: non_blank("name", name.into())?,
            arguments,
        })
    }

    /// Backend-assigned call identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }
}

/// Outcome of executing a tool call, fed back to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    tool_call_id: String,
    content: String,
    is_error: bool,
}

impl ToolResult {
    pub fn new(tool_call_id: impl Into<String>, content: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            tool_call_id: non_blank("tool_call_id", tool_call_id.into())?,
            content: content.into(),
            is_error: false,
        })
    }

    /// Mark the result as a failed execution
    #[must_use]
    pub const fn with_error(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }

    /// Identifier of the call this result answers
    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn is_error(&self) -> bool {
        self.is_error
    }
}
