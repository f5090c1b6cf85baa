//! Wire model shared by every provider adapter
//!
//! All values validate their invariants at construction and are immutable
//! afterwards; fields are reachable only through accessors.

mod capabilities;
mod config;
mod message;
mod response;
mod stream;
mod tool;
mod usage;

pub use capabilities::{ModelCapabilities, ModelCapabilitiesBuilder};
pub use config::CompletionConfig;
pub use message::{ChatMessage, Role};
pub use response::{CompletionResponse, FinishReason};
pub use stream::{StreamChunk, StreamChunkParts, StreamEventType};
pub use tool::{ToolCall, ToolDefinition, ToolResult};
pub use usage::TokenUsage;

/// A wire-model value rejected at construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    field: &'static str,
    reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Why the value was rejected
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Reject empty or whitespace-only strings
pub(crate) fn non_blank(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(value)
}

/// Reject negative or non-finite numbers
pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new(field, format!("must be finite and >= 0, got {value}")));
    }
    Ok(value)
}
