use serde::Serialize;

use super::{ValidationError, non_negative};

/// What a model supports and what it costs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelCapabilities {
    model_id: String,
    provider: String,
    max_context_tokens: u32,
    max_output_tokens: u32,
    supports_tools: bool,
    supports_vision: bool,
    supports_streaming: bool,
    supports_streaming_tool_calls: bool,
    supports_system_messages: bool,
    cost_per_1k_input: f64,
    cost_per_1k_output: f64,
}

impl ModelCapabilities {
    /// Start describing a model
    ///
    /// Streaming and system messages default to supported; tools, vision,
    /// and streaming tool calls default to unsupported; costs default to zero.
    pub fn builder(
        model_id: impl Into<String>,
        provider: impl Into<String>,
        max_context_tokens: u32,
        max_output_tokens: u32,
    ) -> ModelCapabilitiesBuilder {
        ModelCapabilitiesBuilder {
            inner: Self {
                model_id: model_id.into(),
                provider: provider.into(),
                max_context_tokens,
                max_output_tokens,
                supports_tools: false,
                supports_vision: false,
                supports_streaming: true,
                supports_streaming_tool_calls: false,
                supports_system_messages: true,
                cost_per_1k_input: 0.0,
                cost_per_1k_output: 0.0,
            },
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub const fn max_context_tokens(&self) -> u32 {
        self.max_context_tokens
    }

    pub const fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub const fn supports_tools(&self) -> bool {
        self.supports_tools
    }

    pub const fn supports_vision(&self) -> bool {
        self.supports_vision
    }

    pub const fn supports_streaming(&self) -> bool {
        self.supports_streaming
    }

    pub const fn supports_streaming_tool_calls(&self) -> bool {
        self.supports_streaming_tool_calls
    }

    pub const fn supports_system_messages(&self) -> bool {
        self.supports_system_messages
    }

    pub const fn cost_per_1k_input(&self) -> f64 {
        self.cost_per_1k_input
    }

    pub const fn cost_per_1k_output(&self) -> f64 {
        self.cost_per_1k_output
    }
}

/// Builder for [`ModelCapabilities`], validated on [`build`](Self::build)
#[derive(Debug, Clone)]
#[must_use]
pub struct ModelCapabilitiesBuilder {
    inner: ModelCapabilities,
}

impl ModelCapabilitiesBuilder {
    pub const fn tools(mut self, supported: bool) -> Self {
        self.inner.supports_tools = supported;
        self
    }

    pub const fn vision(mut self, supported: bool) -> Self {
        self.inner.supports_vision = supported;
        self
    }

    pub const fn streaming(mut self, supported: bool) -> Self {
        self.inner.supports_streaming = supported;
        self
    }

    pub const fn streaming_tool_calls(mut self, supported: bool) -> Self {
        self.inner.supports_streaming_tool_calls = supported;
        self
    }

    pub const fn system_messages(mut self, supported: bool) -> Self {
        self.inner.supports_system_messages = supported;
        self
    }

    /// Per-1k-token input and output prices in US dollars
    pub const fn costs(mut self, per_1k_input: f64, per_1k_output: f64) -> Self {
        self.inner.cost_per_1k_input = per_1k_input;
        self.inner.cost_per_1k_output = per_1k_output;
        self
    }

    pub fn build(self) -> Result<ModelCapabilities, ValidationError> {
        let caps = self.inner;
        if caps.max_context_tokens == 0 {
            return Err(ValidationError::new("max_context_tokens", "must be greater than 0"));
        }
        if caps.max_output_tokens == 0 {
            return Err(ValidationError::new("max_output_tokens", "must be greater than 0"));
        }
        if caps.max_output_tokens > caps.max_context_tokens {
            return Err(ValidationError::new(
                "max_output_tokens",
                format!(
                    "{} exceeds max_context_tokens ({})",
                    caps.max_output_tokens, caps.max_context_tokens
                ),
            ));
        }
        if caps.supports_streaming_tool_calls && !(caps.supports_tools && caps.supports_streaming) {
            return Err(ValidationError::new(
                "supports_streaming_tool_calls",
                "requires both tool and streaming support",
            ));
        }
        non_negative("cost_per_1k_input", caps.cost_per_1k_input)?;
        non_negative("cost_per_1k_output", caps.cost_per_1k_output)?;
        Ok(caps)
    }
}
