//! Provider contract shared by every completion adapter

use std::pin::Pin;

use aico_config::{DEFAULT_COST_DECIMALS, MAX_COST_DECIMALS};
use async_trait::async_trait;
use futures_util::Stream;

use crate::error::{ErrorContext, ErrorKind, ProviderError};
use crate::types::{ChatMessage, CompletionConfig, CompletionResponse, ModelCapabilities, StreamChunk, TokenUsage, ToolDefinition};

/// Lazily produced sequence of streaming events
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send>>;

/// Operations every completion adapter supports
///
/// Callers use [`complete`](Self::complete), [`stream`](Self::stream), and
/// [`get_capabilities`](Self::get_capabilities), which validate their inputs
/// before delegating to the adapter's `do_*` hooks. Adapters implement only
/// the hooks and must return every backend failure as a [`ProviderError`].
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name this adapter was registered under
    fn name(&self) -> &str;

    /// Run a non-streaming completion
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: &[ToolDefinition],
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        validate_request(messages, model)?;
        self.do_complete(messages, model, tools, config).await
    }

    /// Run a streaming completion
    ///
    /// The returned stream does no further work until polled; dropping it
    /// cancels the call.
    async fn stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: &[ToolDefinition],
        config: &CompletionConfig,
    ) -> Result<ChunkStream, ProviderError> {
        validate_request(messages, model)?;
        self.do_stream(messages, model, tools, config).await
    }

    /// Describe what `model` supports
    async fn get_capabilities(&self, model: &str) -> Result<ModelCapabilities, ProviderError> {
        validate_model(model)?;
        self.do_get_capabilities(model).await
    }

    /// Adapter hook behind [`complete`](Self::complete)
    async fn do_complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: &[ToolDefinition],
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Adapter hook behind [`stream`](Self::stream)
    async fn do_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: &[ToolDefinition],
        config: &CompletionConfig,
    ) -> Result<ChunkStream, ProviderError>;

    /// Adapter hook behind [`get_capabilities`](Self::get_capabilities)
    async fn do_get_capabilities(&self, model: &str) -> Result<ModelCapabilities, ProviderError>;
}

/// Reject an empty conversation or a blank model name
pub fn validate_request(messages: &[ChatMessage], model: &str) -> Result<(), ProviderError> {
    if messages.is_empty() {
        return Err(ProviderError::new(ErrorKind::InvalidRequest, "messages must not be empty"));
    }
    validate_model(model)
}

fn validate_model(model: &str) -> Result<(), ProviderError> {
    if model.trim().is_empty() {
        return Err(ProviderError::new(ErrorKind::InvalidRequest, "model must not be blank"));
    }
    Ok(())
}

/// Compute token usage and cost, rounded to the default precision
///
/// Rates are US dollars per 1000 tokens.
pub fn compute_cost(
    input_tokens: u64,
    output_tokens: u64,
    cost_per_1k_input: f64,
    cost_per_1k_output: f64,
) -> Result<TokenUsage, ProviderError> {
    compute_cost_with_precision(
        input_tokens,
        output_tokens,
        cost_per_1k_input,
        cost_per_1k_output,
        DEFAULT_COST_DECIMALS,
    )
}

/// Compute token usage and cost, rounded to `decimals` places
///
/// Precision above 15 places is clamped.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
pub fn compute_cost_with_precision(
    input_tokens: u64,
    output_tokens: u64,
    cost_per_1k_input: f64,
    cost_per_1k_output: f64,
    decimals: u32,
) -> Result<TokenUsage, ProviderError> {
    for (field, rate) in [("cost_per_1k_input", cost_per_1k_input), ("cost_per_1k_output", cost_per_1k_output)] {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ProviderError::new(
                ErrorKind::InvalidRequest,
                format!("{field} must be finite and non-negative"),
            )
            .with_context(ErrorContext::new().with("field", field).with("value", rate)));
        }
    }

    let total_tokens = input_tokens
        .checked_add(output_tokens)
        .ok_or_else(|| ProviderError::new(ErrorKind::InvalidRequest, "token count overflow"))?;

    let raw = (input_tokens as f64 / 1000.0).mul_add(
        cost_per_1k_input,
        output_tokens as f64 / 1000.0 * cost_per_1k_output,
    );
    let factor = 10f64.powi(decimals.min(MAX_COST_DECIMALS) as i32);
    let cost = (raw * factor).round() / factor;

    Ok(TokenUsage::new(input_tokens, output_tokens, total_tokens, cost)?)
}
