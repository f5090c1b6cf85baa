//! Adapter implementing the provider contract over a [`CompletionBackend`]
//!
//! The driver owns model-alias resolution, request construction, response
//! and stream mapping, and translation of backend failures into the provider
//! error taxonomy.

mod accumulator;
mod convert;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use aico_config::{ProviderConfig, ProviderModelConfig};
use async_trait::async_trait;
use futures_util::StreamExt;
use secrecy::SecretString;
use url::Url;

pub use self::accumulator::ToolCallAccumulator;
use crate::backend::{BackendError, BackendRequest, BackendStream, CompletionBackend};
use crate::error::{ErrorContext, ErrorKind, ProviderError};
use crate::protocol::openai::{OpenAiRequest, OpenAiResponse, OpenAiUsage};
use crate::provider::{ChunkStream, CompletionProvider, compute_cost_with_precision};
use crate::types::{
    ChatMessage, CompletionConfig, CompletionResponse, ModelCapabilities, StreamChunk, TokenUsage, ToolDefinition,
};

/// Output limit assumed when the backend has no metadata for a model
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// How a configured model id is named in backend requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelNaming {
    /// `"{provider}/{model_id}"`, as LiteLLM routes
    #[default]
    ProviderPrefixed,
    /// The model id unchanged
    Bare,
}

/// Provider adapter translating the wire model to and from a completion backend
pub struct BackendDriver {
    provider: String,
    api_key: Option<SecretString>,
    base_url: Option<Url>,
    cost_decimals: u32,
    models: Vec<ProviderModelConfig>,
    /// Model ids and aliases to their index in `models`
    lookup: HashMap<String, usize>,
    naming: ModelNaming,
    backend: Arc<dyn CompletionBackend>,
}

impl BackendDriver {
    /// Create a driver for `provider`
    ///
    /// Fails with `InvalidRequest` when two models share an id or when an
    /// alias collides with another model's id or alias.
    pub fn new(
        provider: impl Into<String>,
        config: &ProviderConfig,
        backend: Arc<dyn CompletionBackend>,
        naming: ModelNaming,
    ) -> Result<Self, ProviderError> {
        let provider = provider.into();
        let lookup = build_lookup(&provider, &config.models)?;

        Ok(Self {
            provider,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            cost_decimals: config.cost_decimals,
            models: config.models.clone(),
            lookup,
            naming,
            backend,
        })
    }

    /// Find the configured model for an id or alias
    pub fn resolve_model(&self, model: &str) -> Result<&ProviderModelConfig, ProviderError> {
        self.lookup.get(model).map(|&index| &self.models[index]).ok_or_else(|| {
            ProviderError::new(
                ErrorKind::ModelNotFound,
                format!("model '{model}' is not configured for provider '{}'", self.provider),
            )
            .with_context(self.context().with("model", model))
        })
    }

    /// Model name sent to the backend
    fn routed_model(&self, model: &ProviderModelConfig) -> String {
        match self.naming {
            ModelNaming::ProviderPrefixed => format!("{}/{}", self.provider, model.id),
            ModelNaming::Bare => model.id.clone(),
        }
    }

    fn backend_request(&self, body: OpenAiRequest, config: &CompletionConfig) -> BackendRequest {
        BackendRequest {
            body,
            api_key: self.api_key.clone(),
            api_base: self.base_url.clone(),
            timeout: config.timeout(),
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new().with("provider", &self.provider)
    }

    fn pricing(&self, model: &ProviderModelConfig, requested: &str) -> Pricing {
        Pricing {
            provider: self.provider.clone(),
            model: requested.to_owned(),
            cost_per_1k_input: model.cost_per_1k_input,
            cost_per_1k_output: model.cost_per_1k_output,
            decimals: self.cost_decimals,
        }
    }

    /// Map a non-streaming backend response into a [`CompletionResponse`]
    ///
    /// The response names the configured model id, not whatever dated or
    /// routed name the backend reports.
    fn map_response(
        &self,
        response: OpenAiResponse,
        model: &ProviderModelConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let OpenAiResponse {
            id,
            model: _,
            choices,
            usage,
        } = response;

        let Some(choice) = choices.into_iter().next() else {
            return Err(ProviderError::new(ErrorKind::Internal, "backend returned a response with no choices")
                .with_context(self.context().with("model", &model.id)));
        };

        let tool_calls = choice.message.tool_calls.map(convert::extract_tool_calls).unwrap_or_default();
        let finish_reason = convert::parse_finish_reason(choice.finish_reason.as_deref());
        let usage = self.pricing(model, &model.id).usage(usage.unwrap_or_default())?;

        CompletionResponse::new(choice.message.content, tool_calls, finish_reason, usage, model.id.clone(), id).map_err(
            |e| {
                ProviderError::new(ErrorKind::Internal, format!("backend response is malformed: {e}"))
                    .with_context(self.context().with("model", &model.id))
            },
        )
    }
}

fn build_lookup(provider: &str, models: &[ProviderModelConfig]) -> Result<HashMap<String, usize>, ProviderError> {
    let collision = |message: String, name: &str| {
        ProviderError::new(ErrorKind::InvalidRequest, message)
            .with_context(ErrorContext::new().with("provider", provider).with("model", name))
    };

    let mut lookup = HashMap::with_capacity(models.len() * 2);
    for (index, model) in models.iter().enumerate() {
        if lookup.insert(model.id.clone(), index).is_some() {
            return Err(collision(format!("duplicate model id '{}'", model.id), &model.id));
        }
    }

    for (index, model) in models.iter().enumerate() {
        let Some(alias) = &model.alias else { continue };
        match lookup.entry(alias.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
            Entry::Occupied(slot) if *slot.get() == index => {}
            Entry::Occupied(slot) => {
                let other = &models[*slot.get()].id;
                return Err(collision(
                    format!("alias '{alias}' of model '{}' collides with model '{other}'", model.id),
                    &model.id,
                ));
            }
        }
    }

    Ok(lookup)
}

/// Owned cost settings and error context carried into a stream
#[derive(Debug, Clone)]
struct Pricing {
    provider: String,
    model: String,
    cost_per_1k_input: f64,
    cost_per_1k_output: f64,
    decimals: u32,
}

impl Pricing {
    fn usage(&self, usage: OpenAiUsage) -> Result<TokenUsage, ProviderError> {
        compute_cost_with_precision(
            usage.prompt_tokens,
            usage.completion_tokens,
            self.cost_per_1k_input,
            self.cost_per_1k_output,
            self.decimals,
        )
    }
}

/// Translate a backend failure into the provider error taxonomy
///
/// `model` is the name the caller requested. Errors that are already
/// classified pass through unchanged.
pub fn map_backend_error(provider: &str, model: &str, err: BackendError) -> ProviderError {
    if !matches!(err, BackendError::Provider(_)) {
        tracing::error!(provider = %provider, model = %model, error = %err, "backend request failed");
    }

    let mapped = match err {
        BackendError::Provider(err) => return err,
        BackendError::Authentication(message) => ProviderError::new(ErrorKind::Authentication, message),
        BackendError::RateLimit { message, headers } => {
            ProviderError::rate_limit(message, retry_after(&headers))
        }
        BackendError::NotFound(message) => ProviderError::new(ErrorKind::ModelNotFound, message),
        BackendError::ContextWindowExceeded(message) | BackendError::BadRequest(message) => {
            ProviderError::new(ErrorKind::InvalidRequest, message)
        }
        BackendError::ContentPolicyViolation(message) => ProviderError::new(ErrorKind::ContentFilter, message),
        BackendError::Timeout(message) => ProviderError::new(ErrorKind::Timeout, message),
        BackendError::Connection(message) => ProviderError::new(ErrorKind::Connection, message),
        BackendError::ServiceUnavailable(message) | BackendError::InternalServer(message) => {
            ProviderError::new(ErrorKind::Internal, message)
        }
        BackendError::Other(message) => ProviderError::new(
            ErrorKind::Internal,
            format!("unexpected error from backend driver for provider '{provider}': {message}"),
        ),
    };

    mapped.with_context(ErrorContext::new().with("provider", provider).with("model", model))
}

/// Seconds from a `retry-after` header, if present and numeric
fn retry_after(headers: &http::HeaderMap) -> Option<f64> {
    headers
        .get(http::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
}

/// Turn raw backend chunks into [`StreamChunk`]s
///
/// Text and usage are forwarded as they arrive; tool calls are assembled and
/// emitted after the backend stream ends, followed by a single `Done`.
fn map_stream(mut raw: BackendStream, pricing: Pricing) -> ChunkStream {
    Box::pin(async_stream::stream! {
        let mut accumulator = ToolCallAccumulator::new();

        while let Some(chunk) = raw.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(map_backend_error(&pricing.provider, &pricing.model, e));
                    return;
                }
            };

            if let Some(choice) = chunk.choices.first() {
                if let Some(text) = choice.delta.content.as_deref().filter(|text| !text.is_empty()) {
                    yield Ok(StreamChunk::content(text));
                }
                for fragment in choice.delta.tool_calls.iter().flatten() {
                    accumulator.push(fragment);
                }
            }

            if let Some(usage) = chunk.usage {
                match pricing.usage(usage) {
                    Ok(usage) => yield Ok(StreamChunk::usage(usage)),
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        for call in accumulator.finish() {
            yield Ok(StreamChunk::tool_call(call));
        }
        yield Ok(StreamChunk::Done);
    })
}

#[async_trait]
impl CompletionProvider for BackendDriver {
    fn name(&self) -> &str {
        &self.provider
    }

    async fn do_complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: &[ToolDefinition],
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let model_config = self.resolve_model(model)?;
        let body = convert::build_request(self.routed_model(model_config), messages, tools, config);
        let request = self.backend_request(body, config);

        tracing::debug!(provider = %self.provider, model = %request.body.model, "dispatching completion");

        let response = self
            .backend
            .complete(&request)
            .await
            .map_err(|e| map_backend_error(&self.provider, model, e))?;

        self.map_response(response, model_config)
    }

    async fn do_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: &[ToolDefinition],
        config: &CompletionConfig,
    ) -> Result<ChunkStream, ProviderError> {
        let model_config = self.resolve_model(model)?;
        let body = convert::build_request(self.routed_model(model_config), messages, tools, config);
        let request = self.backend_request(body, config);

        tracing::debug!(provider = %self.provider, model = %request.body.model, "opening completion stream");

        let raw = self
            .backend
            .stream(&request)
            .await
            .map_err(|e| map_backend_error(&self.provider, model, e))?;

        Ok(map_stream(raw, self.pricing(model_config, model)))
    }

    async fn do_get_capabilities(&self, model: &str) -> Result<ModelCapabilities, ProviderError> {
        let model_config = self.resolve_model(model)?;
        let info = self.backend.model_info(&self.routed_model(model_config));

        // Metadata may claim more than the configured window allows
        let max_output = info
            .and_then(|info| info.max_output_tokens.or(info.max_tokens))
            .filter(|&tokens| tokens > 0)
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS)
            .min(model_config.max_context);

        let tools = info.is_some_and(|info| info.supports_function_calling);

        Ok(ModelCapabilities::builder(
            model_config.id.clone(),
            self.provider.clone(),
            model_config.max_context,
            max_output,
        )
        .tools(tools)
        .vision(info.is_some_and(|info| info.supports_vision))
        .streaming(true)
        .streaming_tool_calls(tools)
        .system_messages(info.is_none_or(|info| info.supports_system_messages))
        .costs(model_config.cost_per_1k_input, model_config.cost_per_1k_output)
        .build()?)
    }
}
