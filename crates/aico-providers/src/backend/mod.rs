//! Seam between adapters and the completion service they call

mod catalog;
mod client;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::Stream;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

pub use self::catalog::lookup as catalog_model_info;
pub use self::client::{HttpBackend, LITELLM_BASE_URL, OPENAI_BASE_URL};
use crate::error::ProviderError;
use crate::protocol::openai::{OpenAiRequest, OpenAiResponse, OpenAiStreamChunk};

/// Raw chunks produced by a backend stream
pub type BackendStream = Pin<Box<dyn Stream<Item = Result<OpenAiStreamChunk, BackendError>> + Send>>;

/// One call against a completion backend
#[derive(Debug, Clone)]
pub struct BackendRequest {
    /// OpenAI-compatible request body
    pub body: OpenAiRequest,
    /// Credential sent as a bearer token
    pub api_key: Option<SecretString>,
    /// Overrides the backend's default base URL
    pub api_base: Option<Url>,
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

/// Static metadata a backend knows about a model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendModelInfo {
    /// Largest completion the model generates
    pub max_output_tokens: Option<u32>,
    /// Legacy single token limit, used when `max_output_tokens` is absent
    pub max_tokens: Option<u32>,
    pub supports_function_calling: bool,
    pub supports_vision: bool,
    pub supports_system_messages: bool,
}

/// Failure categories a backend may report
///
/// Adapters translate these into [`ProviderError`] before they leave the
/// adapter.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Rate limited; `headers` are the response headers, if any
    #[error("rate limited: {message}")]
    RateLimit { message: String, headers: http::HeaderMap },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("context window exceeded: {0}")]
    ContextWindowExceeded(String),

    #[error("content policy violation: {0}")]
    ContentPolicyViolation(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("internal server error: {0}")]
    InternalServer(String),

    #[error("connection failed: {0}")]
    Connection(String),

    /// Already classified, passed through unchanged
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Anything the backend could not classify
    #[error("{0}")]
    Other(String),
}

/// A multi-provider completion service
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run a non-streaming completion
    async fn complete(&self, request: &BackendRequest) -> Result<OpenAiResponse, BackendError>;

    /// Open a streaming completion
    async fn stream(&self, request: &BackendRequest) -> Result<BackendStream, BackendError>;

    /// Static metadata for `model`, if the backend knows it
    fn model_info(&self, model: &str) -> Option<BackendModelInfo>;
}
