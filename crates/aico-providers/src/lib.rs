//! Backend-agnostic completion providers
//!
//! Normalizes requests, responses, streaming events, capabilities, cost
//! accounting, and failures across completion backends. Callers obtain a
//! [`CompletionProvider`] from the [`ProviderRegistry`] by provider name and
//! issue `complete`, `stream`, or `get_capabilities` against it.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod backend;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod registry;
pub mod types;

pub use backend::{BackendError, BackendModelInfo, BackendRequest, BackendStream, CompletionBackend, HttpBackend};
pub use driver::{BackendDriver, ModelNaming, map_backend_error};
pub use error::{ErrorContext, ErrorDetail, ErrorKind, ProviderError};
pub use provider::{ChunkStream, CompletionProvider, compute_cost, compute_cost_with_precision, validate_request};
pub use registry::{DriverFactory, LITELLM_DRIVER, OPENAI_DRIVER, ProviderRegistry, RegistryError};
pub use types::{
    ChatMessage, CompletionConfig, CompletionResponse, FinishReason, ModelCapabilities, ModelCapabilitiesBuilder, Role,
    StreamChunk, StreamChunkParts, StreamEventType, TokenUsage, ToolCall, ToolDefinition, ToolResult, ValidationError,
};
