//! Failure taxonomy shared by every provider adapter
//!
//! Every backend failure is classified into one of a small set of kinds, each
//! statically retryable or not. Errors carry a message and an immutable
//! context map whose sensitive entries are redacted whenever the error is
//! rendered, through either `Display` or `Debug`.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::types::ValidationError;

/// Replacement rendered in place of sensitive context values
pub const REDACTED: &str = "***";

/// Context keys whose values are never rendered
const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "secret",
    "token",
    "api_key",
    "api_secret",
    "authorization",
    "credential",
];

/// Whether a context key names a secret (case-insensitive)
pub fn is_sensitive_key(key: &str) -> bool {
    let folded = key.to_lowercase();
    SENSITIVE_KEYS.contains(&folded.as_str())
}

/// Immutable diagnostic metadata attached to an error
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ErrorContext(BTreeMap<String, String>);

impl ErrorContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this context with one more entry
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    /// Raw value for `key`
    ///
    /// This is the only accessor that exposes unredacted values.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the context has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries with sensitive values replaced by [`REDACTED`]
    pub fn redacted(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| {
            let shown = if is_sensitive_key(key) { REDACTED } else { value.as_str() };
            (key.as_str(), shown)
        })
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for ErrorContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |ctx, (key, value)| ctx.with(key, value))
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.redacted().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}='{value}'")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.redacted()).finish()
    }
}

/// Message and context carried by every taxonomy variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    message: String,
    context: ErrorContext,
}

impl ErrorDetail {
    /// Create a detail with an empty context
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    /// Human-readable description
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attached metadata
    pub const fn context(&self) -> &ErrorContext {
        &self.context
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} ({})", self.message, self.context)
        }
    }
}

/// Field-less discriminant of [`ProviderError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid or missing credentials
    Authentication,
    /// Backend rate limit exceeded
    RateLimit,
    /// Requested model is not configured or not served
    ModelNotFound,
    /// Malformed request (bad parameters, context window exceeded, ...)
    InvalidRequest,
    /// Request or response blocked by a content policy
    ContentFilter,
    /// Backend did not answer in time
    Timeout,
    /// Network-level failure reaching the backend
    Connection,
    /// Backend-side failure or backend contract violation
    Internal,
}

impl ErrorKind {
    /// Whether the same request may succeed if attempted again
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimit | Self::Timeout | Self::Connection | Self::Internal)
    }
}

/// Errors surfaced across the provider boundary
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Invalid or missing credentials
    #[error("{0}")]
    Authentication(ErrorDetail),

    /// Backend rate limit exceeded
    #[error("{detail}")]
    RateLimit {
        /// Message and context
        detail: ErrorDetail,
        /// Seconds to wait before retrying, when the backend said so
        retry_after: Option<f64>,
    },

    /// Requested model is not configured or not served
    #[error("{0}")]
    ModelNotFound(ErrorDetail),

    /// Malformed request
    #[error("{0}")]
    InvalidRequest(ErrorDetail),

    /// Blocked by a content policy
    #[error("{0}")]
    ContentFilter(ErrorDetail),

    /// Backend did not answer in time
    #[error("{0}")]
    Timeout(ErrorDetail),

    /// Network-level failure
    #[error("{0}")]
    Connection(ErrorDetail),

    /// Backend-side failure or contract violation
    #[error("{0}")]
    Internal(ErrorDetail),
}

impl ProviderError {
    /// Create an error of the given kind with an empty context
    ///
    /// `ErrorKind::RateLimit` produces an error without `retry_after`; use
    /// [`ProviderError::rate_limit`] to attach one.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let detail = ErrorDetail::new(message);
        match kind {
            ErrorKind::Authentication => Self::Authentication(detail),
            ErrorKind::RateLimit => Self::RateLimit {
                detail,
                retry_after: None,
            },
            ErrorKind::ModelNotFound => Self::ModelNotFound(detail),
            ErrorKind::InvalidRequest => Self::InvalidRequest(detail),
            ErrorKind::ContentFilter => Self::ContentFilter(detail),
            ErrorKind::Timeout => Self::Timeout(detail),
            ErrorKind::Connection => Self::Connection(detail),
            ErrorKind::Internal => Self::Internal(detail),
        }
    }

    /// Create a rate-limit error
    ///
    /// A `retry_after` that is negative or not finite is discarded.
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<f64>) -> Self {
        Self::RateLimit {
            detail: ErrorDetail::new(message),
            retry_after: retry_after.filter(|secs| secs.is_finite() && *secs >= 0.0),
        }
    }

    /// Replace the context map
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.detail_mut().context = context;
        self
    }

    /// Taxonomy kind of this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::ModelNotFound(_) => ErrorKind::ModelNotFound,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::ContentFilter(_) => ErrorKind::ContentFilter,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller may retry the request
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Seconds to wait before retrying, only ever set on `RateLimit`
    pub const fn retry_after(&self) -> Option<f64> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Message and context
    pub const fn detail(&self) -> &ErrorDetail {
        match self {
            Self::RateLimit { detail, .. }
            | Self::Authentication(detail)
            | Self::ModelNotFound(detail)
            | Self::InvalidRequest(detail)
            | Self::ContentFilter(detail)
            | Self::Timeout(detail)
            | Self::Connection(detail)
            | Self::Internal(detail) => detail,
        }
    }

    /// Human-readable description without context
    pub fn message(&self) -> &str {
        self.detail().message()
    }

    /// Attached metadata
    pub const fn context(&self) -> &ErrorContext {
        self.detail().context()
    }

    fn detail_mut(&mut self) -> &mut ErrorDetail {
        match self {
            Self::RateLimit { detail, .. }
            | Self::Authentication(detail)
            | Self::ModelNotFound(detail)
            | Self::InvalidRequest(detail)
            | Self::ContentFilter(detail)
            | Self::Timeout(detail)
            | Self::Connection(detail)
            | Self::Internal(detail) => detail,
        }
    }
}

impl From<ValidationError> for ProviderError {
    fn from(err: ValidationError) -> Self {
        let context = ErrorContext::new().with("field", err.field());
        Self::new(ErrorKind::InvalidRequest, err.to_string()).with_context(context)
    }
}
