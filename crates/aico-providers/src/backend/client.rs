//! OpenAI-compatible HTTP backend

use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::StreamExt;
use http::{HeaderMap, StatusCode};
use reqwest::{Client, RequestBuilder};
use secrecy::ExposeSecret;
use url::Url;

use super::{BackendError, BackendModelInfo, BackendRequest, BackendStream, CompletionBackend, catalog};
use crate::protocol::openai::{
    OpenAiErrorDetail, OpenAiErrorResponse, OpenAiRequest, OpenAiResponse, OpenAiStreamChunk, OpenAiStreamOptions,
};

/// Default base URL of a local LiteLLM proxy
pub const LITELLM_BASE_URL: &str = "http://localhost:4000";

/// Default base URL of the `OpenAI` API
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// SSE payload that terminates a stream
const DONE_SENTINEL: &str = "[DONE]";

/// Completion backend speaking the OpenAI chat completions protocol over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a backend whose requests go to `base_url` unless overridden per request
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Build the chat completions URL
    fn completions_url(&self, request: &BackendRequest) -> String {
        let base = request.api_base.as_ref().unwrap_or(&self.base_url);
        format!("{}/chat/completions", base.as_str().trim_end_matches('/'))
    }

    fn post(&self, request: &BackendRequest, body: &OpenAiRequest) -> RequestBuilder {
        let mut builder = self.client.post(self.completions_url(request)).json(body);
        if let Some(key) = &request.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    /// Send the request and classify any non-success status
    async fn send(&self, request: &BackendRequest, body: &OpenAiRequest) -> Result<reqwest::Response, BackendError> {
        let response = self.post(request, body).send().await.map_err(classify_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        tracing::debug!(status = %status, model = %body.model, "backend returned error status");
        Err(classify_status(status, headers, &text))
    }
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    async fn complete(&self, request: &BackendRequest) -> Result<OpenAiResponse, BackendError> {
        let response = self.send(request, &request.body).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Other(format!("failed to parse response: {e}")))
    }

    async fn stream(&self, request: &BackendRequest) -> Result<BackendStream, BackendError> {
        let mut body = request.body.clone();
        body.stream = Some(true);
        body.stream_options = Some(OpenAiStreamOptions { include_usage: true });

        let response = self.send(request, &body).await?;
        let mut events = Box::pin(response.bytes_stream().eventsource());

        Ok(Box::pin(async_stream::stream! {
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        yield Err(classify_stream_error(e));
                        return;
                    }
                };

                let data = event.data.trim();
                if data == DONE_SENTINEL {
                    return;
                }
                if data.is_empty() {
                    continue;
                }

                if let Ok(error) = serde_json::from_str::<OpenAiErrorResponse>(data) {
                    yield Err(classify_error_detail(&error.error));
                    return;
                }

                match serde_json::from_str::<OpenAiStreamChunk>(data) {
                    Ok(chunk) => yield Ok(chunk),
                    Err(e) => tracing::warn!(error = %e, data = %data, "skipping unparseable SSE payload"),
                }
            }
        }))
    }

    fn model_info(&self, model: &str) -> Option<BackendModelInfo> {
        catalog::lookup(model)
    }
}

/// Classify a failure to reach the backend at all
fn classify_transport(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(err.to_string())
    } else if err.is_connect() {
        BackendError::Connection(err.to_string())
    } else {
        BackendError::Other(err.to_string())
    }
}

/// Classify a failure while reading an open SSE body
///
/// The per-request timeout also bounds the body, so an expired deadline
/// surfaces here as a transport error.
fn classify_stream_error(err: EventStreamError<reqwest::Error>) -> BackendError {
    match err {
        EventStreamError::Transport(e) if e.is_timeout() => BackendError::Timeout(format!("stream timed out: {e}")),
        e => BackendError::Connection(format!("stream interrupted: {e}")),
    }
}

/// Classify an error response by status code and body
pub(crate) fn classify_status(status: StatusCode, headers: HeaderMap, body: &str) -> BackendError {
    let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map(|r| r.error).ok();
    let message = match &detail {
        Some(detail) if !detail.message.is_empty() => detail.message.clone(),
        _ if !body.trim().is_empty() => body.trim().to_owned(),
        _ => status.canonical_reason().unwrap_or("unknown error").to_owned(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimit { message, headers },
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNPROCESSABLE_ENTITY => {
            match detail.as_ref().map(classify_error_detail) {
                Some(err @ (BackendError::ContextWindowExceeded(_) | BackendError::ContentPolicyViolation(_))) => err,
                _ if mentions_context_window(&message) => BackendError::ContextWindowExceeded(message),
                _ => BackendError::BadRequest(message),
            }
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => BackendError::Timeout(message),
        StatusCode::SERVICE_UNAVAILABLE => BackendError::ServiceUnavailable(message),
        s if s.is_server_error() => BackendError::InternalServer(message),
        s => BackendError::Other(format!("unexpected status {s}: {message}")),
    }
}

/// Classify an error body by its `type` and `code` alone
///
/// Used for errors delivered inside an SSE stream, where no status applies.
fn classify_error_detail(detail: &OpenAiErrorDetail) -> BackendError {
    let code = detail.code_str().unwrap_or_default();
    let kind = detail.error_type.as_deref().unwrap_or_default();
    let tags = [code.as_str(), kind];
    let has = |needle: &str| tags.iter().any(|tag| tag.contains(needle));
    let message = detail.message.clone();

    if has("context_length") {
        BackendError::ContextWindowExceeded(message)
    } else if has("content_policy") || has("content_filter") {
        BackendError::ContentPolicyViolation(message)
    } else if has("rate_limit") || has("insufficient_quota") {
        BackendError::RateLimit {
            message,
            headers: HeaderMap::new(),
        }
    } else if has("authentication") || has("invalid_api_key") {
        BackendError::Authentication(message)
    } else if has("model_not_found") || has("not_found") {
        BackendError::NotFound(message)
    } else if has("invalid_request") {
        BackendError::BadRequest(message)
    } else {
        BackendError::InternalServer(message)
    }
}

fn mentions_context_window(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("context length") || lower.contains("context window") || lower.contains("maximum context")
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn error_body(message: &str, kind: &str, code: &str) -> String {
        serde_json::json!({"error": {"message": message, "type": kind, "code": code}}).to_string()
    }

    #[test]
    fn auth_statuses() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = classify_status(status, HeaderMap::new(), "");
            assert!(matches!(err, BackendError::Authentication(_)));
        }
    }

    #[test]
    fn rate_limit_keeps_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, headers, "slow down");
        let BackendError::RateLimit { message, headers } = err else {
            panic!("expected rate limit, got {err:?}");
        };
        assert_eq!(message, "slow down");
        assert_eq!(headers.get("retry-after").unwrap(), "30");
    }

    #[test]
    fn bad_request_split_by_code() {
        let body = error_body("too long", "invalid_request_error", "context_length_exceeded");
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, HeaderMap::new(), &body),
            BackendError::ContextWindowExceeded(_)
        ));

        let body = error_body("blocked", "invalid_request_error", "content_policy_violation");
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, HeaderMap::new(), &body),
            BackendError::ContentPolicyViolation(_)
        ));

        let body = error_body("bad temperature", "invalid_request_error", "invalid_value");
        let err = classify_status(StatusCode::BAD_REQUEST, HeaderMap::new(), &body);
        let BackendError::BadRequest(message) = err else {
            panic!("expected bad request, got {err:?}");
        };
        assert_eq!(message, "bad temperature");
    }

    #[test]
    fn context_window_from_plain_message() {
        let err = classify_status(
            StatusCode::BAD_REQUEST,
            HeaderMap::new(),
            "This model's maximum context length is 8192 tokens",
        );
        assert!(matches!(err, BackendError::ContextWindowExceeded(_)));
    }

    #[test]
    fn server_side_statuses() {
        let cases = [
            (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            (StatusCode::REQUEST_TIMEOUT, "timeout"),
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            (StatusCode::BAD_GATEWAY, "internal"),
        ];
        for (status, expected) in cases {
            let err = classify_status(status, HeaderMap::new(), "");
            let actual = match err {
                BackendError::Timeout(_) => "timeout",
                BackendError::ServiceUnavailable(_) => "unavailable",
                BackendError::InternalServer(_) => "internal",
                other => panic!("unexpected {other:?}"),
            };
            assert_eq!(actual, expected, "{status}");
        }
    }

    #[test]
    fn empty_body_uses_status_reason() {
        let err = classify_status(StatusCode::NOT_FOUND, HeaderMap::new(), "");
        let BackendError::NotFound(message) = err else {
            panic!("expected not found");
        };
        assert_eq!(message, "Not Found");
    }

    #[test]
    fn unexpected_status_is_other() {
        let err = classify_status(StatusCode::IM_A_TEAPOT, HeaderMap::new(), "teapot");
        assert!(matches!(err, BackendError::Other(_)));
    }

    #[test]
    fn undecodable_stream_is_connection() {
        let Err(utf8) = String::from_utf8(vec![0xff, 0xfe]) else {
            panic!("bytes must be invalid UTF-8");
        };
        let err = classify_stream_error(EventStreamError::Utf8(utf8));
        assert!(matches!(err, BackendError::Connection(_)));
    }

    #[test]
    fn stream_error_detail_classified() {
        let detail = OpenAiErrorDetail {
            message: "quota".into(),
            error_type: Some("rate_limit_error".into()),
            ..OpenAiErrorDetail::default()
        };
        assert!(matches!(classify_error_detail(&detail), BackendError::RateLimit { .. }));

        let detail = OpenAiErrorDetail {
            message: "boom".into(),
            ..OpenAiErrorDetail::default()
        };
        assert!(matches!(classify_error_detail(&detail), BackendError::InternalServer(_)));
    }

    #[test]
    fn completions_url_prefers_request_base() {
        let backend = HttpBackend::new(Url::parse(LITELLM_BASE_URL).unwrap());
        let mut request = BackendRequest {
            body: OpenAiRequest::default(),
            api_key: None,
            api_base: None,
            timeout: None,
        };
        assert_eq!(backend.completions_url(&request), "http://localhost:4000/chat/completions");

        request.api_base = Some(Url::parse("https://proxy.example.com/v1/").unwrap());
        assert_eq!(backend.completions_url(&request), "https://proxy.example.com/v1/chat/completions");
    }
}
