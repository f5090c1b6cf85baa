//! Mock OpenAI-compatible completion backend
//!
//! Serves canned completions and SSE streams on an ephemeral port, or fails
//! every request with a configured status, and records what it received.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aico_providers::protocol::openai::{
    OpenAiChoice, OpenAiChoiceMessage, OpenAiFunctionCall, OpenAiRequest, OpenAiResponse, OpenAiStreamChoice,
    OpenAiStreamChunk, OpenAiStreamDelta, OpenAiStreamFunctionCall, OpenAiStreamToolCall, OpenAiToolCall, OpenAiUsage,
};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

/// Text returned when no custom content is configured
pub const DEFAULT_CONTENT: &str = "Hello from mock LLM";

/// Usage reported by every successful response
pub const USAGE: OpenAiUsage = OpenAiUsage {
    prompt_tokens: 1000,
    completion_tokens: 500,
    total_tokens: 1500,
};

/// How the mock answers chat completion requests
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer with content, or a tool call when tools were offered
    Reply { content: String },
    /// Fail every request with `status` and an OpenAI-style error body
    Fail {
        status: StatusCode,
        code: Option<&'static str>,
        retry_after: Option<&'static str>,
    },
    /// Stream one content chunk, then an in-band error payload
    StreamError,
    /// Stream one content chunk, then hold the body open for `delay`
    Stall { delay: Duration },
}

/// Mock completion backend
pub struct MockLlm {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockLlmState>,
}

struct MockLlmState {
    behavior: Behavior,
    completion_count: AtomicU32,
    last_request: Mutex<Option<OpenAiRequest>>,
    last_authorization: Mutex<Option<String>>,
}

impl MockLlm {
    /// Start a mock answering with [`DEFAULT_CONTENT`]
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Behavior::Reply {
            content: DEFAULT_CONTENT.to_owned(),
        })
        .await
    }

    /// Start a mock answering with `content`
    pub async fn start_with_response(content: &str) -> anyhow::Result<Self> {
        Self::start_with(Behavior::Reply {
            content: content.to_owned(),
        })
        .await
    }

    /// Start a mock failing every request with `status`
    pub async fn start_failing(status: StatusCode) -> anyhow::Result<Self> {
        Self::start_with(Behavior::Fail {
            status,
            code: None,
            retry_after: None,
        })
        .await
    }

    pub async fn start_with(behavior: Behavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockLlmState {
            behavior,
            completion_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
            last_authorization: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    ///
    /// Includes `/v1` since the backend appends `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of completion requests received
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// Body of the most recent request
    pub fn last_request(&self) -> Option<OpenAiRequest> {
        self.state.last_request.lock().unwrap().clone()
    }

    /// `Authorization` header of the most recent request
    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

impl Drop for MockLlm {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Handlers --

async fn handle_chat_completions(
    State(state): State<Arc<MockLlmState>>,
    headers: HeaderMap,
    Json(req): Json<OpenAiRequest>,
) -> Response {
    state.completion_count.fetch_add(1, Ordering::Relaxed);
    *state.last_authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *state.last_request.lock().unwrap() = Some(req.clone());

    match &state.behavior {
        Behavior::Fail {
            status,
            code,
            retry_after,
        } => error_response(*status, *code, *retry_after),
        Behavior::StreamError => sse(&[content_chunk(&req.model, "partial ")], Some(stream_error_payload())),
        Behavior::Stall { delay } => stalled_sse(&content_chunk(&req.model, "partial "), *delay),
        Behavior::Reply { content } if req.stream.unwrap_or(false) => streaming_response(&req, content),
        Behavior::Reply { content } => Json(completion_response(&req, content)).into_response(),
    }
}

fn error_response(status: StatusCode, code: Option<&str>, retry_after: Option<&'static str>) -> Response {
    let body = serde_json::json!({
        "error": {
            "message": format!("mock failure with status {}", status.as_u16()),
            "type": "mock_error",
            "code": code,
        }
    });
    let mut response = (status, Json(body)).into_response();
    if let Some(retry_after) = retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, header::HeaderValue::from_static(retry_after));
    }
    response
}

fn completion_response(req: &OpenAiRequest, content: &str) -> OpenAiResponse {
    let (content, tool_calls, finish_reason) = if req.tools.is_some() {
        (
            None,
            Some(vec![OpenAiToolCall {
                id: "call_test_123".to_owned(),
                tool_type: "function".to_owned(),
                function: OpenAiFunctionCall {
                    name: "get_weather".to_owned(),
                    arguments: r#"{"location":"San Francisco"}"#.to_owned(),
                },
            }]),
            "tool_calls",
        )
    } else {
        (Some(content.to_owned()), None, "stop")
    };

    OpenAiResponse {
        id: Some("chatcmpl-test-123".to_owned()),
        model: req.model.clone(),
        choices: vec![OpenAiChoice {
            index: 0,
            message: OpenAiChoiceMessage {
                role: Some("assistant".to_owned()),
                content,
                tool_calls,
            },
            finish_reason: Some(finish_reason.to_owned()),
        }],
        usage: Some(USAGE),
    }
}

fn streaming_response(req: &OpenAiRequest, content: &str) -> Response {
    let mut chunks = Vec::new();

    if req.tools.is_some() {
        // Arguments split mid-token across fragments
        chunks.push(tool_chunk(&req.model, Some("call_test_stream"), Some("get_weather"), r#"{"loca"#));
        chunks.push(tool_chunk(&req.model, None, None, r#"tion":"San "#));
        chunks.push(tool_chunk(&req.model, None, None, r#"Francisco"}"#));
        chunks.push(finish_chunk(&req.model, "tool_calls"));
    } else {
        for word in content.split_inclusive(' ') {
            chunks.push(content_chunk(&req.model, word));
        }
        chunks.push(finish_chunk(&req.model, "stop"));
    }

    let include_usage = req.stream_options.as_ref().is_some_and(|o| o.include_usage);
    if include_usage {
        chunks.push(OpenAiStreamChunk {
            id: Some("chatcmpl-test-stream".to_owned()),
            model: req.model.clone(),
            choices: vec![],
            usage: Some(USAGE),
        });
    }

    sse(&chunks, Some("[DONE]".to_owned()))
}

fn sse(chunks: &[OpenAiStreamChunk], trailer: Option<String>) -> Response {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str(&format!("data: {}\n\n", serde_json::to_string(chunk).unwrap()));
    }
    if let Some(trailer) = trailer {
        body.push_str(&format!("data: {trailer}\n\n"));
    }
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

fn stalled_sse(first: &OpenAiStreamChunk, delay: Duration) -> Response {
    let first = format!("data: {}\n\n", serde_json::to_string(first).unwrap());
    let rest = futures_util::stream::once(async move {
        tokio::time::sleep(delay).await;
        Ok::<_, std::io::Error>("data: [DONE]\n\n".to_owned())
    });
    let body = futures_util::stream::once(async move { Ok(first) }).chain(rest);

    ([(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(body)).into_response()
}

fn stream_error_payload() -> String {
    serde_json::json!({"error": {"message": "upstream exploded", "type": "server_error"}}).to_string()
}

fn stream_chunk(model: &str, delta: OpenAiStreamDelta, finish_reason: Option<&str>) -> OpenAiStreamChunk {
    OpenAiStreamChunk {
        id: Some("chatcmpl-test-stream".to_owned()),
        model: model.to_owned(),
        choices: vec![OpenAiStreamChoice {
            index: 0,
            delta,
            finish_reason: finish_reason.map(str::to_owned),
        }],
        usage: None,
    }
}

fn content_chunk(model: &str, text: &str) -> OpenAiStreamChunk {
    let delta = OpenAiStreamDelta {
        content: Some(text.to_owned()),
        ..OpenAiStreamDelta::default()
    };
    stream_chunk(model, delta, None)
}

fn tool_chunk(model: &str, id: Option<&str>, name: Option<&str>, arguments: &str) -> OpenAiStreamChunk {
    let delta = OpenAiStreamDelta {
        tool_calls: Some(vec![OpenAiStreamToolCall {
            index: 0,
            id: id.map(str::to_owned),
            tool_type: id.map(|_| "function".to_owned()),
            function: Some(OpenAiStreamFunctionCall {
                name: name.map(str::to_owned),
                arguments: Some(arguments.to_owned()),
            }),
        }]),
        ..OpenAiStreamDelta::default()
    };
    stream_chunk(model, delta, None)
}

fn finish_chunk(model: &str, reason: &str) -> OpenAiStreamChunk {
    stream_chunk(model, OpenAiStreamDelta::default(), Some(reason))
}
