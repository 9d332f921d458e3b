use crate::error::CompletionError;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// One request to the completion endpoint, built fresh per command.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Synchronous completion seam used by the dispatcher.
pub trait Completer {
    fn complete(&self, request: &CompletionRequest, api_key: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_completion_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

impl<'a> ChatMessage<'a> {
    fn text(role: &'a str, text: &'a str) -> Self {
        Self {
            role,
            content: [TextPart { kind: "text", text }],
        }
    }
}

impl<'a> From<&'a CompletionRequest> for ChatRequest<'a> {
    fn from(req: &'a CompletionRequest) -> Self {
        Self {
            model: &req.model,
            messages: [
                ChatMessage::text("assistant", &req.system_prompt),
                ChatMessage::text("user", &req.user_prompt),
            ],
            max_completion_tokens: req.max_tokens,
            temperature: req.temperature,
        }
    }
}

/// Async client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
        api_key: &str,
    ) -> Result<String, CompletionError> {
        tracing::info!(
            model = %request.model,
            max_tokens = request.max_tokens,
            temperature = request.temperature,
            prompt_chars = request.user_prompt.chars().count(),
            "sending completion request"
        );

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&ChatRequest::from(request))
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;
        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "completion endpoint returned an error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let out = extract_content(&body)?;
        tracing::info!(chars = out.chars().count(), "completion received");
        Ok(out)
    }
}

fn transport(e: reqwest::Error) -> CompletionError {
    let msg = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    };
    tracing::warn!(error = %msg, "completion request failed");
    CompletionError::Transport(msg)
}

/// Trimmed `choices[0].message.content` of a chat-completions response.
fn extract_content(body: &str) -> Result<String, CompletionError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| CompletionError::Parse(e.to_string()))?;
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| CompletionError::Parse("missing choices[0].message.content".into()))
}

/// Blocks the calling thread on an owned runtime for each request.
pub struct BlockingClient {
    inner: OpenAiClient,
    rt: tokio::runtime::Runtime,
}

impl BlockingClient {
    pub fn new(inner: OpenAiClient) -> Result<Self, CompletionError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        Ok(Self { inner, rt })
    }
}

impl Completer for BlockingClient {
    fn complete(&self, request: &CompletionRequest, api_key: &str) -> Result<String, CompletionError> {
        self.rt.block_on(self.inner.complete(request, api_key))
    }
}
