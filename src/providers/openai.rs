use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::sse::{SseEvent, decode_stream};
use crate::providers::{CompletionRequest, DeltaStream, Provider, status_error, transport_error};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Client for OpenAI-compatible chat completion APIs
///
/// Also used for LM Studio and other local servers exposing `/v1/chat/completions`.
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key; local servers accept an empty key
    api_key: String,
    /// Base URL including the `/v1` suffix
    endpoint: String,
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAI")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender
    pub role: String,
    /// Content of the message; `null` for refusals and tool calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    pub choices: Vec<OpenAIChoice>,
}

/// A single generated choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// The generated message
    pub message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    message: String,
}

impl OpenAIRequest {
    fn from_completion(request: CompletionRequest, stream: bool) -> Self {
        Self {
            model: request.model,
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: Some(request.prompt),
            }],
            max_tokens: request.max_tokens,
            stream: stream.then_some(true),
        }
    }
}

impl OpenAI {
    /// Create a new client; an empty endpoint means the public OpenAI API
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Chat completions URL for the configured endpoint
    pub fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/chat/completions", base)
    }

    async fn send(&self, request: &OpenAIRequest) -> Result<reqwest::Response, ProviderError> {
        let mut builder = self.client.post(self.api_url()).json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI-compatible API error ({}): {}", status, error_text);
            return Err(status_error(status.as_u16(), error_text));
        }

        Ok(response)
    }

    /// Extract text from a chat completion response
    pub fn extract_text_from_response(response: &OpenAIResponse) -> Result<String, ProviderError> {
        response
            .choices
            .first()
            .map(|choice| choice.message.content.clone().unwrap_or_default())
            .ok_or_else(|| ProviderError::ParseError("empty choices".to_string()))
    }

    /// Map one streaming chunk to a text delta, an error, or nothing
    pub fn parse_stream_event(event: &SseEvent) -> Option<Result<String, ProviderError>> {
        if event.data.trim() == "[DONE]" {
            return None;
        }

        match serde_json::from_str::<ChunkPayload>(&event.data) {
            Ok(ChunkPayload { error: Some(err), .. }) => Some(Err(ProviderError::StreamError(
                match err.error_type {
                    Some(error_type) => format!("{}: {}", error_type, err.message),
                    None => err.message,
                },
            ))),
            Ok(payload) => payload
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|content| !content.is_empty())
                .map(Ok),
            Err(e) => {
                debug!("Skipping unparsable chat completion chunk: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let response = self
            .send(&OpenAIRequest::from_completion(request, false))
            .await?;

        let parsed = response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse chat completion response: {}", e)))?;

        Self::extract_text_from_response(&parsed)
    }

    async fn stream(&self, request: CompletionRequest) -> Result<DeltaStream, ProviderError> {
        let response = self
            .send(&OpenAIRequest::from_completion(request, true))
            .await?;

        Ok(decode_stream(response.bytes_stream(), Self::parse_stream_event))
    }
}
