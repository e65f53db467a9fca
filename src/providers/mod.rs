/*!
 * Provider implementations for the review and keyword models.
 *
 * This module contains client implementations for the supported LLM providers:
 * - Anthropic: Messages API, with server-sent-event streaming
 * - OpenAI: OpenAI-compatible chat completions (OpenAI, LM Studio, Ollama's /v1)
 * - Mock: scripted provider used by tests
 */

use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use crate::errors::ProviderError;

/// Ordered sequence of text deltas produced by a streaming call
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// A single-message completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// The sole user message
    pub prompt: String,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a new request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens,
        }
    }
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the review pipeline.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request and return the whole response text
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The response text or an error
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Start a streaming completion
    ///
    /// Errors raised before the first byte are returned directly; errors raised
    /// later are yielded as items of the stream.
    async fn stream(&self, request: CompletionRequest) -> Result<DeltaStream, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self, model: &str) -> Result<(), ProviderError> {
        self.complete(CompletionRequest::new(model, "Hello", 10)).await?;
        Ok(())
    }
}

/// Map a transport error from reqwest
pub(crate) fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_connect() || e.is_timeout() {
        ProviderError::ConnectionError(e.to_string())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}

/// Map a non-success HTTP status and body
pub(crate) fn status_error(status_code: u16, body: String) -> ProviderError {
    match status_code {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        _ => ProviderError::ApiError {
            status_code,
            message: body,
        },
    }
}

pub mod anthropic;
pub mod mock;
pub mod openai;
pub mod sse;
