/*!
 * Mock provider implementation for testing.
 *
 * This module provides a scripted provider that simulates different behaviors:
 * - `MockProvider::working(text)` - Always succeeds with the given text
 * - `MockProvider::chunks(parts)` - Streams the given parts in order
 * - `MockProvider::failing(error)` - Always fails before producing output
 * - `MockProvider::failing_after(parts, error)` - Streams parts, then fails
 */

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, DeltaStream, Provider};

/// Behavior mode for the mock provider
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Responds with the whole text (one delta when streaming)
    Working(String),
    /// Responds with the parts; streaming yields one delta per part
    Chunks(Vec<String>),
    /// Streams the parts, then yields the error
    FailingAfter {
        /// Parts delivered before the failure
        parts: Vec<String>,
        /// Error raised after the parts
        error: ProviderError,
    },
    /// Fails immediately
    Failing(ProviderError),
}

/// Scripted provider that records every request it receives
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always answers with `text`
    pub fn working(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Working(text.into()))
    }

    /// Create a mock that streams `parts` in order
    pub fn chunks<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Self {
        Self::new(MockBehavior::Chunks(parts.into_iter().map(Into::into).collect()))
    }

    /// Create a mock that always fails with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::new(MockBehavior::Failing(error))
    }

    /// Create a mock that streams `parts` and then fails with `error`
    pub fn failing_after<S: Into<String>>(parts: impl IntoIterator<Item = S>, error: ProviderError) -> Self {
        Self::new(MockBehavior::FailingAfter {
            parts: parts.into_iter().map(Into::into).collect(),
            error,
        })
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().push(request);

        match &self.behavior {
            MockBehavior::Working(text) => Ok(text.clone()),
            MockBehavior::Chunks(parts) => Ok(parts.concat()),
            MockBehavior::FailingAfter { error, .. } | MockBehavior::Failing(error) => Err(error.clone()),
        }
    }

    async fn stream(&self, request: CompletionRequest) -> Result<DeltaStream, ProviderError> {
        self.requests.lock().push(request);

        let items: Vec<Result<String, ProviderError>> = match &self.behavior {
            MockBehavior::Working(text) => vec![Ok(text.clone())],
            MockBehavior::Chunks(parts) => parts.iter().cloned().map(Ok).collect(),
            MockBehavior::FailingAfter { parts, error } => parts
                .iter()
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(error.clone())))
                .collect(),
            MockBehavior::Failing(error) => return Err(error.clone()),
        };

        Ok(Box::pin(stream::iter(items)))
    }
}
