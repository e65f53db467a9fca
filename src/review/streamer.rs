/*!
 * Streaming review call and delta aggregation.
 *
 * Deltas are appended to the result strictly in arrival order. A failure
 * before the first delta fails the whole call; a failure after it keeps the
 * text aggregated so far and reports it as a partial result.
 */

use futures::StreamExt;
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::errors::ReviewError;
use crate::providers::{CompletionRequest, DeltaStream, Provider};
use crate::review::classifier::{ClassifiedError, ErrorClassifier};

/// Default output token budget of the review call
pub const DEFAULT_REVIEW_MAX_TOKENS: u32 = 4000;

/// Aggregated review text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewResult {
    text: String,
    deltas: usize,
}

impl ReviewResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one delta
    pub fn push(&mut self, delta: &str) {
        self.text.push_str(delta);
        self.deltas += 1;
    }

    /// Text aggregated so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of deltas received
    pub fn delta_count(&self) -> usize {
        self.deltas
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Final state of a streaming review
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The stream closed normally
    Complete(ReviewResult),
    /// The stream failed after at least one delta
    Partial {
        result: ReviewResult,
        failure: ClassifiedError,
    },
}

impl ReviewOutcome {
    /// The aggregated result, complete or not
    pub fn result(&self) -> &ReviewResult {
        match self {
            Self::Complete(result) | Self::Partial { result, .. } => result,
        }
    }

    /// The mid-stream failure, if any
    pub fn failure(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Complete(_) => None,
            Self::Partial { failure, .. } => Some(failure),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Issues the streaming review call
#[derive(Debug, Clone)]
pub struct ReviewStreamer {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: u32,
}

impl ReviewStreamer {
    /// Create a streamer for `model` with the given output token budget
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
        }
    }

    /// Start the streaming call with the prompt as the sole user message
    pub async fn stream(&self, prompt: &str) -> Result<DeltaStream, ReviewError> {
        let request = CompletionRequest::new(self.model.as_str(), prompt, self.max_tokens);
        debug!("Starting review stream with model {} (max_tokens {})", self.model, self.max_tokens);

        self.provider.stream(request).await.map_err(|e| {
            let classified = ErrorClassifier::classify(&e);
            error!("Review call failed: {}", classified);
            ReviewError::Upstream(classified)
        })
    }

    /// Stream the review, calling `on_delta` for every delta in arrival order
    pub async fn run<F>(&self, prompt: &str, on_delta: F) -> Result<ReviewOutcome, ReviewError>
    where
        F: FnMut(&str),
    {
        let deltas = self.stream(prompt).await?;
        aggregate(deltas, on_delta).await
    }
}

/// Drain a delta stream into a review outcome
pub async fn aggregate<F>(mut deltas: DeltaStream, mut on_delta: F) -> Result<ReviewOutcome, ReviewError>
where
    F: FnMut(&str),
{
    let mut result = ReviewResult::new();

    while let Some(item) = deltas.next().await {
        match item {
            Ok(delta) => {
                if delta.is_empty() {
                    continue;
                }
                on_delta(&delta);
                result.push(&delta);
            }
            Err(e) => {
                let failure = ErrorClassifier::classify(&e);
                if result.delta_count() == 0 {
                    error!("Review stream failed before any output: {}", failure);
                    return Err(ReviewError::Upstream(failure));
                }
                warn!(
                    "Review stream failed after {} deltas, keeping partial result: {}",
                    result.delta_count(),
                    failure
                );
                return Ok(ReviewOutcome::Partial { result, failure });
            }
        }
    }

    info!(
        "Review stream complete: {} deltas, {} chars",
        result.delta_count(),
        result.text().chars().count()
    );
    Ok(ReviewOutcome::Complete(result))
}
