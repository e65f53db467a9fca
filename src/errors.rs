/*!
 * Error types for the bucho application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

use crate::review::classifier::ClassifiedError;

/// Errors that can occur when working with model provider APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Error event received in the middle of a response stream
    #[error("Stream error: {0}")]
    StreamError(String),
}

/// Errors that can occur when calling the web search API
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    /// Error when making the search request fails
    #[error("Search request failed: {0}")]
    RequestFailed(String),

    /// Error returned by the search API itself
    #[error("Search API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error when parsing a search response fails
    #[error("Failed to parse search response: {0}")]
    ParseError(String),

    /// No search client is configured
    #[error("Search client not configured: {0}")]
    NotConfigured(String),
}

/// Errors raised while rendering the review prompt template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template has no `{document_text}` placeholder
    #[error("Template does not contain the {{document_text}} placeholder")]
    MissingPlaceholder,

    /// The template has more than one `{document_text}` placeholder
    #[error("Template contains {count} {{document_text}} placeholders, expected exactly one")]
    DuplicatePlaceholder {
        /// Number of placeholders found
        count: usize,
    },

    /// The template references a placeholder that cannot be filled
    #[error("Template references unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    /// A `{` or `}` is not part of a placeholder or an escape
    #[error("Unbalanced brace at character {position} (use {{{{ or }}}} for literal braces)")]
    UnbalancedBrace {
        /// Character offset of the offending brace
        position: usize,
    },
}

/// Terminal failures of a review invocation
#[derive(Error, Debug, Clone)]
pub enum ReviewError {
    /// Text could not be extracted from the document
    #[error("Document extraction failed: {0}")]
    Extraction(String),

    /// A model or search client could not be constructed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),

    /// The review template is malformed
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// The review model call failed before producing any output
    #[error("Upstream call failed: {0}")]
    Upstream(ClassifiedError),

    /// The review model call failed after producing output; the partial text was saved
    #[error("Review incomplete, partial result saved to {}: {failure}", .path.display())]
    Incomplete {
        /// Where the partial review was written
        path: PathBuf,
        /// The mid-stream failure
        failure: ClassifiedError,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the search API
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Error from a review invocation
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
