/*!
 * Classification of upstream failures into actionable categories.
 *
 * The classifier only labels errors; it never retries. Structured provider
 * errors (HTTP status, rate limit, auth) are mapped first, then the message
 * is matched against a fixed substring table.
 */

use std::fmt;

use crate::errors::{ProviderError, SearchError};

/// Categories of upstream failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Service overloaded or request too large for the service
    ServiceUnavailable,
    /// Request rejected as invalid
    Validation,
    /// Request rate exceeded
    Throttling,
    /// Credentials missing, invalid or lacking permission
    AccessDenied,
    /// Model or endpoint does not exist
    ResourceNotFound,
    /// Model exists but is not ready to serve
    ModelNotReady,
    /// Anything else
    Unknown,
}

impl ErrorCategory {
    /// All categories, in classification priority order
    pub const ALL: [ErrorCategory; 7] = [
        ErrorCategory::ModelNotReady,
        ErrorCategory::Throttling,
        ErrorCategory::ServiceUnavailable,
        ErrorCategory::AccessDenied,
        ErrorCategory::ResourceNotFound,
        ErrorCategory::Validation,
        ErrorCategory::Unknown,
    ];

    /// Stable identifier of the category
    pub fn code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Validation => "VALIDATION",
            Self::Throttling => "THROTTLING",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ModelNotReady => "MODEL_NOT_READY",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable remedy for the category
    pub fn remedy(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable => {
                "The service is unavailable or the request is too large. Reduce the prompt size or disable search augmentation, then try again."
            }
            Self::Validation => {
                "The request was rejected as invalid. Check that the prompt is not too long and the template is well formed."
            }
            Self::Throttling => "Too many requests. Wait a moment and retry.",
            Self::AccessDenied => {
                "Access denied. Check the API key and that the account may use the configured model."
            }
            Self::ResourceNotFound => {
                "The model or endpoint was not found. Check the configured model identifier and endpoint."
            }
            Self::ModelNotReady => "The model is not ready yet. Wait a few minutes and retry.",
            Self::Unknown => "Unexpected error. Check the log output for details.",
        }
    }

    fn substrings(&self) -> &'static [&'static str] {
        match self {
            Self::ServiceUnavailable => &[
                "serviceunavailableexception",
                "service unavailable",
                "serviceunavailable",
                "overloaded_error",
                "overloaded",
            ],
            Self::Validation => &[
                "validationexception",
                "invalid_request_error",
                "validation error",
                "prompt is too long",
            ],
            Self::Throttling => &[
                "throttlingexception",
                "rate_limit_error",
                "rate limit",
                "too many requests",
                "throttl",
            ],
            Self::AccessDenied => &[
                "accessdeniedexception",
                "permission_error",
                "authentication_error",
                "authentication error",
                "access denied",
                "unauthorized",
            ],
            Self::ResourceNotFound => &[
                "resourcenotfoundexception",
                "not_found_error",
                "model not found",
                "not found",
            ],
            Self::ModelNotReady => &[
                "modelnotreadyexception",
                "model not ready",
                "model is not ready",
            ],
            Self::Unknown => &[],
        }
    }

    fn from_status(status_code: u16) -> Option<Self> {
        match status_code {
            400 | 413 | 422 => Some(Self::Validation),
            401 | 403 => Some(Self::AccessDenied),
            404 => Some(Self::ResourceNotFound),
            429 => Some(Self::Throttling),
            500 | 502 | 503 | 504 | 529 => Some(Self::ServiceUnavailable),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An upstream failure with its category and remedy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    /// Category of the failure
    pub category: ErrorCategory,
    /// Error message as received
    pub message: String,
}

impl ClassifiedError {
    /// Remedy text for the failure's category
    pub fn remedy(&self) -> &'static str {
        self.category.remedy()
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (remedy: {})", self.category, self.message, self.remedy())
    }
}

/// Stateless mapper from upstream errors to categories
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message by substring; UNKNOWN when nothing matches
    pub fn classify_message(message: &str) -> ErrorCategory {
        let lowered = message.to_lowercase();
        ErrorCategory::ALL
            .iter()
            .copied()
            .find(|category| category.substrings().iter().any(|s| lowered.contains(s)))
            .unwrap_or(ErrorCategory::Unknown)
    }

    /// Classify a model provider error
    pub fn classify(error: &ProviderError) -> ClassifiedError {
        let category = match error {
            ProviderError::RateLimitExceeded(_) => ErrorCategory::Throttling,
            ProviderError::AuthenticationError(_) => ErrorCategory::AccessDenied,
            ProviderError::ApiError { status_code, message } => {
                // The body usually names the precise error type; prefer it.
                match Self::classify_message(message) {
                    ErrorCategory::Unknown => ErrorCategory::from_status(*status_code)
                        .unwrap_or(ErrorCategory::Unknown),
                    category => category,
                }
            }
            other => Self::classify_message(&other.to_string()),
        };

        ClassifiedError {
            category,
            message: error.to_string(),
        }
    }

    /// Classify a search error
    pub fn classify_search(error: &SearchError) -> ClassifiedError {
        let category = match error {
            SearchError::ApiError { status_code, message } => match Self::classify_message(message) {
                ErrorCategory::Unknown => {
                    ErrorCategory::from_status(*status_code).unwrap_or(ErrorCategory::Unknown)
                }
                category => category,
            },
            other => Self::classify_message(&other.to_string()),
        };

        ClassifiedError {
            category,
            message: error.to_string(),
        }
    }
}
