/*!
 * Tests for upstream error classification
 */

use bucho::errors::{ProviderError, SearchError};
use bucho::review::classifier::{ErrorCategory, ErrorClassifier};

#[test]
fn test_classify_message_withProviderErrorTypes_shouldMapToCategories() {
    let cases = [
        ("overloaded_error: Overloaded", ErrorCategory::ServiceUnavailable),
        ("invalid_request_error: prompt is too long", ErrorCategory::Validation),
        ("rate_limit_error: slow down", ErrorCategory::Throttling),
        ("authentication_error: invalid x-api-key", ErrorCategory::AccessDenied),
        ("permission_error: not allowed", ErrorCategory::AccessDenied),
        ("not_found_error: model: claude-9", ErrorCategory::ResourceNotFound),
        ("Model is not ready to serve", ErrorCategory::ModelNotReady),
    ];

    for (message, expected) in cases {
        assert_eq!(ErrorClassifier::classify_message(message), expected, "{}", message);
    }
}

#[test]
fn test_classify_message_withMixedCase_shouldIgnoreCase() {
    assert_eq!(
        ErrorClassifier::classify_message("THROTTLINGEXCEPTION"),
        ErrorCategory::Throttling
    );
}

#[test]
fn test_classify_message_withSeveralMatches_shouldUsePriorityOrder() {
    // Model readiness outranks throttling when both appear
    assert_eq!(
        ErrorClassifier::classify_message("ModelNotReadyException after ThrottlingException"),
        ErrorCategory::ModelNotReady
    );
}

#[test]
fn test_classify_withStatusOnlyErrors_shouldUseStatusCode() {
    let cases = [
        (400, ErrorCategory::Validation),
        (401, ErrorCategory::AccessDenied),
        (403, ErrorCategory::AccessDenied),
        (404, ErrorCategory::ResourceNotFound),
        (429, ErrorCategory::Throttling),
        (529, ErrorCategory::ServiceUnavailable),
        (418, ErrorCategory::Unknown),
    ];

    for (status_code, expected) in cases {
        let error = ProviderError::ApiError {
            status_code,
            message: "opaque".to_string(),
        };
        assert_eq!(ErrorClassifier::classify(&error).category, expected, "{}", status_code);
    }
}

#[test]
fn test_classify_withConnectionError_shouldBeUnknownAndKeepMessage() {
    let error = ProviderError::ConnectionError("connection reset".to_string());
    let classified = ErrorClassifier::classify(&error);

    assert_eq!(classified.category, ErrorCategory::Unknown);
    assert!(classified.message.contains("connection reset"));
    assert_eq!(classified.remedy(), ErrorCategory::Unknown.remedy());
}

#[test]
fn test_classify_search_withAuthFailure_shouldBeAccessDenied() {
    let error = SearchError::ApiError {
        status_code: 401,
        message: "bad key".to_string(),
    };
    assert_eq!(
        ErrorClassifier::classify_search(&error).category,
        ErrorCategory::AccessDenied
    );
}

#[test]
fn test_classify_search_withTransportFailure_shouldBeUnknown() {
    let error = SearchError::RequestFailed("dns failure".to_string());
    assert_eq!(ErrorClassifier::classify_search(&error).category, ErrorCategory::Unknown);
}

#[test]
fn test_category_codes_shouldBeUniqueAndStable() {
    let codes: std::collections::HashSet<&str> = ErrorCategory::ALL.iter().map(|c| c.code()).collect();
    assert_eq!(codes.len(), ErrorCategory::ALL.len());
    assert_eq!(ErrorCategory::ResourceNotFound.to_string(), "RESOURCE_NOT_FOUND");
}
