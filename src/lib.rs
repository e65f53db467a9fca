/*!
 * # Bucho - AI review of approval documents
 *
 * A Rust library that reviews an uploaded document with a language model,
 * optionally enriched with live web-search context, and streams the review
 * back as it is written.
 *
 * ## Features
 *
 * - Extract text from PDF documents page by page
 * - Sanitize untrusted document and search text before prompting
 * - Derive search keywords from the document with one model call
 * - Compact search results into a bounded related-information block
 * - Validate user-editable review templates
 * - Stream the review from various AI providers:
 *   - Anthropic API
 *   - OpenAI API and OpenAI-compatible servers (LM Studio)
 * - Classify upstream failures into actionable categories
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Document sources and extracted text
 * - `review`: The review-augmentation pipeline:
 *   - `review::sanitizer`: Text sanitization policies
 *   - `review::keywords`: Search keyword extraction
 *   - `review::augment`: Search result compaction
 *   - `review::prompt`: Template validation and prompt assembly
 *   - `review::streamer`: Streaming review aggregation
 *   - `review::classifier`: Upstream error categories and remedies
 *   - `review::pipeline`: End-to-end orchestration
 * - `providers`: Client implementations for the LLM providers:
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::sse`: Server-sent event decoding
 * - `search`: Web search clients (`search::tavily`)
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod providers;
pub mod review;
pub mod search;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{DocumentSource, DocumentText};
pub use errors::{AppError, ProviderError, ReviewError, SearchError, TemplateError};
pub use review::{ReviewOutcome, ReviewPipeline, ReviewReport, ReviewSettings};
