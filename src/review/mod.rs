/*!
 * Review-augmentation pipeline.
 *
 * Leaf components first:
 * - `sanitizer`: bounded, safe text for prompt interpolation
 * - `keywords`: search keyword extraction with one model call
 * - `augment`: keyword searches compacted into a related information block
 * - `prompt`: template validation and prompt assembly
 * - `streamer`: streaming review call and delta aggregation
 * - `classifier`: upstream failure categories and remedies
 * - `pipeline`: the whole flow for one document
 */

pub mod augment;
pub mod classifier;
pub mod keywords;
pub mod pipeline;
pub mod prompt;
pub mod sanitizer;
pub mod streamer;

pub use augment::{AugmentSettings, Augmentation, SearchAugmenter};
pub use classifier::{ClassifiedError, ErrorCategory, ErrorClassifier};
pub use keywords::{KeywordExtractor, KeywordOutcome, KeywordSettings};
pub use pipeline::{ReviewPipeline, ReviewReport, ReviewSettings};
pub use prompt::{AssembledPrompt, PromptAssembler, PromptTemplate};
pub use sanitizer::{SanitizePolicy, TextSanitizer};
pub use streamer::{ReviewOutcome, ReviewResult, ReviewStreamer};
