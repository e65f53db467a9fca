/*!
 * End-to-end review pipeline.
 *
 * Steps run strictly in sequence: sanitize, extract keywords, search,
 * assemble, stream. Keyword extraction and search degrade to fallbacks;
 * template errors and review call failures end the invocation.
 *
 * Every invocation takes its own `ReviewSettings`; the pipeline holds only
 * the clients.
 */

use log::{debug, info};
use std::sync::Arc;

use crate::errors::ReviewError;
use crate::providers::Provider;
use crate::review::augment::{AugmentSettings, Augmentation, SearchAugmenter};
use crate::review::keywords::{KeywordExtractor, KeywordOutcome, KeywordSettings};
use crate::review::prompt::{
    AssembledPrompt, DEFAULT_PROMPT_SOFT_LIMIT, DEFAULT_REVIEW_TEMPLATE, PromptAssembler, PromptTemplate,
};
use crate::review::sanitizer::{SanitizePolicy, TextSanitizer};
use crate::review::streamer::{DEFAULT_REVIEW_MAX_TOKENS, ReviewOutcome, ReviewStreamer};
use crate::search::SearchClient;

/// Request-scoped review configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSettings {
    /// Template with one `{document_text}` placeholder
    pub template: String,
    /// Model used for the streaming review
    pub review_model: String,
    /// Model used for keyword extraction
    pub keyword_model: String,
    /// Output token budget of the review call
    pub max_tokens: u32,
    /// Prompt length above which a warning is raised
    pub prompt_soft_limit: usize,
    /// Sanitization policy for document and search text
    pub sanitizer: SanitizePolicy,
    pub keywords: KeywordSettings,
    pub search: AugmentSettings,
}

impl ReviewSettings {
    /// Settings using the same model for review and keyword extraction
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            template: DEFAULT_REVIEW_TEMPLATE.to_string(),
            review_model: model.clone(),
            keyword_model: model,
            max_tokens: DEFAULT_REVIEW_MAX_TOKENS,
            prompt_soft_limit: DEFAULT_PROMPT_SOFT_LIMIT,
            sanitizer: SanitizePolicy::default(),
            keywords: KeywordSettings::default(),
            search: AugmentSettings::default(),
        }
    }

    /// Replace the template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Turn search augmentation on or off
    pub fn with_search(mut self, enabled: bool) -> Self {
        self.search.enabled = enabled;
        self
    }
}

/// Everything a review invocation produced
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewReport {
    /// Keyword extraction outcome; `None` when augmentation was skipped
    pub keywords: Option<KeywordOutcome>,
    /// Search augmentation, empty when nothing was added
    pub augmentation: Augmentation,
    /// The prompt sent to the review model
    pub prompt: AssembledPrompt,
    /// Streaming outcome
    pub outcome: ReviewOutcome,
}

impl ReviewReport {
    /// Final review text, complete or partial
    pub fn text(&self) -> &str {
        self.outcome.result().text()
    }
}

/// Orchestrates one review per `run` call
#[derive(Debug, Clone)]
pub struct ReviewPipeline {
    review_provider: Arc<dyn Provider>,
    keyword_provider: Arc<dyn Provider>,
    search_client: Option<Arc<dyn SearchClient>>,
}

impl ReviewPipeline {
    /// Create a pipeline using one provider for both model calls
    pub fn new(provider: Arc<dyn Provider>, search_client: Option<Arc<dyn SearchClient>>) -> Self {
        Self {
            keyword_provider: provider.clone(),
            review_provider: provider,
            search_client,
        }
    }

    /// Use a separate provider for keyword extraction
    pub fn with_keyword_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.keyword_provider = provider;
        self
    }

    /// Whether a search client is available
    pub fn has_search(&self) -> bool {
        self.search_client.is_some()
    }

    /// Review a document
    ///
    /// # Arguments
    /// * `document_text` - Raw extracted document text
    /// * `settings` - Configuration for this invocation only
    /// * `on_delta` - Called with each review delta in arrival order
    pub async fn run<F>(
        &self,
        document_text: &str,
        settings: &ReviewSettings,
        on_delta: F,
    ) -> Result<ReviewReport, ReviewError>
    where
        F: FnMut(&str),
    {
        if document_text.trim().is_empty() {
            return Err(ReviewError::Extraction("document contains no text".to_string()));
        }

        // Fail on a bad template before any network call is made.
        PromptTemplate::parse(&settings.template)?;

        let sanitizer = TextSanitizer::new(settings.sanitizer);
        let sanitized = sanitizer.sanitize(document_text);
        debug!(
            "Sanitized document: {} -> {} chars",
            document_text.chars().count(),
            sanitized.chars().count()
        );

        let (keywords, augmentation) = if settings.search.enabled && self.search_client.is_some() {
            let extractor = KeywordExtractor::new(
                self.keyword_provider.clone(),
                settings.keyword_model.as_str(),
                settings.keywords.clone(),
            );
            let keywords = extractor.extract(&sanitized).await;

            let augmenter = SearchAugmenter::new(self.search_client.clone(), settings.search.clone(), sanitizer);
            let augmentation = augmenter.augment(keywords.keywords()).await;
            (Some(keywords), augmentation)
        } else {
            info!("Search augmentation skipped");
            (None, Augmentation::default())
        };

        let assembler = PromptAssembler::new(sanitizer, settings.prompt_soft_limit);
        let prompt = assembler.assemble(document_text, &settings.template, &augmentation.block)?;

        let streamer = ReviewStreamer::new(
            self.review_provider.clone(),
            settings.review_model.as_str(),
            settings.max_tokens,
        );
        let outcome = streamer.run(&prompt.text, on_delta).await?;

        Ok(ReviewReport {
            keywords,
            augmentation,
            prompt,
            outcome,
        })
    }
}
