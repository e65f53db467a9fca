/*!
 * Search augmentation: one query per keyword, compacted into a related
 * information block for the review prompt.
 *
 * Augmentation degrades instead of failing. Per-keyword search errors are
 * recorded and skipped, and an empty block means "no augmentation".
 */

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::review::classifier::{ClassifiedError, ErrorClassifier};
use crate::review::sanitizer::TextSanitizer;
use crate::search::{SearchClient, SearchDepth, SearchHit};

/// Header line of the related information block
pub const RELATED_INFO_HEADER: &str = "【関連情報】";

/// Upper bound on keywords searched per review
pub const MAX_SEARCH_QUERIES: usize = 3;

/// Settings for search augmentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentSettings {
    /// Whether augmentation runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum number of keywords searched
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,

    /// Result count requested per query
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    /// Depth hint for the search endpoint
    #[serde(default)]
    pub search_depth: SearchDepth,

    /// Maximum number of hits kept in the block (5 or 10)
    #[serde(default = "default_max_hits")]
    pub max_hits: usize,

    /// Characters kept from each hit title
    #[serde(default = "default_title_chars")]
    pub title_chars: usize,

    /// Characters kept from each hit content
    #[serde(default = "default_content_chars")]
    pub content_chars: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_max_queries() -> usize {
    MAX_SEARCH_QUERIES
}

fn default_results_per_query() -> usize {
    3
}

fn default_max_hits() -> usize {
    5
}

fn default_title_chars() -> usize {
    100
}

fn default_content_chars() -> usize {
    300
}

impl Default for AugmentSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_queries: default_max_queries(),
            results_per_query: default_results_per_query(),
            search_depth: SearchDepth::default(),
            max_hits: default_max_hits(),
            title_chars: default_title_chars(),
            content_chars: default_content_chars(),
        }
    }
}

/// A keyword whose search failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSearchFailure {
    pub keyword: String,
    pub error: ClassifiedError,
}

/// Result of augmentation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Augmentation {
    /// Formatted related information; empty when nothing was found
    pub block: String,
    /// Hits included in the block, in keyword then result order
    pub hits: Vec<SearchHit>,
    /// Searches that failed and were skipped
    pub failures: Vec<KeywordSearchFailure>,
}

impl Augmentation {
    /// Whether the block adds anything to the prompt
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }
}

/// Runs keyword searches and formats the hits
#[derive(Debug, Clone)]
pub struct SearchAugmenter {
    client: Option<Arc<dyn SearchClient>>,
    settings: AugmentSettings,
    sanitizer: TextSanitizer,
}

impl SearchAugmenter {
    /// Create an augmenter; `None` as client disables augmentation
    pub fn new(client: Option<Arc<dyn SearchClient>>, settings: AugmentSettings, sanitizer: TextSanitizer) -> Self {
        Self {
            client,
            settings,
            sanitizer,
        }
    }

    /// Search each keyword in order and build the related information block
    pub async fn augment(&self, keywords: &[String]) -> Augmentation {
        let client = match (&self.client, self.settings.enabled) {
            (Some(client), true) => client,
            (None, true) => {
                debug!("No search client available, skipping augmentation");
                return Augmentation::default();
            }
            (_, false) => {
                debug!("Search augmentation disabled");
                return Augmentation::default();
            }
        };

        let mut hits = Vec::new();
        let mut failures = Vec::new();

        // One query at a time, in keyword order.
        for keyword in keywords.iter().take(self.settings.max_queries) {
            match client
                .search(keyword, self.settings.results_per_query, self.settings.search_depth)
                .await
            {
                Ok(response) => {
                    debug!("Search for '{}' returned {} results", keyword, response.results.len());
                    hits.extend(
                        response
                            .results
                            .into_iter()
                            .map(|record| SearchHit::from_record(record, keyword)),
                    );
                }
                Err(e) => {
                    let error = ErrorClassifier::classify_search(&e);
                    warn!("Search for '{}' failed, skipping: {}", keyword, error);
                    failures.push(KeywordSearchFailure {
                        keyword: keyword.clone(),
                        error,
                    });
                }
            }
        }

        hits.truncate(self.settings.max_hits);
        if hits.is_empty() {
            return Augmentation {
                block: String::new(),
                hits,
                failures,
            };
        }

        let block = self.format_block(&hits);
        info!("Related information: {} hits, {} chars", hits.len(), block.chars().count());

        Augmentation { block, hits, failures }
    }

    /// Format hits into the related information block
    pub fn format_block(&self, hits: &[SearchHit]) -> String {
        let mut block = String::from(RELATED_INFO_HEADER);
        block.push('\n');

        for (index, hit) in hits.iter().enumerate() {
            let title = truncate_chars(&self.sanitizer.sanitize(&hit.title), self.settings.title_chars);
            let content = truncate_chars(&self.sanitizer.sanitize(&hit.content), self.settings.content_chars);

            block.push_str(&format!(
                "{}. {}\n{}\n出典: {} (キーワード: {})\n",
                index + 1,
                title,
                content,
                hit.url,
                hit.keyword
            ));
        }

        block.trim_end().to_string()
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
