/*!
 * Web search clients used for prompt augmentation.
 *
 * - Tavily: REST search API
 * - Mock: scripted client used by tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::SearchError;

/// Depth hint passed to the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDepth {
    /// Fast, shallow search
    #[default]
    Basic,
    /// Slower search over more sources
    Advanced,
}

impl SearchDepth {
    /// Wire name of the depth
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

/// One record returned by the search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Extracted page content
    #[serde(default)]
    pub content: String,
    /// Source URL
    #[serde(default)]
    pub url: String,
}

/// Response of a single search query
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Direct answer, when the endpoint provides one; not used for augmentation
    #[serde(default)]
    pub answer: Option<String>,
    /// Ordered results
    #[serde(default)]
    pub results: Vec<SearchRecord>,
}

/// A search record tagged with the keyword that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub content: String,
    pub url: String,
    /// Keyword whose query returned this hit
    pub keyword: String,
}

impl SearchHit {
    /// Tag a record with its originating keyword
    pub fn from_record(record: SearchRecord, keyword: &str) -> Self {
        Self {
            title: record.title,
            content: record.content,
            url: record.url,
            keyword: keyword.to_string(),
        }
    }
}

/// Common trait for search backends
#[async_trait]
pub trait SearchClient: Send + Sync + Debug {
    /// Run one query and return at most `max_results` records
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        depth: SearchDepth,
    ) -> Result<SearchResponse, SearchError>;
}

pub mod mock;
pub mod tavily;
