/*!
 * Scripted search client for testing.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::SearchError;
use crate::search::{SearchClient, SearchDepth, SearchRecord, SearchResponse};

/// Search client answering from a fixed table of queries
#[derive(Debug, Clone, Default)]
pub struct MockSearchClient {
    results: HashMap<String, Vec<SearchRecord>>,
    failures: HashMap<String, SearchError>,
    fail_all: Option<SearchError>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockSearchClient {
    /// Client that returns no results for every query
    pub fn empty() -> Self {
        Self::default()
    }

    /// Client that fails every query with `error`
    pub fn failing(error: SearchError) -> Self {
        Self {
            fail_all: Some(error),
            ..Self::default()
        }
    }

    /// Answer `query` with `records`
    pub fn with_results(mut self, query: impl Into<String>, records: Vec<SearchRecord>) -> Self {
        self.results.insert(query.into(), records);
        self
    }

    /// Fail `query` with `error`
    pub fn with_failure(mut self, query: impl Into<String>, error: SearchError) -> Self {
        self.failures.insert(query.into(), error);
        self
    }

    /// Queries received so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        _depth: SearchDepth,
    ) -> Result<SearchResponse, SearchError> {
        self.queries.lock().push(query.to_string());

        if let Some(error) = self.fail_all.as_ref().or_else(|| self.failures.get(query)) {
            return Err(error.clone());
        }

        let results = self
            .results
            .get(query)
            .map(|records| records.iter().take(max_results).cloned().collect())
            .unwrap_or_default();

        Ok(SearchResponse { answer: None, results })
    }
}
