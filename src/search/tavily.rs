use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::errors::SearchError;
use crate::search::{SearchClient, SearchDepth, SearchResponse};

const DEFAULT_API_URL: &str = "https://api.tavily.com/search";

/// Client for the Tavily search API
pub struct Tavily {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl std::fmt::Debug for Tavily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tavily")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Search request body
#[derive(Debug, Serialize)]
pub struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
}

impl Tavily {
    /// Create a new client; an empty endpoint means the public API
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SearchError::NotConfigured("search API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SearchError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            endpoint: endpoint.into(),
        })
    }

    /// Search URL for the configured endpoint
    pub fn api_url(&self) -> &str {
        if self.endpoint.is_empty() {
            DEFAULT_API_URL
        } else {
            &self.endpoint
        }
    }
}

#[async_trait]
impl SearchClient for Tavily {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        depth: SearchDepth,
    ) -> Result<SearchResponse, SearchError> {
        let body = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: depth.as_str(),
        };

        debug!("Searching for '{}' (max {} results, {} depth)", query, max_results, depth.as_str());

        let response = self
            .client
            .post(self.api_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Search API error ({}): {}", status, message);
            return Err(SearchError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))
    }
}
