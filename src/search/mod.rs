//! Web search layer.
//!
//! [`SearchProvider`] is the seam the searcher stage depends on; the
//! shipped implementation is [`TavilyClient`], a thin wrapper over the
//! Tavily REST API. Tests substitute scripted providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;
use crate::workflow::state::SearchHit;

/// Tavily search endpoint.
const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// A source of web search results.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs a search and returns up to `max_results` hits.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Search`] when the request or response
    /// handling fails. Callers treat search failures as soft: the stage
    /// continues with whatever results it has.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, PipelineError>;
}

/// Tavily web search client.
#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The credential never appears in debug output.
        f.debug_struct("TavilyClient").finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilyClient {
    /// Creates a client with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, PipelineError> {
        debug!(query, max_results, "tavily search");

        let response = self
            .http
            .post(TAVILY_SEARCH_URL)
            .bearer_auth(&self.api_key)
            .json(&TavilyRequest { query, max_results })
            .send()
            .await
            .map_err(|e| PipelineError::Search {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Search {
                message: format!("search API returned {status}"),
            });
        }

        let body: TavilyResponse = response.json().await.map_err(|e| PipelineError::Search {
            message: format!("malformed response: {e}"),
        })?;

        let hits = body
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect();
        Ok(hits)
    }
}
