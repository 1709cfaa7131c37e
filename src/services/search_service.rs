use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("no search backend is configured")]
    NotConfigured,

    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("search response could not be decoded: {0}")]
    Decode(String),
}

/// Web search capability used to pull fresh context for a topic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Stand-in when no search credentials are configured; every lookup fails
/// and the aggregator falls back to an empty block.
#[derive(Clone, Debug, Default)]
pub struct DisabledSearch;

#[async_trait]
impl SearchProvider for DisabledSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        Err(SearchError::NotConfigured)
    }
}

#[derive(Clone)]
pub struct TavilySearch {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl TavilySearch {
    pub fn new(api_key: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            endpoint: TAVILY_SEARCH_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        #[derive(Serialize)]
        struct SearchReq<'a> {
            api_key: &'a str,
            query: &'a str,
            max_results: usize,
            search_depth: &'a str,
        }
        #[derive(Deserialize)]
        struct SearchResult {
            #[serde(default)]
            title: String,
            #[serde(default)]
            url: String,
            #[serde(default)]
            content: String,
        }
        #[derive(Deserialize)]
        struct SearchResp {
            #[serde(default)]
            results: Vec<SearchResult>,
        }

        let body = SearchReq {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: "basic",
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        let status = resp.status();
        let txt = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: txt,
            });
        }
        let parsed: SearchResp =
            serde_json::from_str(&txt).map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect())
    }
}
