//! # Tools Module
//!
//! This module implements the web search collaborator using the Firecrawl
//! search API. It demonstrates several important Rust and async patterns:
//! - Trait objects behind `async_trait` for swappable collaborators
//! - Async/await for non-blocking I/O
//! - Structured error handling with thiserror
//! - Serde for JSON serialization/deserialization

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ResearchError;
use crate::usage::ToolUsageLog;

/// Default timeout for Firecrawl API requests. Search with scraping is slow.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
/// # Rust Concept: Custom Error Types with thiserror
///
/// Each variant is a distinct failure the search provider can report.
/// The orchestrator only cares whether a failure is a rate limit (see
/// [`SearchError::is_rate_limit`]); the rest exist for clear log messages.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Rate limited by search provider (429 Too Many Requests)")]
    RateLimited,

    #[error("Unauthorized - check FIRECRAWL_KEY")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("HTTP error ({0}): {1}")]
    HttpError(u16, String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse search response: {0}")]
    ParseError(String),
}

impl SearchError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SearchError::RateLimited)
    }
}

// =============================================================================
// SEARCH HIT
// =============================================================================
/// One page returned by the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page content as markdown, already truncated
    pub content: String,

    /// Where the content came from
    pub source_url: String,
}

impl SearchHit {
    pub fn new(content: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_url: source_url.into(),
        }
    }
}

// =============================================================================
// SEARCH PROVIDER TRAIT
// =============================================================================
/// Turns a query into at most `limit` content snippets with their URLs.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError>;
}

// =============================================================================
// FIRECRAWL SEARCH
// =============================================================================
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FirecrawlRequest<'a> {
    query: &'a str,
    limit: usize,
    scrape_options: ScrapeOptions,
}

#[derive(Debug, Serialize)]
struct ScrapeOptions {
    formats: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct FirecrawlResponse {
    #[serde(default)]
    data: Vec<FirecrawlDocument>,
}

#[derive(Debug, Deserialize)]
struct FirecrawlDocument {
    url: Option<String>,
    markdown: Option<String>,
}

/// Web search backed by Firecrawl's `/v1/search` endpoint with markdown
/// scraping enabled.
///
/// # Rust Concept: Struct with Private Fields
///
/// Fields are private so a client can only be built through
/// [`FirecrawlSearch::new`] or [`FirecrawlSearch::from_config`].
pub struct FirecrawlSearch {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    max_content_chars: usize,
    timeout: Duration,
    usage: ToolUsageLog,
}

impl FirecrawlSearch {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, usage: ToolUsageLog) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_content_chars: 25_000,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            usage,
        }
    }

    /// Build from configuration.
    ///
    /// The hosted API needs a key; a self-hosted instance may run without one.
    pub fn from_config(config: &Config, usage: ToolUsageLog) -> Result<Self, ResearchError> {
        let api_key = config.firecrawl_api_key.clone().filter(|key| !key.is_empty());
        if api_key.is_none() && !config.is_self_hosted_firecrawl() {
            return Err(ResearchError::missing_credential("FIRECRAWL_KEY"));
        }

        Ok(Self::new(api_key, config.firecrawl_base_url.clone(), usage)
            .with_max_content_chars(config.max_content_chars))
    }

    pub fn with_max_content_chars(mut self, max_content_chars: usize) -> Self {
        self.max_content_chars = max_content_chars;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn execute_request(&self, query: &str, limit: usize) -> Result<FirecrawlResponse, SearchError> {
        let url = format!("{}/v1/search", self.base_url);
        debug!(url = %url, "Fetching search results");

        let mut request = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&FirecrawlRequest {
                query,
                limit,
                scrape_options: ScrapeOptions {
                    formats: vec!["markdown"],
                },
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout
            } else {
                SearchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| SearchError::ParseError(e.to_string()));
        }

        let error_text = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(SearchError::Unauthorized),
            429 => Err(SearchError::RateLimited),
            400 => Err(SearchError::BadRequest(error_text)),
            500..=599 => Err(SearchError::ServerError(status.as_u16(), error_text)),
            code => Err(SearchError::HttpError(code, error_text)),
        }
    }
}

#[async_trait]
impl SearchProvider for FirecrawlSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.usage
            .record(format!("firecrawl_search(q={}, k={})", query, limit));

        let response = self.execute_request(query, limit).await?;

        // Documents without both content and a URL are useless to the digest.
        let hits: Vec<SearchHit> = response
            .data
            .into_iter()
            .filter_map(|doc| match (doc.markdown, doc.url) {
                (Some(markdown), Some(url)) if !markdown.is_empty() && !url.is_empty() => {
                    Some(SearchHit::new(truncate_chars(&markdown, self.max_content_chars), url))
                }
                _ => None,
            })
            .collect();

        if hits.is_empty() {
            warn!(query = %query, "No search results found");
        } else {
            info!(query = %query, count = hits.len(), "Search completed");
        }

        Ok(hits)
    }
}

/// Keep at most `max` characters, never splitting a UTF-8 sequence.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(SearchError::RateLimited.is_rate_limit());
        assert!(!SearchError::ServerError(503, "down".into()).is_rate_limit());
        assert!(!SearchError::Timeout.is_rate_limit());
    }

    #[test]
    fn test_hosted_firecrawl_requires_key() {
        let config = Config::default();
        let result = FirecrawlSearch::from_config(&config, ToolUsageLog::new());
        assert!(matches!(
            result,
            Err(ResearchError::MissingCredential { ref var }) if var == "FIRECRAWL_KEY"
        ));
    }

    #[test]
    fn test_self_hosted_firecrawl_without_key() {
        let config = Config {
            firecrawl_base_url: "http://localhost:3002".to_string(),
            ..Config::default()
        };
        assert!(FirecrawlSearch::from_config(&config, ToolUsageLog::new()).is_ok());
    }

    #[test]
    fn test_request_serialization() {
        let request = FirecrawlRequest {
            query: "rust",
            limit: 2,
            scrape_options: ScrapeOptions {
                formats: vec!["markdown"],
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["limit"], 2);
        assert_eq!(json["scrapeOptions"]["formats"][0], "markdown");
    }
}
