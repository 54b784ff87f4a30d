//! # Configuration Module
//!
//! This module handles loading and managing configuration from environment variables.
//! It demonstrates several important Rust patterns:
//! - Structs with named fields
//! - The Default trait for sensible defaults
//! - Error handling with Result types
//! - Parsing strings into enums with `FromStr`

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

// =============================================================================
// LLM PROVIDER
// =============================================================================
/// Which Rig provider backs the structured completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "ollama" => Ok(LlmProvider::Ollama),
            other => anyhow::bail!("LLM_PROVIDER must be 'openai' or 'ollama', got: {}", other),
        }
    }
}

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Main configuration for the research agent.
///
/// Credentials are kept as `Option`s here: their absence is reported by the
/// collaborator that needs them, when it is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM provider used for query generation and digestion
    pub provider: LlmProvider,

    /// Model name passed to the provider (e.g., "gpt-4o-mini", "llama3.2")
    pub model: String,

    pub openai_api_key: Option<String>,

    /// Ollama server URL (default: http://localhost:11434)
    pub ollama_host: String,

    pub firecrawl_api_key: Option<String>,

    /// Firecrawl API root; a non-default value means a self-hosted instance
    pub firecrawl_base_url: String,

    /// Capacity of the concurrency gate shared by the whole research tree
    pub concurrency: usize,

    /// Number of queries generated at the top level
    pub breadth: usize,

    /// Number of recursion levels
    pub depth: usize,

    /// Search hits requested per query
    pub results_per_query: usize,

    /// Learnings requested from each digest
    pub max_learnings: usize,

    /// Follow-up questions requested from each digest
    pub max_follow_ups: usize,

    /// Page content is truncated to this many characters
    pub max_content_chars: usize,

    /// Directory where JSON reports are written
    pub reports_dir: PathBuf,

    /// Log level for the application
    pub log_level: String,
}

pub const DEFAULT_FIRECRAWL_BASE_URL: &str = "https://api.firecrawl.dev";

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            openai_api_key: None,
            ollama_host: "http://localhost:11434".to_string(),
            firecrawl_api_key: None,
            firecrawl_base_url: DEFAULT_FIRECRAWL_BASE_URL.to_string(),
            concurrency: 2,
            breadth: 3,
            depth: 2,
            results_per_query: 2,
            max_learnings: 2,
            max_follow_ups: 2,
            max_content_chars: 25_000,
            reports_dir: PathBuf::from("reports"),
            log_level: "info".to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is loaded first if present, then each variable that is
    /// set overrides the corresponding default.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// # Rust Concept: Closures as Parameters
    ///
    /// Taking `impl Fn(&str) -> Option<String>` lets tests feed a HashMap
    /// instead of mutating the real process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(val) = lookup("LLM_PROVIDER") {
            config.provider = val.parse()?;
        }

        if let Some(val) = lookup("LLM_MODEL") {
            config.model = val;
        }

        config.openai_api_key = lookup("OPENAI_KEY").or_else(|| lookup("OPENAI_API_KEY"));

        if let Some(val) = lookup("OLLAMA_API_BASE_URL") {
            config.ollama_host = val;
        }

        config.firecrawl_api_key = lookup("FIRECRAWL_KEY");

        if let Some(val) = lookup("FIRECRAWL_BASE_URL").filter(|v| !v.is_empty()) {
            config.firecrawl_base_url = val;
        }

        if let Some(val) = lookup("RESEARCH_CONCURRENCY") {
            config.concurrency = val
                .parse()
                .context("RESEARCH_CONCURRENCY must be a valid positive integer")?;
        }

        if let Some(val) = lookup("RESEARCH_BREADTH") {
            config.breadth = val
                .parse()
                .context("RESEARCH_BREADTH must be a valid positive integer")?;
        }

        if let Some(val) = lookup("RESEARCH_DEPTH") {
            config.depth = val
                .parse()
                .context("RESEARCH_DEPTH must be a valid non-negative integer")?;
        }

        if let Some(val) = lookup("RESULTS_PER_QUERY") {
            config.results_per_query = val
                .parse()
                .context("RESULTS_PER_QUERY must be a valid positive integer")?;
        }

        if let Some(val) = lookup("MAX_LEARNINGS") {
            config.max_learnings = val
                .parse()
                .context("MAX_LEARNINGS must be a valid positive integer")?;
        }

        if let Some(val) = lookup("MAX_FOLLOW_UPS") {
            config.max_follow_ups = val
                .parse()
                .context("MAX_FOLLOW_UPS must be a valid non-negative integer")?;
        }

        if let Some(val) = lookup("MAX_CONTENT_CHARS") {
            config.max_content_chars = val
                .parse()
                .context("MAX_CONTENT_CHARS must be a valid positive integer")?;
        }

        if let Some(val) = lookup("REPORTS_DIR") {
            config.reports_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("RUST_LOG") {
            config.log_level = val;
        }

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Fails fast with a clear message before any network call is made.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            anyhow::bail!("RESEARCH_CONCURRENCY must be at least 1");
        }

        if self.breadth == 0 {
            anyhow::bail!("RESEARCH_BREADTH must be at least 1");
        }

        if self.results_per_query == 0 {
            anyhow::bail!("RESULTS_PER_QUERY must be at least 1");
        }

        if self.max_learnings == 0 {
            anyhow::bail!("MAX_LEARNINGS must be at least 1");
        }

        if self.max_content_chars == 0 {
            anyhow::bail!("MAX_CONTENT_CHARS must be at least 1");
        }

        if self.model.is_empty() {
            anyhow::bail!("LLM_MODEL cannot be empty");
        }

        Ok(())
    }

    /// Whether search goes to a self-hosted Firecrawl instance.
    pub fn is_self_hosted_firecrawl(&self) -> bool {
        self.firecrawl_base_url.trim_end_matches('/') != DEFAULT_FIRECRAWL_BASE_URL
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.provider, LlmProvider::OpenAi);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.breadth, 3);
        assert_eq!(config.depth, 2);
        assert_eq!(config.results_per_query, 2);
        assert_eq!(config.max_learnings, 2);
        assert_eq!(config.max_follow_ups, 2);
        assert_eq!(config.max_content_chars, 25_000);
        assert!(!config.is_self_hosted_firecrawl());
    }

    #[test]
    fn test_config_validation_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_concurrency() {
        let config = Config {
            concurrency: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_breadth() {
        let config = Config {
            breadth: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_depth_is_valid() {
        let config = Config {
            depth: 0,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("LLM_PROVIDER", "Ollama"),
            ("LLM_MODEL", "llama3.2"),
            ("OPENAI_API_KEY", "sk-fallback"),
            ("FIRECRAWL_KEY", "fc-key"),
            ("FIRECRAWL_BASE_URL", "http://localhost:3002"),
            ("RESEARCH_CONCURRENCY", "4"),
            ("RESEARCH_DEPTH", "3"),
        ]))
        .unwrap();

        assert_eq!(config.provider, LlmProvider::Ollama);
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-fallback"));
        assert_eq!(config.firecrawl_api_key.as_deref(), Some("fc-key"));
        assert!(config.is_self_hosted_firecrawl());
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.depth, 3);
    }

    #[test]
    fn test_openai_key_preferred_over_fallback() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_KEY", "sk-primary"),
            ("OPENAI_API_KEY", "sk-fallback"),
        ]))
        .unwrap();

        assert_eq!(config.openai_api_key.as_deref(), Some("sk-primary"));
    }

    #[test]
    fn test_empty_firecrawl_base_url_keeps_default() {
        let config = Config::from_lookup(lookup_from(&[("FIRECRAWL_BASE_URL", "")])).unwrap();
        assert_eq!(config.firecrawl_base_url, DEFAULT_FIRECRAWL_BASE_URL);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("RESEARCH_BREADTH", "wide")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("LLM_PROVIDER", "gemini")]));
        assert!(result.is_err());
    }
}
