//! # Completion Module
//!
//! Structured-output LLM calls with bounded, jittered retry.
//!
//! - [`CompletionBackend`] is the raw "system + prompt -> text" seam. The
//!   production implementation, [`RigCompletion`], talks to OpenAI or Ollama
//!   through Rig.
//! - [`RetryingCompletion`] asks the backend for JSON, parses it into the
//!   caller's schema type with serde, and retries failed attempts with
//!   randomized exponential backoff.

use async_trait::async_trait;
use rand::Rng;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::{ollama, openai};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, LlmProvider};
use crate::error::ResearchError;
use crate::usage::ToolUsageLog;

// =============================================================================
// ERRORS
// =============================================================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// Transport or provider failure (timeouts, 5xx, refused connections).
    #[error("Completion service failed: {0}")]
    Service(String),

    /// The model answered, but not with the requested JSON shape.
    #[error("Malformed structured output: {0}")]
    MalformedOutput(String),

    #[error("Completion service returned an empty response")]
    EmptyResponse,
}

impl CompletionError {
    /// Every completion failure is worth another attempt: a transient
    /// service error may clear, and a resampled answer may parse.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::Service(_)
                | CompletionError::MalformedOutput(_)
                | CompletionError::EmptyResponse
        )
    }
}

// =============================================================================
// RETRY POLICY
// =============================================================================
/// Randomized exponential backoff.
///
/// After the n-th failed attempt the wait is drawn uniformly from
/// `[min_wait, clamp(multiplier * 2^(n-1), min_wait, max_wait)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub min_wait: Duration,
    pub max_wait: Duration,
    pub multiplier: Duration,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_wait: Duration::from_secs(2),
            max_wait: Duration::from_secs(8),
            multiplier: Duration::from_secs(1),
            max_attempts: 4,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without sleeping. Used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
            multiplier: Duration::ZERO,
            max_attempts,
        }
    }

    /// Upper bound of the wait after `failed_attempt` (1-based) failures.
    pub fn upper_bound(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        let grown = self.multiplier.saturating_mul(1u32 << exponent);
        grown.clamp(self.min_wait, self.max_wait.max(self.min_wait))
    }

    /// Draw the jittered wait after `failed_attempt` failures.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let low = self.min_wait.as_millis() as u64;
        let high = self.upper_bound(failed_attempt).as_millis() as u64;
        if high <= low {
            return Duration::from_millis(low);
        }
        Duration::from_millis(rand::thread_rng().gen_range(low..=high))
    }
}

// =============================================================================
// BACKEND TRAIT
// =============================================================================
/// One raw completion round-trip.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError>;
}

/// Rig-backed completion client.
///
/// # Rust Concept: Enums Carrying Data
///
/// Each Rig provider has its own client type, so the enum holds whichever
/// one was configured and `complete` dispatches with a `match`.
pub enum RigCompletion {
    OpenAi { client: openai::Client, model: String },
    Ollama { client: ollama::Client, model: String },
}

impl RigCompletion {
    /// Build the configured provider client.
    ///
    /// Fails with [`ResearchError::MissingCredential`] when the OpenAI
    /// provider is selected without an API key.
    pub fn from_config(config: &Config) -> Result<Self, ResearchError> {
        match config.provider {
            LlmProvider::OpenAi => {
                let api_key = config
                    .openai_api_key
                    .clone()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| ResearchError::missing_credential("OPENAI_KEY"))?;
                Ok(RigCompletion::OpenAi {
                    client: openai::Client::from_val(api_key.into()),
                    model: config.model.clone(),
                })
            }
            LlmProvider::Ollama => {
                // Rig's Ollama client reads its base URL from the environment.
                std::env::set_var("OLLAMA_API_BASE_URL", &config.ollama_host);
                debug!(host = %config.ollama_host, model = %config.model, "Using Ollama");
                Ok(RigCompletion::Ollama {
                    client: ollama::Client::from_env(),
                    model: config.model.clone(),
                })
            }
        }
    }
}

#[async_trait]
impl CompletionBackend for RigCompletion {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError> {
        let response = match self {
            RigCompletion::OpenAi { client, model } => {
                let agent = client.agent(model).preamble(system).build();
                agent.prompt(prompt).await
            }
            RigCompletion::Ollama { client, model } => {
                let agent = client.agent(model).preamble(system).build();
                agent.prompt(prompt).await
            }
        };

        response.map_err(|e| CompletionError::Service(e.to_string()))
    }
}

// =============================================================================
// RETRYING STRUCTURED COMPLETION
// =============================================================================
/// Structured-output request wrapper shared by the query generator and the
/// digester.
#[derive(Clone)]
pub struct RetryingCompletion {
    backend: Arc<dyn CompletionBackend>,
    policy: RetryPolicy,
    usage: ToolUsageLog,
}

impl RetryingCompletion {
    pub fn new(backend: Arc<dyn CompletionBackend>, policy: RetryPolicy, usage: ToolUsageLog) -> Self {
        Self {
            backend,
            policy,
            usage,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Request a completion and parse it into `T`.
    ///
    /// On exhaustion the last attempt's error is returned unchanged.
    pub async fn complete<T>(&self, system: &str, prompt: &str) -> Result<T, CompletionError>
    where
        T: DeserializeOwned,
    {
        let schema = short_type_name::<T>();
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            self.usage.record(format!("llm_complete(schema={})", schema));

            let result = match self.backend.complete(system, prompt).await {
                Ok(raw) => parse_structured::<T>(&raw),
                Err(e) => Err(e),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        schema,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Completion failed, will retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(schema, attempt, error = %e, "Completion failed, giving up");
                    return Err(e);
                }
            }
        }
    }
}

/// Parse a model answer into `T`, tolerating markdown fences and prose
/// around the JSON object.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, CompletionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CompletionError::EmptyResponse);
    }

    let json = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };

    serde_json::from_str(json).map_err(|e| CompletionError::MalformedOutput(e.to_string()))
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
