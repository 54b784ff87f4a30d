//! # Query Generation
//!
//! Turns a topic plus prior findings into a handful of search queries,
//! each carrying the research goal that motivates it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::completion::{CompletionError, RetryingCompletion};
use crate::prompts;
use crate::usage::ToolUsageLog;

/// A single sub-query to explore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Search string sent to the search provider
    #[serde(rename = "query")]
    pub text: String,

    /// What answering this query should move forward
    pub research_goal: String,
}

impl Query {
    pub fn new(text: impl Into<String>, research_goal: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            research_goal: research_goal.into(),
        }
    }
}

/// Structured output shape requested from the model.
#[derive(Debug, Deserialize)]
pub struct SearchBatch {
    pub queries: Vec<Query>,
}

#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Produce at most `n` queries for `topic`.
    async fn generate(
        &self,
        topic: &str,
        prior_learnings: &[String],
        n: usize,
    ) -> Result<Vec<Query>, CompletionError>;
}

/// LLM-backed query generator.
pub struct LlmQueryGenerator {
    completion: RetryingCompletion,
    usage: ToolUsageLog,
}

impl LlmQueryGenerator {
    pub fn new(completion: RetryingCompletion, usage: ToolUsageLog) -> Self {
        Self { completion, usage }
    }
}

#[async_trait]
impl QueryGenerator for LlmQueryGenerator {
    async fn generate(
        &self,
        topic: &str,
        prior_learnings: &[String],
        n: usize,
    ) -> Result<Vec<Query>, CompletionError> {
        self.usage
            .record(format!("generate_search_queries(topic={}, n={})", topic, n));

        let prompt = prompts::query_generation(topic, prior_learnings, n);
        let batch: SearchBatch = self
            .completion
            .complete(prompts::QUERY_GENERATION_SYSTEM, &prompt)
            .await?;

        // The model may return more than asked for.
        let mut queries = batch.queries;
        queries.truncate(n);
        debug!(topic = %topic, count = queries.len(), "Generated queries");

        Ok(queries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionBackend, RetryPolicy};
    use std::sync::{Arc, Mutex};

    struct FixedBackend {
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        async fn complete(&self, _system: &str, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.answer.clone())
        }
    }

    fn generator(answer: &str) -> (LlmQueryGenerator, Arc<FixedBackend>, ToolUsageLog) {
        let backend = Arc::new(FixedBackend {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        });
        let usage = ToolUsageLog::new();
        let completion =
            RetryingCompletion::new(backend.clone(), RetryPolicy::immediate(1), usage.clone());
        (LlmQueryGenerator::new(completion, usage.clone()), backend, usage)
    }

    #[test]
    fn test_query_wire_names() {
        let query: Query =
            serde_json::from_str(r#"{"query": "rust", "research_goal": "learn"}"#).unwrap();
        assert_eq!(query, Query::new("rust", "learn"));
    }

    #[tokio::test]
    async fn test_truncates_to_requested_count() {
        let (generator, _, _) = generator(
            r#"{"queries": [
                {"query": "a", "research_goal": "ga"},
                {"query": "b", "research_goal": "gb"},
                {"query": "c", "research_goal": "gc"}
            ]}"#,
        );

        let queries = generator.generate("topic", &[], 2).await.unwrap();

        assert_eq!(queries, vec![Query::new("a", "ga"), Query::new("b", "gb")]);
    }

    #[tokio::test]
    async fn test_prompt_includes_prior_learnings_and_usage_is_recorded() {
        let (generator, backend, usage) = generator(r#"{"queries": []}"#);

        let queries = generator
            .generate("topic", &["known fact".to_string()], 3)
            .await
            .unwrap();

        assert!(queries.is_empty());
        assert!(backend.prompts.lock().unwrap()[0].contains("known fact"));
        assert_eq!(
            usage.entries()[0],
            "generate_search_queries(topic=topic, n=3)"
        );
    }

    #[tokio::test]
    async fn test_malformed_output_is_validation_error() {
        let (generator, _, _) = generator(r#"{"items": []}"#);

        let err = generator.generate("topic", &[], 3).await.unwrap_err();

        assert!(matches!(err, CompletionError::MalformedOutput(_)));
    }
}
