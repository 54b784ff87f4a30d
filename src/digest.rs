//! # Digest Module
//!
//! Condenses the pages found for one query into short learnings and the
//! follow-up questions that seed the next level of research.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::completion::{CompletionError, RetryingCompletion};
use crate::prompts;
use crate::usage::ToolUsageLog;

/// What one query's search results taught us.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub learnings: Vec<String>,
    pub follow_up_questions: Vec<String>,
}

#[async_trait]
pub trait Digester: Send + Sync {
    async fn digest(
        &self,
        query: &str,
        snippets: &[String],
        max_learnings: usize,
        max_follow_ups: usize,
    ) -> Result<Digest, CompletionError>;
}

/// LLM-backed digester.
pub struct LlmDigester {
    completion: RetryingCompletion,
    usage: ToolUsageLog,
}

impl LlmDigester {
    pub fn new(completion: RetryingCompletion, usage: ToolUsageLog) -> Self {
        Self { completion, usage }
    }
}

#[async_trait]
impl Digester for LlmDigester {
    async fn digest(
        &self,
        query: &str,
        snippets: &[String],
        max_learnings: usize,
        max_follow_ups: usize,
    ) -> Result<Digest, CompletionError> {
        self.usage.record(format!(
            "digest_search_result(q={}, snippets=[{} items], max_learn={}, max_follow={})",
            query,
            snippets.len(),
            max_learnings,
            max_follow_ups
        ));

        let prompt = prompts::digest(query, snippets, max_learnings, max_follow_ups);
        let digest: Digest = self
            .completion
            .complete(prompts::DIGEST_SYSTEM, &prompt)
            .await?;

        debug!(
            query = %query,
            learnings = digest.learnings.len(),
            follow_ups = digest.follow_up_questions.len(),
            "Digested search results"
        );

        Ok(digest)
    }
}
