//! # Agent Module
//!
//! Wires the production collaborators (Rig completions, Firecrawl search)
//! into a [`DeepResearcher`] according to the [`Config`].
//!
//! Credentials are checked here, while building the collaborators; the
//! research core itself never looks at them.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::completion::{RetryPolicy, RetryingCompletion, RigCompletion};
use crate::config::Config;
use crate::digest::LlmDigester;
use crate::error::ResearchError;
use crate::queries::LlmQueryGenerator;
use crate::report;
use crate::research::{BranchLimits, DeepResearcher, ResearchState};
use crate::tools::FirecrawlSearch;
use crate::usage::ToolUsageLog;

// =============================================================================
// RESEARCH AGENT STRUCT
// =============================================================================
/// The research agent: configuration plus a fully wired researcher.
///
/// # Rust Concept: Struct Ownership
///
/// The agent owns its `Config` and its `DeepResearcher`; the usage log is
/// a cheap shared handle also held by every collaborator.
pub struct ResearchAgent {
    config: Config,
    researcher: DeepResearcher,
    usage: ToolUsageLog,
}

impl ResearchAgent {
    /// Build all collaborators from the configuration.
    ///
    /// Fails with [`ResearchError::MissingCredential`] when a required API
    /// key is absent.
    pub fn new(config: Config) -> Result<Self, ResearchError> {
        let usage = ToolUsageLog::new();

        let backend = Arc::new(RigCompletion::from_config(&config)?);
        let completion = RetryingCompletion::new(backend, RetryPolicy::default(), usage.clone());
        let search = FirecrawlSearch::from_config(&config, usage.clone())?;

        debug!(
            provider = ?config.provider,
            model = %config.model,
            firecrawl = %config.firecrawl_base_url,
            "Collaborators configured"
        );

        let researcher = DeepResearcher::new(
            Arc::new(LlmQueryGenerator::new(completion.clone(), usage.clone())),
            Arc::new(search),
            Arc::new(LlmDigester::new(completion, usage.clone())),
        )
        .with_limits(BranchLimits {
            results_per_query: config.results_per_query,
            max_learnings: config.max_learnings,
            max_follow_ups: config.max_follow_ups,
        })
        .with_concurrency(config.concurrency);

        Ok(Self {
            config,
            researcher,
            usage,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn usage(&self) -> &ToolUsageLog {
        &self.usage
    }

    /// Research a topic with the configured breadth and depth.
    pub async fn research(&self, topic: &str) -> Result<ResearchState, ResearchError> {
        info!(topic = %topic, "Starting research task");
        self.researcher
            .deep_research(topic, self.config.breadth, self.config.depth)
            .await
    }

    /// Save a finished result under the configured reports directory.
    pub fn save_report(&self, topic: &str, state: &ResearchState) -> Result<PathBuf, ResearchError> {
        report::save_report(&self.config.reports_dir, topic, state)
    }
}
