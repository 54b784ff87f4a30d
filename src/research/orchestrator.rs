//! Recursive breadth/depth-bounded research.
//!
//! Each level asks the query generator for up to `breadth` queries, runs one
//! branch per query, and merges what the branches bring back. A branch
//! searches, digests, then recurses one level deeper with half the breadth.
//!
//! Failure handling is deliberately asymmetric:
//! - search and digest failures are absorbed by the branch, which then
//!   contributes nothing and does not recurse;
//! - query-generation failures propagate out of the level that made the call,
//!   and from there out of every ancestor.

use futures::future::{join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::gate::ConcurrencyGate;
use super::state::{aggregate, RecursionBudget, ResearchState};
use crate::digest::{Digest, Digester};
use crate::error::ResearchError;
use crate::queries::{Query, QueryGenerator};
use crate::tools::SearchProvider;

/// Per-branch request sizes, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchLimits {
    /// Hits requested from the search provider
    pub results_per_query: usize,
    pub max_learnings: usize,
    pub max_follow_ups: usize,
}

impl Default for BranchLimits {
    fn default() -> Self {
        Self {
            results_per_query: 2,
            max_learnings: 2,
            max_follow_ups: 2,
        }
    }
}

/// What a branch keeps from a successful search + digest.
struct Exploration {
    urls: Vec<String>,
    digest: Digest,
}

/// Drives the recursive research tree over the three collaborators.
///
/// The collaborators are shared read-only by every branch; the only shared
/// runtime object is the [`ConcurrencyGate`] created per top-level call.
pub struct DeepResearcher {
    queries: Arc<dyn QueryGenerator>,
    search: Arc<dyn SearchProvider>,
    digester: Arc<dyn Digester>,
    limits: BranchLimits,
    concurrency: usize,
}

impl DeepResearcher {
    pub fn new(
        queries: Arc<dyn QueryGenerator>,
        search: Arc<dyn SearchProvider>,
        digester: Arc<dyn Digester>,
    ) -> Self {
        Self {
            queries,
            search,
            digester,
            limits: BranchLimits::default(),
            concurrency: 2,
        }
    }

    pub fn with_limits(mut self, limits: BranchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Capacity of the gate built for each top-level call.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Research `topic` from scratch.
    pub async fn deep_research(
        &self,
        topic: &str,
        breadth: usize,
        depth: usize,
    ) -> Result<ResearchState, ResearchError> {
        self.deep_research_from(topic, breadth, depth, ResearchState::default())
            .await
    }

    /// Research `topic`, starting from already gathered learnings and URLs.
    ///
    /// With `depth == 0` the given state comes back unchanged and no
    /// collaborator is called.
    pub async fn deep_research_from(
        &self,
        topic: &str,
        breadth: usize,
        depth: usize,
        state: ResearchState,
    ) -> Result<ResearchState, ResearchError> {
        if topic.trim().is_empty() {
            return Err(ResearchError::InvalidInput("topic must not be empty".to_string()));
        }
        let budget = RecursionBudget::new(breadth, depth)?;

        let gate = ConcurrencyGate::new(self.concurrency);
        info!(
            topic = %topic,
            breadth,
            depth,
            concurrency = gate.capacity(),
            "Starting deep research"
        );

        let result = self.expand(topic.to_string(), budget, state, &gate).await?;

        info!(
            learnings = result.learnings.len(),
            visited = result.visited.len(),
            "Deep research finished"
        );
        Ok(result)
    }

    /// One level of the tree: generate, fan out, wait for all, merge.
    ///
    /// Boxed because it recurses through [`Self::handle_branch`].
    fn expand<'a>(
        &'a self,
        topic: String,
        budget: RecursionBudget,
        state: ResearchState,
        gate: &'a ConcurrencyGate,
    ) -> BoxFuture<'a, Result<ResearchState, ResearchError>> {
        async move {
            if budget.is_terminal() {
                return Ok(state);
            }

            let queries = self.generate_queries(&topic, &state, budget.breadth).await?;
            let child_budget = budget.next();
            debug!(
                depth = budget.depth,
                branches = queries.len(),
                "Fanning out research branches"
            );

            let branches = queries
                .into_iter()
                .map(|query| self.handle_branch(query, child_budget, &state, gate));

            // join_all polls every branch to completion before returning, so a
            // failing subtree never cancels its siblings.
            let children = join_all(branches)
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;

            Ok(aggregate(children))
        }
        .boxed()
    }

    /// Query generation. Failures are logged and passed up, never absorbed.
    async fn generate_queries(
        &self,
        topic: &str,
        state: &ResearchState,
        breadth: usize,
    ) -> Result<Vec<Query>, ResearchError> {
        let prior = state.learnings_list();
        match self.queries.generate(topic, &prior, breadth).await {
            Ok(queries) => Ok(queries),
            Err(e) => {
                error!(topic = %topic, error = %e, "Query generation failed");
                Err(ResearchError::QueryGeneration(e))
            }
        }
    }

    /// Run one branch: gated search + digest, then recurse one level down.
    ///
    /// The gate slot covers the branch's own network work. It is released
    /// before the recursive call, since children of this branch draw slots
    /// from the same gate.
    async fn handle_branch(
        &self,
        query: Query,
        budget: RecursionBudget,
        parent: &ResearchState,
        gate: &ConcurrencyGate,
    ) -> Result<ResearchState, ResearchError> {
        let exploration = {
            let _permit = match gate.enter().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(query = %query.text, error = %e, "Concurrency gate closed");
                    return Ok(ResearchState::default());
                }
            };

            match self.explore(&query).await {
                Some(exploration) => exploration,
                None => return Ok(ResearchState::default()),
            }
        };

        let topic = next_topic(&query, &exploration.digest);
        let child_state = parent.extended(exploration.digest.learnings, exploration.urls);

        self.expand(topic, budget, child_state, gate).await
    }

    /// Search and digest one query. Any failure is logged and becomes `None`.
    async fn explore(&self, query: &Query) -> Option<Exploration> {
        let hits = match self
            .search
            .search(&query.text, self.limits.results_per_query)
            .await
        {
            Ok(hits) => hits,
            Err(e) if e.is_rate_limit() => {
                warn!(query = %query.text, "Search rate limit hit, skipping branch");
                return None;
            }
            Err(e) => {
                error!(query = %query.text, error = %e, "Search failed, skipping branch");
                return None;
            }
        };

        let (snippets, urls): (Vec<String>, Vec<String>) = hits
            .into_iter()
            .map(|hit| (hit.content, hit.source_url))
            .unzip();

        let digest = match self
            .digester
            .digest(
                &query.text,
                &snippets,
                self.limits.max_learnings,
                self.limits.max_follow_ups,
            )
            .await
        {
            Ok(digest) => digest,
            Err(e) => {
                error!(query = %query.text, error = %e, "Digest failed, skipping branch");
                return None;
            }
        };

        Some(Exploration { urls, digest })
    }
}

/// The research goal followed by the digest's follow-up questions.
pub fn next_topic(query: &Query, digest: &Digest) -> String {
    std::iter::once(query.research_goal.as_str())
        .chain(digest.follow_up_questions.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}
