//! # Deep Research Agent
//!
//! Expands a research topic into a bounded tree of sub-queries, explores each
//! one through web search and LLM digestion, and merges what was learned.
//!
//! - [`research`] holds the recursive core: breadth/depth budget, the shared
//!   concurrency gate, per-branch failure absorption and aggregation.
//! - [`queries`], [`digest`] and [`tools`] are the collaborators, each behind
//!   a trait so the core can run against mocks.
//! - [`completion`] is the retrying structured-output LLM call both LLM
//!   collaborators build on.
//! - [`agent`] wires everything from a [`config::Config`].

/// Production wiring
pub mod agent;

/// Retrying structured completions
pub mod completion;

/// Configuration management
pub mod config;

/// Search result digestion
pub mod digest;

pub mod error;

pub mod prompts;

/// Sub-query generation
pub mod queries;

/// JSON report persistence
pub mod report;

/// Recursive research core
pub mod research;

/// Web search
pub mod tools;

pub mod usage;

pub use agent::ResearchAgent;
pub use config::Config;
pub use error::ResearchError;
pub use research::{DeepResearcher, ResearchState};
