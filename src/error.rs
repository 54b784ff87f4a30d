//! # Error Module
//!
//! Errors that cross the boundary of the research orchestrator.
//!
//! Collaborator-specific errors live next to their collaborators
//! ([`CompletionError`] in `completion`, [`SearchError`] in `tools`).
//! This module only holds the errors the orchestrator itself can return
//! to its caller.

use thiserror::Error;

use crate::completion::CompletionError;

/// Failures that escape a `deep_research` call.
///
/// Search and digest failures never appear here: they are absorbed at the
/// branch boundary. Query generation is the one collaborator call whose
/// failure is allowed to travel all the way up.
#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("Failed to generate search queries: {0}")]
    QueryGeneration(#[from] CompletionError),

    #[error("Invalid research input: {0}")]
    InvalidInput(String),

    /// Raised while constructing collaborators, never by the orchestrator.
    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    #[error("Failed to write report: {0}")]
    Report(String),
}

impl ResearchError {
    pub fn missing_credential(var: impl Into<String>) -> Self {
        ResearchError::MissingCredential { var: var.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_names_variable() {
        let err = ResearchError::missing_credential("OPENAI_KEY");
        assert!(err.to_string().contains("OPENAI_KEY"));
    }

    #[test]
    fn test_query_generation_wraps_completion_error() {
        let err: ResearchError = CompletionError::MalformedOutput("bad json".to_string()).into();
        assert!(matches!(err, ResearchError::QueryGeneration(_)));
        assert!(err.to_string().contains("bad json"));
    }
}
