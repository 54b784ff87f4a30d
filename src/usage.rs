//! # Tool Usage Log
//!
//! An append-only record of every collaborator invocation made during a run.
//! It is printed as a summary once research finishes.
//!
//! The log is purely observational: nothing in the research algorithm reads
//! it, so sharing it behind a mutex does not introduce any coupling between
//! concurrent branches.

use std::sync::{Arc, Mutex};
use tracing::info;

/// Shared, cloneable handle to the usage log.
///
/// # Rust Concept: Arc<Mutex<T>>
///
/// `Arc` gives every collaborator its own handle to the same log, and the
/// `Mutex` serialises appends coming from concurrently running branches.
#[derive(Debug, Clone, Default)]
pub struct ToolUsageLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ToolUsageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry and echo it to the log output.
    pub fn record(&self, entry: impl Into<String>) {
        let entry = entry.into();
        info!("[TOOL] {}", entry);

        // A poisoned lock only means another branch panicked mid-append;
        // the entries themselves are still valid.
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push(entry);
    }

    /// Snapshot of all entries in the order they were recorded.
    pub fn entries(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the numbered summary printed at the end of a run.
    pub fn summary(&self) -> String {
        let mut out = String::from("=== TOOL USAGE SUMMARY ===");
        for (i, entry) in self.entries().iter().enumerate() {
            out.push_str(&format!("\n{}. {}", i + 1, entry));
        }
        out
    }
}
