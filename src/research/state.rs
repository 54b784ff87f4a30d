//! Research accumulator, recursion budget and sibling aggregation.
//!
//! [`ResearchState`] is threaded down the recursion by value: a branch never
//! edits the state it was handed, it builds an extended copy for its child.
//! Two concurrent branches therefore never touch the same value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ResearchError;

/// Learnings and visited URLs gathered so far.
///
/// Both fields are sets, so duplicates are impossible by construction.
/// `BTreeSet` keeps report output stable between runs; ordering carries no
/// meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchState {
    pub learnings: BTreeSet<String>,
    pub visited: BTreeSet<String>,
}

impl ResearchState {
    pub fn new<L, V>(learnings: L, visited: V) -> Self
    where
        L: IntoIterator,
        L::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Self {
            learnings: learnings.into_iter().map(Into::into).collect(),
            visited: visited.into_iter().map(Into::into).collect(),
        }
    }

    /// A new state holding everything in `self` plus the given items.
    pub fn extended<L, V>(&self, learnings: L, visited: V) -> Self
    where
        L: IntoIterator<Item = String>,
        V: IntoIterator<Item = String>,
    {
        let mut next = self.clone();
        next.learnings.extend(learnings);
        next.visited.extend(visited);
        next
    }

    pub fn is_empty(&self) -> bool {
        self.learnings.is_empty() && self.visited.is_empty()
    }

    /// Learnings as a list, for prompts.
    pub fn learnings_list(&self) -> Vec<String> {
        self.learnings.iter().cloned().collect()
    }
}

/// Merge the states returned by sibling branches.
///
/// Plain set union: no ranking, weighting or truncation.
pub fn aggregate<I>(states: I) -> ResearchState
where
    I: IntoIterator<Item = ResearchState>,
{
    states
        .into_iter()
        .fold(ResearchState::default(), |mut merged, state| {
            merged.learnings.extend(state.learnings);
            merged.visited.extend(state.visited);
            merged
        })
}

/// Breadth and depth left for a research call.
///
/// Depth drops by one per level and is the only thing that ends recursion.
/// Breadth halves (rounding up) and bottoms out at 1, never at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursionBudget {
    pub breadth: usize,
    pub depth: usize,
}

impl RecursionBudget {
    pub fn new(breadth: usize, depth: usize) -> Result<Self, ResearchError> {
        if breadth == 0 {
            return Err(ResearchError::InvalidInput(
                "breadth must be at least 1".to_string(),
            ));
        }
        Ok(Self { breadth, depth })
    }

    pub fn is_terminal(&self) -> bool {
        self.depth == 0
    }

    /// Budget handed to the children of a branch at this level.
    ///
    /// Must not be called on a terminal budget.
    pub fn next(&self) -> Self {
        Self {
            breadth: self.breadth.div_ceil(2),
            depth: self.depth.saturating_sub(1),
        }
    }
}
