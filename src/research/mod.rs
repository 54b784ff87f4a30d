//! Research Module
//!
//! The recursive research tree and its supporting types.
//!
//! ```text
//! deep_research(topic, breadth, depth)
//!   └─ generate ≤ breadth queries
//!        ├─ branch q1: [gate] search → digest [/gate] → deep_research(next topic, ⌈breadth/2⌉, depth-1)
//!        ├─ branch q2: ...
//!        └─ branch qN: ...
//!   └─ union of every branch's learnings and visited URLs
//! ```
//!
//! # Module Structure
//!
//! - `state` - accumulator, recursion budget and aggregation
//! - `gate` - concurrency gate shared by the whole tree
//! - `orchestrator` - the recursive controller and branch worker

mod gate;
mod orchestrator;
mod state;

pub use gate::ConcurrencyGate;
pub use orchestrator::{next_topic, BranchLimits, DeepResearcher};
pub use state::{aggregate, RecursionBudget, ResearchState};
