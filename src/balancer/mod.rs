//! Node selection and session reassignment.
//!
//! # Data Flow
//! ```text
//! Session needs a node:
//!     selector.rs (select_node)
//!     → registry snapshot + provider snapshot
//!     → penalty::compute for each node
//!     → lowest total wins (first wins on ties)
//!     → Selection::Node / Selection::Unavailable / NoNodesAvailable
//!
//! Connectivity change:
//!     NodeEvent on registry broadcast
//!     → reassign.rs (Reassigner::run)
//!     → session table release / claim
//!     → SessionNotice to the orchestrator
//! ```
//!
//! # Design Decisions
//! - Selection is synchronous and reads only cached state
//! - An unreachable best node is a result, not an error; callers retry
//! - Connect events claim every orphaned session greedily, without scoring

pub mod reassign;
pub mod selector;

pub use reassign::{Reassigner, SessionNotice};
pub use selector::LoadBalancer;

use std::sync::Arc;
use thiserror::Error;

use crate::node::Node;

/// Errors raised by node selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalancerError {
    /// The registry holds no nodes at all. Points at a deployment problem;
    /// selection does not wait for one to show up.
    #[error("No available nodes")]
    NoNodesAvailable,
}

/// Outcome of a selection pass over a non-empty registry.
#[derive(Debug, Clone)]
pub enum Selection {
    /// The lowest-penalty node, ready to host the session.
    Node(Arc<Node>),
    /// The lowest-penalty node is not open right now. Callers retry later
    /// instead of settling for a worse node.
    Unavailable(Arc<Node>),
}

impl Selection {
    /// The selected node, if it can be used.
    pub fn node(&self) -> Option<&Arc<Node>> {
        match self {
            Selection::Node(node) => Some(node),
            Selection::Unavailable(_) => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, Selection::Node(_))
    }

    fn outcome(&self) -> &'static str {
        match self {
            Selection::Node(_) => "selected",
            Selection::Unavailable(_) => "unavailable",
        }
    }
}
