//! Remote node abstraction.
//!
//! # Responsibilities
//! - Represent a single audio node known to the registry
//! - Track reachability (open/closed) and administrative availability
//! - Hold the node's latest stats snapshot, swapped atomically on report

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::node::stats::NodeStats;

/// Opaque node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// A single remote audio node.
#[derive(Debug)]
pub struct Node {
    /// The node's identity.
    pub id: NodeId,
    /// Where the transport layer reaches the node. Informational only.
    pub address: String,

    open: AtomicBool,
    available: AtomicBool,
    stats: ArcSwapOption<NodeStats>,
}

impl Node {
    /// Create a closed, available node with no stats.
    pub fn new(id: impl Into<NodeId>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            open: AtomicBool::new(false),
            available: AtomicBool::new(true),
            stats: ArcSwapOption::empty(),
        }
    }

    /// Whether the transport to this node is currently open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Set the open flag, returning the previous value.
    pub(crate) fn set_open(&self, open: bool) -> bool {
        self.open.swap(open, Ordering::AcqRel)
    }

    /// Whether the node is administratively available.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Latest stats snapshot, if the node has reported.
    pub fn stats(&self) -> Option<Arc<NodeStats>> {
        self.stats.load_full()
    }

    /// Replace the stats snapshot wholesale.
    pub fn update_stats(&self, stats: NodeStats) {
        self.stats.store(Some(Arc::new(stats)));
    }

    /// Forget the stats snapshot (e.g. after a node restart).
    pub fn clear_stats(&self) {
        self.stats.store(None);
    }
}
