//! Penalty breakdown for one (node, session) pair.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::node::{Node, NodeId};
use crate::session::SessionId;

/// Total assigned to a node that has never reported stats.
///
/// One below the maximum, so a real minimum search always finds a node.
pub const NO_STATS_PENALTY: i32 = i32::MAX - 1;

/// Computed penalties of a node for a candidate session.
///
/// Built by the penalty calculator; providers observe it while it is being
/// built, everyone else gets the finished value.
#[derive(Debug, Clone)]
pub struct Penalties {
    pub(crate) node: Arc<Node>,
    pub(crate) session: SessionId,
    pub(crate) has_stats: bool,
    pub(crate) player: i32,
    pub(crate) cpu: i32,
    pub(crate) deficit_frame: i32,
    pub(crate) null_frame: i32,
    pub(crate) custom: i32,
}

impl Penalties {
    pub(crate) fn empty(node: Arc<Node>, session: SessionId) -> Self {
        Self {
            node,
            session,
            has_stats: false,
            player: 0,
            cpu: 0,
            deficit_frame: 0,
            null_frame: 0,
            custom: 0,
        }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn player_penalty(&self) -> i32 {
        self.player
    }

    pub fn cpu_penalty(&self) -> i32 {
        self.cpu
    }

    pub fn deficit_frame_penalty(&self) -> i32 {
        self.deficit_frame
    }

    pub fn null_frame_penalty(&self) -> i32 {
        self.null_frame
    }

    /// Sum contributed by penalty providers. While a provider runs this is
    /// the sum of the providers before it.
    pub fn custom_penalty(&self) -> i32 {
        self.custom
    }

    /// Sum of every component, or [`NO_STATS_PENALTY`] for a node without stats.
    pub fn total(&self) -> i32 {
        if !self.has_stats {
            return NO_STATS_PENALTY;
        }
        self.player
            .saturating_add(self.cpu)
            .saturating_add(self.deficit_frame)
            .saturating_add(self.null_frame)
            .saturating_add(self.custom)
    }

    /// Serializable view for diagnostics output.
    pub fn report(&self) -> PenaltyReport {
        PenaltyReport {
            node: self.node.id.clone(),
            session: self.session.0,
            open: self.node.is_open(),
            available: self.node.is_available(),
            has_stats: self.has_stats,
            player: self.player,
            cpu: self.cpu,
            deficit_frame: self.deficit_frame,
            null_frame: self.null_frame,
            custom: self.custom,
            total: self.total(),
        }
    }
}

impl fmt::Display for Penalties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.node.is_available() {
            return write!(f, "Penalties{{unavailable={}}}", NO_STATS_PENALTY);
        }
        write!(
            f,
            "Penalties{{total={}, playerPenalty={}, cpuPenalty={}, deficitFramePenalty={}, nullFramePenalty={}, custom={}}}",
            self.total(),
            self.player,
            self.cpu,
            self.deficit_frame,
            self.null_frame,
            self.custom
        )
    }
}

/// Flattened penalty breakdown, as printed by the diagnostics binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltyReport {
    pub node: NodeId,
    pub session: u64,
    pub open: bool,
    pub available: bool,
    pub has_stats: bool,
    pub player: i32,
    pub cpu: i32,
    pub deficit_frame: i32,
    pub null_frame: i32,
    pub custom: i32,
    pub total: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn penalties(node: Node) -> Penalties {
        let mut p = Penalties::empty(Arc::new(node), SessionId(7));
        p.has_stats = true;
        p.player = 2;
        p.cpu = 6;
        p.deficit_frame = 95;
        p.null_frame = 94;
        p.custom = -3;
        p
    }

    #[test]
    fn test_total_without_stats_is_max_minus_one() {
        let p = Penalties::empty(Arc::new(Node::new("a", "")), SessionId(1));
        assert_eq!(p.total(), i32::MAX - 1);
        assert_eq!(p.player_penalty() + p.cpu_penalty() + p.custom_penalty(), 0);
    }

    #[test]
    fn test_total_sums_components() {
        assert_eq!(penalties(Node::new("a", "")).total(), 2 + 6 + 95 + 94 - 3);
    }

    #[test]
    fn test_total_saturates() {
        let mut p = penalties(Node::new("a", ""));
        p.deficit_frame = i32::MAX;
        p.null_frame = i32::MAX;
        p.custom = 0;
        assert_eq!(p.total(), i32::MAX);
    }

    #[test]
    fn test_display() {
        let p = penalties(Node::new("a", ""));
        assert_eq!(
            p.to_string(),
            "Penalties{total=194, playerPenalty=2, cpuPenalty=6, deficitFramePenalty=95, nullFramePenalty=94, custom=-3}"
        );

        let node = Node::new("b", "");
        node.set_available(false);
        assert_eq!(penalties(node).to_string(), format!("Penalties{{unavailable={}}}", i32::MAX - 1));
    }

    #[test]
    fn test_report_serializes() {
        let report = penalties(Node::new("a", "")).report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["node"], "a");
        assert_eq!(json["session"], 7);
        assert_eq!(json["total"], 194);
    }
}
