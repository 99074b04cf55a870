//! Shared helpers for integration tests.

use std::time::Duration;

use audio_node_balancer::config::{BalancerConfig, NodeConfig};
use audio_node_balancer::{NodeId, NodeStats, SessionNotice};
use tokio::sync::mpsc;

/// A node entry for a test configuration.
pub fn node(id: &str, open: bool, stats: Option<NodeStats>) -> NodeConfig {
    NodeConfig {
        id: NodeId::from(id),
        address: format!("ws://{id}.test:2333"),
        open,
        available: true,
        stats,
    }
}

/// A configuration listing `nodes` in order.
pub fn config(nodes: Vec<NodeConfig>) -> BalancerConfig {
    let mut config = BalancerConfig::default();
    config.nodes = nodes;
    config
}

/// Receive exactly `count` notices, failing the test if they take too long.
#[allow(dead_code)]
pub async fn recv_notices(rx: &mut mpsc::UnboundedReceiver<SessionNotice>, count: usize) -> Vec<SessionNotice> {
    let mut notices = Vec::with_capacity(count);
    while notices.len() < count {
        let notice = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for session notice")
            .expect("notice channel closed");
        notices.push(notice);
    }
    notices
}
