//! Session reassignment on node connectivity changes.
//!
//! # Responsibilities
//! - Orphan every session of a node that disconnected
//! - Hand every orphaned session to a node that connected
//! - Tell the orchestrator which sessions moved, so it can (re)connect them

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::balancer::LoadBalancer;
use crate::node::{Node, NodeEvent, NodeId};
use crate::observability::metrics;
use crate::session::SessionId;

/// Notice sent to the orchestrator for each session whose binding changed.
#[derive(Debug, Clone)]
pub enum SessionNotice {
    /// The session's node went away; it is now unassigned and needs a
    /// fresh selection.
    NodeLost { session: SessionId, node: NodeId },
    /// The session was bound to a freshly connected node; the orchestrator
    /// should open the actual connection.
    NodeClaimed { session: SessionId, node: Arc<Node> },
}

impl SessionNotice {
    pub fn session(&self) -> SessionId {
        match self {
            SessionNotice::NodeLost { session, .. } | SessionNotice::NodeClaimed { session, .. } => *session,
        }
    }
}

impl LoadBalancer {
    /// Unassign every session bound to `node`.
    pub fn on_node_disconnected(&self, node: &NodeId) -> Vec<SessionId> {
        let released = self.sessions().release_node(node);
        if !released.is_empty() {
            tracing::info!(node = %node, sessions = released.len(), "Node lost, sessions orphaned");
            metrics::record_reassignments("released", released.len());
        }
        released
    }

    /// Bind every unassigned session to `node`.
    ///
    /// This does not compare `node` against other open nodes: any node beats
    /// no node for an orphaned session. Sessions already bound stay put.
    pub fn on_node_connected(&self, node: &Arc<Node>) -> Vec<SessionId> {
        let claimed = self.sessions().claim_unassigned(&node.id);
        if !claimed.is_empty() {
            tracing::info!(node = %node.id, sessions = claimed.len(), "Orphaned sessions claimed by connected node");
            metrics::record_reassignments("claimed", claimed.len());
        }
        claimed
    }
}

/// Drives reassignment from registry events.
pub struct Reassigner {
    balancer: Arc<LoadBalancer>,
    notices: mpsc::UnboundedSender<SessionNotice>,
}

impl Reassigner {
    /// Create a reassigner and the receiver the orchestrator reads notices from.
    pub fn new(balancer: Arc<LoadBalancer>) -> (Self, mpsc::UnboundedReceiver<SessionNotice>) {
        let (notices, notice_rx) = mpsc::unbounded_channel();
        (Self { balancer, notices }, notice_rx)
    }

    /// Apply a single event. Returns how many sessions changed binding.
    pub fn handle(&self, event: &NodeEvent) -> usize {
        match event {
            NodeEvent::Disconnected(node) => {
                let released = self.balancer.on_node_disconnected(&node.id);
                for session in &released {
                    self.notify(SessionNotice::NodeLost {
                        session: *session,
                        node: node.id.clone(),
                    });
                }
                released.len()
            }
            NodeEvent::Connected(node) => {
                // It may have closed again before we got here; its
                // disconnect event is queued behind this one.
                if !node.is_open() {
                    tracing::debug!(node = %node.id, "Skipping claim for node that closed again");
                    return 0;
                }
                let claimed = self.balancer.on_node_connected(node);
                for session in &claimed {
                    self.notify(SessionNotice::NodeClaimed {
                        session: *session,
                        node: node.clone(),
                    });
                }
                claimed.len()
            }
        }
    }

    /// Rebuild bindings from current registry state after missed events.
    ///
    /// Sessions bound to a node that is gone or closed are orphaned, then
    /// the first open node in registry order claims every orphan.
    pub fn resync(&self) -> usize {
        let nodes = self.balancer.registry().nodes();
        let open: HashSet<&NodeId> = nodes.iter().filter(|n| n.is_open()).map(|n| &n.id).collect();

        let released = self.balancer.sessions().release_matching(|node| !open.contains(node));
        if !released.is_empty() {
            metrics::record_reassignments("released", released.len());
        }
        let mut changed = released.len();
        for (session, node) in released {
            self.notify(SessionNotice::NodeLost { session, node });
        }

        if let Some(first_open) = nodes.iter().find(|n| n.is_open()) {
            changed += self.handle(&NodeEvent::Connected(first_open.clone()));
        }
        tracing::info!(changed, "Session bindings resynchronized");
        changed
    }

    /// Consume registry events until shutdown or until the registry is dropped.
    pub async fn run(
        self,
        mut events: broadcast::Receiver<NodeEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!("Reassignment loop starting");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        self.handle(&event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Reassignment loop lagged behind node events, resyncing");
                        self.resync();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Node event channel closed, exiting loop");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Reassignment loop received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn notify(&self, notice: SessionNotice) {
        if self.notices.send(notice).is_err() {
            tracing::debug!("Session notice receiver dropped");
        }
    }
}
