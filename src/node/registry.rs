//! Live registry of known nodes.
//!
//! # Responsibilities
//! - Own the set of nodes in a stable iteration order
//! - Publish point-in-time snapshots of that set to selection passes
//! - Emit connectivity events when a node opens or closes

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{BalancerConfig, NodeConfig};
use crate::node::remote::{Node, NodeId};
use crate::node::stats::NodeStats;
use crate::observability::metrics;

/// Connectivity change of a single node.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// The transport to the node opened.
    Connected(Arc<Node>),
    /// The transport to the node closed, or the node was removed.
    Disconnected(Arc<Node>),
}

impl NodeEvent {
    pub fn node(&self) -> &Arc<Node> {
        match self {
            NodeEvent::Connected(node) | NodeEvent::Disconnected(node) => node,
        }
    }
}

/// Errors raised by registry mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("node '{0}' is already registered")]
    DuplicateNode(NodeId),

    #[error("node '{0}' is not registered")]
    UnknownNode(NodeId),
}

/// Shared, concurrently readable set of nodes.
///
/// Readers take a snapshot with [`NodeRegistry::nodes`] and never block.
/// Writers are serialized among themselves and publish a new list on every
/// membership change.
pub struct NodeRegistry {
    nodes: ArcSwap<Vec<Arc<Node>>>,
    write_lock: Mutex<()>,
    events: broadcast::Sender<NodeEvent>,
}

impl NodeRegistry {
    /// Create an empty registry whose event channel buffers `event_capacity` events.
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            nodes: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// Build a registry from configuration.
    pub fn from_config(config: &BalancerConfig) -> Self {
        let registry = Self::new(config.events.channel_capacity);
        registry.apply_config(config);
        registry
    }

    /// Subscribe to connectivity events.
    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }

    /// Point-in-time snapshot of every known node, in registration order.
    pub fn nodes(&self) -> Arc<Vec<Arc<Node>>> {
        self.nodes.load_full()
    }

    pub fn get(&self, id: &NodeId) -> Option<Arc<Node>> {
        self.nodes.load().iter().find(|n| &n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.nodes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.load().is_empty()
    }

    /// Register a node. It keeps whatever open state it was built with.
    pub fn add_node(&self, node: Node) -> Result<Arc<Node>, RegistryError> {
        let _guard = self.write_lock.lock().expect("registry write lock poisoned");
        let current = self.nodes.load_full();
        if current.iter().any(|n| n.id == node.id) {
            return Err(RegistryError::DuplicateNode(node.id));
        }

        let node = Arc::new(node);
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(node.clone());
        self.nodes.store(Arc::new(next));
        metrics::record_node_count(current.len() + 1);

        tracing::info!(node = %node.id, address = %node.address, "Node registered");
        Ok(node)
    }

    /// Remove a node. An open node is closed first and reported as disconnected.
    pub fn remove_node(&self, id: &NodeId) -> Result<Arc<Node>, RegistryError> {
        let removed = {
            let _guard = self.write_lock.lock().expect("registry write lock poisoned");
            let current = self.nodes.load_full();
            let Some(removed) = current.iter().find(|n| &n.id == id).cloned() else {
                return Err(RegistryError::UnknownNode(id.clone()));
            };
            let next: Vec<Arc<Node>> = current.iter().filter(|n| &n.id != id).cloned().collect();
            metrics::record_node_count(next.len());
            self.nodes.store(Arc::new(next));
            removed
        };

        tracing::info!(node = %id, "Node removed");
        if removed.set_open(false) {
            self.publish(NodeEvent::Disconnected(removed.clone()));
        }
        Ok(removed)
    }

    /// Mark a node's transport as open. Emits `Connected` on a closed → open edge.
    pub fn mark_connected(&self, id: &NodeId) -> Result<(), RegistryError> {
        let node = self.require(id)?;
        if !node.set_open(true) {
            tracing::info!(node = %id, "Node connected");
            self.publish(NodeEvent::Connected(node));
        }
        Ok(())
    }

    /// Mark a node's transport as closed. Emits `Disconnected` on an open → closed edge.
    pub fn mark_disconnected(&self, id: &NodeId) -> Result<(), RegistryError> {
        let node = self.require(id)?;
        if node.set_open(false) {
            tracing::info!(node = %id, "Node disconnected");
            self.publish(NodeEvent::Disconnected(node));
        }
        Ok(())
    }

    /// Replace a node's stats snapshot.
    pub fn update_stats(&self, id: &NodeId, stats: NodeStats) -> Result<(), RegistryError> {
        let node = self.require(id)?;
        tracing::trace!(node = %id, playing = stats.playing_players, load = stats.system_load, "Stats updated");
        node.update_stats(stats);
        Ok(())
    }

    /// Reconcile the registry with a (re)loaded configuration.
    ///
    /// Listed nodes are added or updated in place, unlisted nodes are removed.
    /// Open-state changes go through the same edge-triggered events as
    /// transport notifications.
    pub fn apply_config(&self, config: &BalancerConfig) {
        let listed: HashSet<&NodeId> = config.nodes.iter().map(|n| &n.id).collect();

        for stale in self.nodes().iter().filter(|n| !listed.contains(&n.id)) {
            // Concurrent removal is fine; the node is gone either way.
            let _ = self.remove_node(&stale.id);
        }

        for node_config in &config.nodes {
            let node = match self.get(&node_config.id) {
                Some(node) => node,
                None => match self.add_node(Node::new(node_config.id.clone(), node_config.address.clone())) {
                    Ok(node) => node,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping node from configuration");
                        continue;
                    }
                },
            };
            self.apply_node_config(&node, node_config);
        }
    }

    fn apply_node_config(&self, node: &Arc<Node>, config: &NodeConfig) {
        node.set_available(config.available);
        match &config.stats {
            Some(stats) => node.update_stats(stats.clone()),
            None => node.clear_stats(),
        }

        let result = if config.open {
            self.mark_connected(&node.id)
        } else {
            self.mark_disconnected(&node.id)
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Node vanished while applying configuration");
        }
    }

    fn require(&self, id: &NodeId) -> Result<Arc<Node>, RegistryError> {
        self.get(id).ok_or_else(|| RegistryError::UnknownNode(id.clone()))
    }

    fn publish(&self, event: NodeEvent) {
        // No subscribers is not an error; nobody needs to react.
        let _ = self.events.send(event);
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new(64)
    }
}
