//! Lowest-penalty node selection.

use std::sync::Arc;

use crate::balancer::{BalancerError, Selection};
use crate::node::{Node, NodeRegistry};
use crate::observability::metrics;
use crate::penalty::{self, PenaltyProvider, Penalties, ProviderSet};
use crate::session::{SessionId, SessionTable};

/// Picks the best node for a session and keeps session bindings current.
pub struct LoadBalancer {
    registry: Arc<NodeRegistry>,
    sessions: SessionTable,
    providers: ProviderSet,
}

impl LoadBalancer {
    pub fn new(registry: Arc<NodeRegistry>, sessions: SessionTable) -> Self {
        Self {
            registry,
            sessions,
            providers: ProviderSet::new(),
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Add a penalty provider to every subsequent selection pass.
    pub fn register_provider(&self, provider: Arc<dyn PenaltyProvider>) {
        self.providers.register(provider);
    }

    /// Remove one registration of `provider`. Returns whether one was found.
    pub fn unregister_provider(&self, provider: &Arc<dyn PenaltyProvider>) -> bool {
        self.providers.unregister(provider)
    }

    /// Find the node with the lowest total penalty for `session`.
    ///
    /// Scores a snapshot of the registry with a snapshot of the providers;
    /// changes made during the pass are picked up by the next one.
    pub fn select_node(&self, session: SessionId) -> Result<Selection, BalancerError> {
        let nodes = self.registry.nodes();
        let providers = self.providers.snapshot();

        let mut best: Option<(&Arc<Node>, i32)> = None;
        for node in nodes.iter() {
            let total = penalty::compute(node, session, &providers).total();
            metrics::record_node_penalty(&node.id, total);
            // Strictly lower: the first node wins ties.
            if best.map_or(true, |(_, record)| total < record) {
                best = Some((node, total));
            }
        }

        let Some((node, total)) = best else {
            tracing::error!(session = %session, "Selection requested with no nodes registered");
            metrics::record_selection("no_nodes");
            return Err(BalancerError::NoNodesAvailable);
        };

        let selection = if node.is_open() {
            Selection::Node(node.clone())
        } else {
            Selection::Unavailable(node.clone())
        };

        tracing::debug!(
            session = %session,
            node = %node.id,
            penalty = total,
            candidates = nodes.len(),
            outcome = selection.outcome(),
            "Node selection finished"
        );
        metrics::record_selection(selection.outcome());
        Ok(selection)
    }

    /// Select a node and, if one is usable, bind the session to it.
    pub fn place_session(&self, session: SessionId) -> Result<Selection, BalancerError> {
        let selection = self.select_node(session)?;
        Ok(self.commit(session, selection))
    }

    /// Bind `session` per `selection`.
    ///
    /// The node may close between selection and bind, with its disconnect
    /// sweep already done. Closing flips the open flag before the event is
    /// published, so re-checking it after the bind catches every binding a
    /// sweep could have missed.
    fn commit(&self, session: SessionId, selection: Selection) -> Selection {
        let node = match selection {
            Selection::Node(node) => node,
            Selection::Unavailable(node) => {
                self.sessions.open(session);
                tracing::info!(session = %session, node = %node.id, "Best node is closed, session left unassigned");
                return Selection::Unavailable(node);
            }
        };

        self.sessions.bind(session, node.id.clone());
        if !node.is_open() {
            self.sessions.unbind_if(session, &node.id);
            tracing::info!(session = %session, node = %node.id, "Node closed during placement, session left unassigned");
            return Selection::Unavailable(node);
        }

        tracing::info!(session = %session, node = %node.id, "Session placed");
        Selection::Node(node)
    }

    /// Penalty breakdown of one node for `session`, with current providers.
    /// Has no side effects.
    pub fn penalties(&self, node: &Arc<Node>, session: SessionId) -> Penalties {
        penalty::compute(node, session, &self.providers.snapshot())
    }

    /// Breakdown of every registered node, in registry order.
    pub fn penalty_table(&self, session: SessionId) -> Vec<Penalties> {
        let providers = self.providers.snapshot();
        self.registry
            .nodes()
            .iter()
            .map(|node| penalty::compute(node, session, &providers))
            .collect()
    }
}
