//! Startup orchestration.
//!
//! Builds the registry and balancer from configuration and starts the
//! reassignment loop. Must be called from within a Tokio runtime.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::balancer::{LoadBalancer, Reassigner, SessionNotice};
use crate::config::BalancerConfig;
use crate::lifecycle::Shutdown;
use crate::node::NodeRegistry;
use crate::session::SessionTable;

/// Handles to the running balancer.
pub struct Services {
    pub registry: Arc<NodeRegistry>,
    pub balancer: Arc<LoadBalancer>,
    /// Session notices for the orchestrator.
    pub notices: mpsc::UnboundedReceiver<SessionNotice>,
    pub reassigner: JoinHandle<()>,
}

/// Build every component and spawn the reassignment loop.
pub fn start(config: &BalancerConfig, shutdown: &Shutdown) -> Services {
    let registry = Arc::new(NodeRegistry::new(config.events.channel_capacity));
    // Subscribe before the config is applied so its connect events are seen.
    let events = registry.subscribe();
    registry.apply_config(config);

    let balancer = Arc::new(LoadBalancer::new(registry.clone(), SessionTable::new()));
    let (reassigner, notices) = Reassigner::new(balancer.clone());
    let reassigner = tokio::spawn(reassigner.run(events, shutdown.subscribe()));

    tracing::info!(nodes = registry.len(), "Balancer started");

    Services {
        registry,
        balancer,
        notices,
        reassigner,
    }
}
