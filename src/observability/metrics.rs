//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_node_penalty` (gauge): last computed total per node
//! - `balancer_nodes` (gauge): registered node count
//! - `balancer_selections_total` (counter): selection passes by outcome
//! - `balancer_reassignments_total` (counter): sessions released/claimed
//! - `balancer_provider_faults_total` (counter): panicking providers

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::node::NodeId;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_node_penalty(node: &NodeId, total: i32) {
    ::metrics::gauge!("balancer_node_penalty", "node" => node.0.clone()).set(total as f64);
}

pub fn record_node_count(count: usize) {
    ::metrics::gauge!("balancer_nodes").set(count as f64);
}

pub fn record_selection(outcome: &'static str) {
    ::metrics::counter!("balancer_selections_total", "outcome" => outcome).increment(1);
}

pub fn record_reassignments(kind: &'static str, sessions: usize) {
    ::metrics::counter!("balancer_reassignments_total", "kind" => kind).increment(sessions as u64);
}

pub fn record_provider_fault(provider: &str) {
    ::metrics::counter!("balancer_provider_faults_total", "provider" => provider.to_string()).increment(1);
}
