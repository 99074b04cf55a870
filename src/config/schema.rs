//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::node::{NodeId, NodeStats};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Nodes known at startup, in selection order.
    pub nodes: Vec<NodeConfig>,

    /// Event channel settings.
    pub events: EventConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// A node entry.
///
/// `open` and `stats` stand in for what the transport layer would report;
/// they let a static deployment, or a diagnostic run, describe node state
/// without live connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// Unique node identifier.
    pub id: NodeId,

    /// Node address (e.g., "ws://10.0.0.5:2333"). Informational.
    #[serde(default)]
    pub address: String,

    /// Whether the node's transport is open.
    #[serde(default = "default_true")]
    pub open: bool,

    /// Whether the node is administratively available.
    #[serde(default = "default_true")]
    pub available: bool,

    /// Last reported stats, if any.
    #[serde(default)]
    pub stats: Option<NodeStats>,
}

fn default_true() -> bool {
    true
}

/// Event channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventConfig {
    /// Node events buffered per subscriber before it starts lagging.
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { channel_capacity: 64 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (e.g. "info" or "audio_node_balancer=debug").
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
