//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Node identity: non-empty, unique
//! - Value ranges: finite non-negative load, frame counters >= -1
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::BalancerConfig;
use crate::node::{NodeId, FRAMES_NOT_MEASURED};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("node #{0} has an empty id")]
    EmptyNodeId(usize),

    #[error("node '{0}' is listed more than once")]
    DuplicateNodeId(NodeId),

    #[error("node '{node}' reports invalid system load {load}")]
    InvalidSystemLoad { node: NodeId, load: f64 },

    #[error("node '{node}' reports invalid {field} {value} (must be >= -1)")]
    InvalidFrameCount { node: NodeId, field: &'static str, value: i32 },

    #[error("events.channel_capacity must be greater than zero")]
    ZeroChannelCapacity,

    #[error("invalid log level filter '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, node) in config.nodes.iter().enumerate() {
        if node.id.0.trim().is_empty() {
            errors.push(ValidationError::EmptyNodeId(index));
        } else if !seen.insert(&node.id) {
            errors.push(ValidationError::DuplicateNodeId(node.id.clone()));
        }

        let Some(stats) = &node.stats else {
            continue;
        };
        if !stats.system_load.is_finite() || stats.system_load < 0.0 {
            errors.push(ValidationError::InvalidSystemLoad {
                node: node.id.clone(),
                load: stats.system_load,
            });
        }
        for (field, value) in [
            ("avg_frames_deficit_per_minute", stats.avg_frames_deficit_per_minute),
            ("avg_frames_nulled_per_minute", stats.avg_frames_nulled_per_minute),
        ] {
            if value < FRAMES_NOT_MEASURED {
                errors.push(ValidationError::InvalidFrameCount {
                    node: node.id.clone(),
                    field,
                    value,
                });
            }
        }
    }

    if config.events.channel_capacity == 0 {
        errors.push(ValidationError::ZeroChannelCapacity);
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use crate::node::NodeStats;

    fn node(id: &str, stats: Option<NodeStats>) -> NodeConfig {
        NodeConfig {
            id: NodeId::from(id),
            address: String::new(),
            open: true,
            available: true,
            stats,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&BalancerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = BalancerConfig::default();
        config.nodes = vec![
            node("a", Some(NodeStats::new(1, f64::NAN))),
            node("a", None),
            node(" ", None),
            node("b", Some(NodeStats::new(1, 0.2).with_frames(-5, 3))),
        ];
        config.events.channel_capacity = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "not-an-address".into();

        let errors = validate_config(&config).unwrap_err();

        assert_eq!(errors.len(), 6);
        assert!(matches!(&errors[0], ValidationError::InvalidSystemLoad { node, .. } if node.0 == "a"));
        assert_eq!(errors[1], ValidationError::DuplicateNodeId(NodeId::from("a")));
        assert_eq!(errors[2], ValidationError::EmptyNodeId(2));
        assert_eq!(
            errors[3],
            ValidationError::InvalidFrameCount {
                node: NodeId::from("b"),
                field: "avg_frames_deficit_per_minute",
                value: -5,
            }
        );
        assert_eq!(errors[4], ValidationError::ZeroChannelCapacity);
        assert_eq!(errors[5], ValidationError::InvalidMetricsAddress("not-an-address".into()));
    }

    #[test]
    fn test_unmeasured_frames_are_valid() {
        let mut config = BalancerConfig::default();
        config.nodes = vec![node("a", Some(NodeStats::new(0, 1.7)))];
        assert!(validate_config(&config).is_ok());
    }
}
