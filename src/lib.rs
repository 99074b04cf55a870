//! Penalty-based node selection for audio sessions.
//!
//! Picks, among a pool of remote audio nodes, the one with the lowest load
//! penalty to host a session, and keeps session bindings correct as nodes
//! connect and disconnect.

pub mod balancer;
pub mod config;
pub mod lifecycle;
pub mod node;
pub mod observability;
pub mod penalty;
pub mod session;

pub use balancer::{BalancerError, LoadBalancer, Selection, SessionNotice};
pub use config::BalancerConfig;
pub use lifecycle::Shutdown;
pub use node::{Node, NodeEvent, NodeId, NodeRegistry, NodeStats};
pub use penalty::{PenaltyProvider, Penalties};
pub use session::{Binding, SessionId, SessionTable};
