//! Node subsystem.
//!
//! # Data Flow
//! ```text
//! Transport layer (out of crate):
//!     stats report → registry.rs (update_stats) → remote.rs (atomic swap)
//!     socket open/close → registry.rs (mark_connected / mark_disconnected)
//!         → NodeEvent on broadcast channel → balancer reassignment loop
//!
//! Selection pass:
//!     registry.rs (nodes) → snapshot of Arc<Node> → penalty calculator
//! ```
//!
//! # Design Decisions
//! - Membership changes publish a fresh list; readers never lock
//! - Stats are immutable snapshots replaced wholesale
//! - Events fire only on open/closed edges

pub mod registry;
pub mod remote;
pub mod stats;

pub use registry::{NodeEvent, NodeRegistry, RegistryError};
pub use remote::{Node, NodeId};
pub use stats::{NodeStats, FRAMES_NOT_MEASURED};
