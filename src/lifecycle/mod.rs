//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → NodeRegistry → LoadBalancer → spawn reassignment loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → background loops exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Subscribe to node events before any task can emit them
//! - Every background loop listens on the same shutdown broadcast

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
