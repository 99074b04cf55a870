//! Penalty scoring subsystem.
//!
//! # Data Flow
//! ```text
//! Node stats snapshot
//!     → calculator.rs (player, cpu, deficit-frame, null-frame curves)
//!     → provider.rs (each registered provider adds a custom term)
//!     → snapshot.rs (Penalties: breakdown + total)
//! ```
//!
//! # Design Decisions
//! - Lower is better; a node without stats scores `i32::MAX - 1`
//! - Curves truncate toward zero and saturate instead of overflowing
//! - Provider faults are isolated to a zero contribution

pub mod calculator;
pub mod provider;
pub mod snapshot;

pub use calculator::{compute, standard};
pub use provider::{PenaltyProvider, ProviderSet};
pub use snapshot::{PenaltyReport, Penalties, NO_STATS_PENALTY};
