//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (node, session, penalty) rather than formatted strings
//! - Metric updates are no-ops until a recorder is installed
//! - Metrics are cheap enough to record on every selection pass

pub mod logging;
pub mod metrics;
