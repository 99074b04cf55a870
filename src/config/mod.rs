//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → NodeRegistry::from_config
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs parses new config
//!     → validation.rs validates
//!     → mpsc update → NodeRegistry::apply_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes arrive as a full new config
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BalancerConfig, EventConfig, LogFormat, NodeConfig, ObservabilityConfig};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
