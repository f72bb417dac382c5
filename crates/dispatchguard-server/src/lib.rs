//! dispatchguard-server: Configuration and wiring for the check resolver chain
//!
//! This crate contains:
//! - Configuration loading (YAML file + environment overrides)
//! - Logging and Prometheus metrics initialization
//! - Assembly of the check resolver chain from configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            dispatchguard-server             │
//! ├─────────────────────────────────────────────┤
//! │  config.rs        - Configuration loading   │
//! │  observability/   - Logging & metrics       │
//! │  wiring.rs        - Resolver chain assembly │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod observability;
pub mod wiring;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use wiring::build_check_resolver;
