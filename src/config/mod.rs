//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PipelineConfig (validated, immutable)
//!     → PipelineBuilder::from_config (identity headers, retry policy)
//!     → ReqwestTransport::new (timeouts)
//! ```
//!
//! # Design Decisions
//! - Config is read once at chain construction; stages hold derived values
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ClientConfig, ObservabilityConfig, PipelineConfig, RetryConfig, TransportConfig};
pub use validation::ValidationError;
