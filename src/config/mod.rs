//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! cascade.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the engine settings
//!     → subsystems observe new config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Per-directory pipeline config (`.cascade.toml` layers) is a separate
//!   mechanism owned by the pipeline; this subsystem covers the server

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::PipelineConfig;
pub use schema::ServerConfig;
pub use schema::TimeoutConfig;
