//! The path-resolution and pipeline-execution engine.
//!
//! # Data Flow
//! ```text
//! Request (from a listener front end)
//!     → walker.rs     (path → filesystem target + traversed dirs)
//!     → discovery.rs  (stage files per traversed directory)
//!     → scheduler.rs  (phase machine: gate, transform, content, transform)
//!     → invoker.rs    (child process per executable stage)
//!     → assembler.rs  (fold stage outputs into the response)
//!     → Response (back to the listener)
//! ```
//!
//! # Design Decisions
//! - Stage wiring is filesystem-as-configuration: a directory scan plus
//!   filename parsing, no dynamic registration
//! - Every stage is an external process behind one invoke contract, so
//!   the engine stays agnostic about what a stage actually does
//! - Per-directory config layers merge key by key, deepest wins

pub mod assembler;
pub mod discovery;
pub mod error;
pub mod invoker;
pub mod overlay;
pub mod request;
pub mod response;
pub mod scheduler;
pub mod walker;

pub use error::EngineError;
pub use request::Request;
pub use response::Response;
pub use scheduler::Engine;
