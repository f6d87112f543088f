//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//!
//! Shutdown (shutdown.rs):
//!     trigger → stop accepting → in-flight pipelines drain or cancel
//! ```
//!
//! # Design Decisions
//! - Shutdown is a broadcast: every long-running task subscribes
//! - Dropped pipeline futures kill their in-flight child processes, so
//!   cancellation cannot leak stage processes

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
