//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → tls.rs (optional TLS termination)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Concurrency limits live in the HTTP middleware stack, not the
//!   accept loop, so an idle keep-alive connection costs no permit
//! - TLS is optional and handled transparently

pub mod listener;
pub mod tls;
