//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (add request ID, convert to pipeline Request)
//!     → [pipeline engine runs the request]
//!     → response.rs (convert pipeline Response to HTTP)
//!     → Send to client
//! ```
//!
//! The engine itself is protocol-neutral; everything HTTP-specific lives
//! here.

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
