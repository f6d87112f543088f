//! cascade-server: a filesystem-pipeline web server.
//!
//! Request paths map directly onto a directory tree. Each traversed
//! directory may contribute pipeline stages (gatekeepers, request and
//! response transformers, loggers) as plain executable files, and the
//! resolved target is either executed (others-execute set) or served as
//! raw bytes.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                  CASCADE SERVER                  │
//!                    │                                                  │
//!   Client Request   │  ┌─────────┐   ┌─────────┐   ┌──────────────┐   │
//!   ─────────────────┼─▶│   net   │──▶│  http   │──▶│   pipeline   │   │
//!                    │  │listener │   │ server  │   │    engine    │   │
//!                    │  └─────────┘   └─────────┘   └──────┬───────┘   │
//!                    │                                     │           │
//!                    │                                     ▼           │
//!                    │                             ┌──────────────┐    │
//!                    │                             │ stage & page │    │
//!   Client Response  │  ┌─────────┐   ┌─────────┐  │  processes   │    │
//!   ◀────────────────┼──│response │◀──│pipeline │◀─┤ (spawned per │    │
//!                    │  │ convert │   │assembler│  │   request)   │    │
//!                    │  └─────────┘   └─────────┘  └──────────────┘    │
//!                    │                                                 │
//!                    │  ┌───────────────────────────────────────────┐  │
//!                    │  │            Cross-Cutting Concerns         │  │
//!                    │  │  ┌────────┐ ┌────────────┐ ┌───────────┐  │  │
//!                    │  │  │ config │ │observability│ │ lifecycle │ │  │
//!                    │  │  └────────┘ └────────────┘ └───────────┘  │  │
//!                    │  └───────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod pipeline;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Engine, Request, Response};
