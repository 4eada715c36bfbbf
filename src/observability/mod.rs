//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing, dispatch, http produce:
//!     → tracing events with structured fields (request_id, route, path)
//!
//! logging.rs installs the subscriber:
//!     → EnvFilter (RUST_LOG or config log level)
//!     → fmt layer (plain or JSON) → stdout
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every dispatch log line

pub mod logging;

pub use logging::init_logging;
