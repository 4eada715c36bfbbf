//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body buffering)
//!     → request.rs (buffered Request, request ID)
//!     → [dispatch decides which handlers run]
//!     → response.rs (status, headers, body, commit flag)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Request, X_REQUEST_ID};
pub use response::{Response, ResponseError};
pub use server::HttpServer;
