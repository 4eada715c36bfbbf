//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request (from the server boundary)
//!     → dispatcher.rs (strip application path, ignored path?, _method
//!       override, matches? not-found handler)
//!     → context.rs (RouteContext over the matches)
//!     → chain.rs (cursor; each handler decides whether to call next())
//!     → dispatcher.rs (auto-commit or 404, finally routes)
//!     → Return: Outcome or HandlerError
//! ```
//!
//! # Design Decisions
//! - Handlers are synchronous and run on the caller's thread
//! - Interceptors and handlers share one trait; an interceptor is a route
//!   that calls `next()`
//! - Finally routes run whether the chain succeeded or failed

pub mod chain;
pub mod context;
pub mod dispatcher;
pub mod error;

pub use chain::{ChainState, RouteHandlerChain};
pub use context::RouteContext;
pub use dispatcher::{Dispatcher, Outcome};
pub use error::{HandlerError, HandlerResult};
