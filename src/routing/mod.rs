//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup, or through SharedRouter):
//!     Route / RouteGroup
//!     → group.rs (flatten prefixes, names, attributes)
//!     → router.rs (route transformers may rewrite or drop the route)
//!     → route.rs (validate method, compile pattern)
//!     → pattern.rs (pattern → anchored regex + parameter names)
//!     → router.rs (append to table and method bucket)
//!
//! Incoming Request (method, decoded path relative to the application path)
//!     → router.rs (method bucket ∪ ALL bucket, registration order)
//!     → pattern.rs (match path, extract bindings)
//!     → Return: Vec<RouteMatch> (possibly empty)
//! ```
//!
//! # Design Decisions
//! - Every matching route is returned, not only the first: interceptors
//!   and handlers are all routes, and the chain decides who runs
//! - Registration order is the only ordering; no specificity ranking
//! - Invalid routes fail at registration, never while matching
//! - "No match" is an empty result, not an error

pub mod error;
pub mod group;
pub mod method;
pub mod pattern;
pub mod route;
pub mod router;
pub mod shared;

pub use error::{RouteError, RouteResult};
pub use group::RouteGroup;
pub use method::HttpMethod;
pub use pattern::CompiledPattern;
pub use route::{CompiledRoute, Route, RouteHandler, RouteInfo, RouteMatch, RouteTransformer};
pub use router::Router;
pub use shared::SharedRouter;
