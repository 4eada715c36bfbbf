//! Route matching and handler-chain dispatch for web applications.
//!
//! Routes pair a URI pattern and a request method with a handler. For each
//! request every matching route is collected in registration order, and
//! the handlers run as a cooperative chain: each decides whether to call
//! `next()`. Interceptors and endpoints are the same kind of route.

pub mod config;
pub mod demo;
pub mod dispatch;
pub mod http;
pub mod observability;
pub mod routing;

pub use config::AppConfig;
pub use dispatch::{Dispatcher, HandlerError, HandlerResult, Outcome, RouteContext};
pub use http::{HttpServer, Request, Response};
pub use routing::{HttpMethod, Route, RouteError, RouteGroup, Router, SharedRouter};
