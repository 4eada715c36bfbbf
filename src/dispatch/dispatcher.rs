//! Per-request entry point.
//!
//! # Responsibilities
//! - Strip the application path; paths outside it are not found
//! - Apply a form's `_method` override to the request method
//! - Short-circuit ignored paths and requests without matching routes
//! - Run the handler chain of a request
//! - Commit a response nobody committed, or turn it into "not found"
//! - Run finally routes on success and on failure
//!
//! # Design Decisions
//! - "Not found" is an outcome, handler failures are errors; the server
//!   boundary decides how either is written to the wire
//! - A dispatch takes one router snapshot and uses it for the whole request

use std::sync::Arc;

use axum::http::StatusCode;

use crate::dispatch::context::RouteContext;
use crate::dispatch::error::HandlerError;
use crate::http::{Request, Response};
use crate::routing::{HttpMethod, RouteHandler, Router, SharedRouter};

/// Result of a dispatch that did not fail.
#[derive(Debug)]
pub enum Outcome {
    /// A handler produced the response.
    Handled(Response),
    /// No route applied, or no handler set a status.
    NotFound(Response),
}

impl Outcome {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Outcome::NotFound(_))
    }

    pub fn response(&self) -> &Response {
        match self {
            Outcome::Handled(response) | Outcome::NotFound(response) => response,
        }
    }

    pub fn into_response(self) -> Response {
        match self {
            Outcome::Handled(response) | Outcome::NotFound(response) => response,
        }
    }
}

#[derive(Debug, Clone)]
enum RouteSource {
    Fixed(Arc<Router>),
    Shared(SharedRouter),
}

/// Dispatches requests through a route table.
#[derive(Clone)]
pub struct Dispatcher {
    routes: RouteSource,
    not_found_handler: Option<Arc<dyn RouteHandler>>,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            routes: RouteSource::Fixed(router),
            not_found_handler: None,
        }
    }

    /// Dispatch through a table that may change while serving.
    pub fn with_shared(router: SharedRouter) -> Self {
        Self {
            routes: RouteSource::Shared(router),
            not_found_handler: None,
        }
    }

    /// Handler run when no route matches. It sees an empty chain.
    pub fn not_found_handler(mut self, handler: impl RouteHandler + 'static) -> Self {
        self.not_found_handler = Some(Arc::new(handler));
        self
    }

    /// The route table as of now.
    pub fn router(&self) -> Arc<Router> {
        match &self.routes {
            RouteSource::Fixed(router) => Arc::clone(router),
            RouteSource::Shared(shared) => shared.snapshot(),
        }
    }

    /// Run one request through the matching routes.
    pub fn dispatch(&self, mut request: Request) -> Result<Outcome, HandlerError> {
        let router = self.router();
        let Some(path) = router.relative_path(request.path()).map(str::to_string) else {
            tracing::debug!(
                request_id = %request.request_id(),
                path = %request.path(),
                application_path = %router.application_path(),
                "Path outside application path"
            );
            return self.not_found(request, router);
        };

        if router.is_ignored(&path) {
            tracing::debug!(request_id = %request.request_id(), path = %path, "Ignored path");
            return Ok(Outcome::NotFound(Response::not_found()));
        }

        if let Some(method) = request.method_override() {
            tracing::debug!(
                request_id = %request.request_id(),
                from = %request.method(),
                to = %method,
                "Method override"
            );
            request.set_method(method);
        }

        let matches = match HttpMethod::from_http(request.method()) {
            Some(method) => router.find_routes(method, &path),
            None => Vec::new(),
        };
        if matches.is_empty() {
            return self.not_found(request, router);
        }

        let request_id = request.request_id().to_string();
        let mut ctx = RouteContext::new(request, router, matches);

        if let Err(error) = ctx.next() {
            tracing::debug!(request_id = %request_id, error = %error, "Route chain failed");
            ctx.run_finally_routes();
            return Err(error);
        }

        let not_found = finalize(ctx.response_mut());
        if not_found {
            tracing::warn!(
                request_id = %request_id,
                method = %ctx.request_method(),
                path = %path,
                "No handler produced a response"
            );
        }
        ctx.run_finally_routes();

        let response = ctx.into_response();
        if not_found {
            Ok(Outcome::NotFound(response))
        } else {
            Ok(Outcome::Handled(response))
        }
    }

    fn not_found(&self, request: Request, router: Arc<Router>) -> Result<Outcome, HandlerError> {
        tracing::debug!(
            request_id = %request.request_id(),
            method = %request.method(),
            path = %request.path(),
            "No route matched"
        );

        let Some(handler) = &self.not_found_handler else {
            return Ok(Outcome::NotFound(Response::not_found()));
        };

        let mut ctx = RouteContext::new(request, router, Vec::new());
        ctx.handle_with(handler.as_ref())?;
        finalize(ctx.response_mut());
        Ok(Outcome::NotFound(ctx.into_response()))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes)
            .field("not_found_handler", &self.not_found_handler.is_some())
            .finish()
    }
}

/// Commit an uncommitted response. A response without a status becomes a
/// 404; returns true in that case.
fn finalize(response: &mut Response) -> bool {
    if response.is_committed() {
        return false;
    }
    let not_found = response.status().is_none();
    if not_found {
        // Not committed, so this cannot fail.
        let _ = response.set_status(StatusCode::NOT_FOUND);
    }
    response.commit();
    not_found
}
