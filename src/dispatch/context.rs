//! Request context handed to route handlers.
//!
//! # Responsibilities
//! - Own the request, the response and the handler chain of one request
//! - Run the next matched handler on `next()`
//! - Expose the active route's path parameters and request data
//! - Run finally routes once the chain is done
//!
//! # Design Decisions
//! - Path parameters are those of the running route; a nested `next()`
//!   shows the inner route's bindings and restores the outer ones on return
//! - The router snapshot taken at dispatch serves `uri_for`, so a request
//!   never sees a half-updated table
//! - `request_path()` is the decoded path below the application path, the
//!   same text the routes were matched against

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use axum::http::{Method, StatusCode};

use crate::dispatch::chain::{ChainState, RouteHandlerChain};
use crate::dispatch::error::HandlerResult;
use crate::http::{Request, Response, ResponseError};
use crate::routing::{CompiledRoute, RouteHandler, RouteMatch, RouteResult, Router};

/// Per-request state visible to every handler in the chain.
#[derive(Debug)]
pub struct RouteContext {
    request: Request,
    response: Response,
    chain: RouteHandlerChain,
    router: Arc<Router>,
    path: String,
}

fn no_parameters() -> &'static HashMap<String, String> {
    static EMPTY: OnceLock<HashMap<String, String>> = OnceLock::new();
    EMPTY.get_or_init(HashMap::new)
}

impl RouteContext {
    pub fn new(request: Request, router: Arc<Router>, matches: Vec<RouteMatch>) -> Self {
        let path = router
            .relative_path(request.path())
            .unwrap_or(request.path())
            .to_string();
        Self {
            path,
            request,
            response: Response::new(),
            chain: RouteHandlerChain::new(matches),
            router,
        }
    }

    /// Invoke the next matched handler, if any.
    ///
    /// The handler's error is returned unchanged. With no match left this
    /// does nothing.
    pub fn next(&mut self) -> HandlerResult {
        match self.chain.advance() {
            Some(index) => self.invoke(index),
            None => Ok(()),
        }
    }

    /// Invoke every match the chain did not reach that is flagged to run
    /// as finally. Their errors are logged, not returned.
    pub fn run_finally_routes(&mut self) {
        for index in self.chain.take_finally() {
            let route = Arc::clone(self.chain.matches()[index].route());
            if let Err(error) = self.invoke(index) {
                tracing::error!(
                    request_id = %self.request.request_id(),
                    route = %route,
                    error = %error,
                    "Error in finally route"
                );
            }
        }
    }

    /// Run a handler that is not part of the chain against this context.
    pub(crate) fn handle_with(&mut self, handler: &dyn RouteHandler) -> HandlerResult {
        handler.handle(self)
    }

    fn invoke(&mut self, index: usize) -> HandlerResult {
        let route = Arc::clone(self.chain.matches()[index].route());
        tracing::trace!(
            request_id = %self.request.request_id(),
            route = %route,
            "Invoking route handler"
        );

        let previous = self.chain.enter(index);
        let result = route.handler().handle(self);
        self.chain.leave(previous);
        result
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn request_method(&self) -> &Method {
        self.request.method()
    }

    /// Decoded request path, relative to the application path.
    pub fn request_path(&self) -> &str {
        &self.path
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn query_parameter(&self, name: &str) -> Option<String> {
        self.request.query_parameter(name)
    }

    /// The route whose handler is running.
    pub fn route(&self) -> Option<&Arc<CompiledRoute>> {
        self.chain.current().map(RouteMatch::route)
    }

    /// Bindings of the running route.
    pub fn path_parameters(&self) -> &HashMap<String, String> {
        match self.chain.current() {
            Some(route_match) => route_match.path_parameters(),
            None => no_parameters(),
        }
    }

    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters().get(name).map(String::as_str)
    }

    /// Store a typed value for later handlers of this request.
    pub fn set_local<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.request.extensions_mut().insert(value)
    }

    pub fn local<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.request.extensions().get::<T>()
    }

    pub fn remove_local<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.request.extensions_mut().remove::<T>()
    }

    /// Reverse-route through the router this request was matched against.
    pub fn uri_for(&self, name_or_pattern: &str, parameters: &BTreeMap<String, String>) -> RouteResult<String> {
        self.router.uri_for(name_or_pattern, parameters)
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn status(&mut self, status: StatusCode) -> Result<(), ResponseError> {
        self.response.set_status(status)
    }

    pub fn send(&mut self, body: impl Into<String>) -> Result<(), ResponseError> {
        self.response.send(body)
    }

    /// Redirect to `location`; a relative location gets the application path.
    pub fn redirect(&mut self, location: &str) -> Result<(), ResponseError> {
        let location = if location.starts_with('/') {
            self.router.uri_for_path(location)
        } else {
            location.to_string()
        };
        self.response.redirect(&location)
    }

    pub fn chain_state(&self) -> ChainState {
        self.chain.state()
    }

    /// Matches not yet reached by the chain.
    pub fn remaining(&self) -> usize {
        self.chain.remaining()
    }

    /// Handlers invoked so far.
    pub fn executed(&self) -> usize {
        self.chain.executed()
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}
