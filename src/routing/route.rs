//! Route descriptors and match results.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::dispatch::{HandlerResult, RouteContext};
use crate::routing::error::{RouteError, RouteResult};
use crate::routing::method::HttpMethod;
use crate::routing::pattern::CompiledPattern;

/// Something that can handle a matched request.
///
/// Interceptors and terminal handlers are the same capability: a handler
/// continues the chain by calling [`RouteContext::next`] and stops it by
/// returning without doing so.
pub trait RouteHandler: Send + Sync {
    fn handle(&self, ctx: &mut RouteContext) -> HandlerResult;
}

impl<F> RouteHandler for F
where
    F: Fn(&mut RouteContext) -> HandlerResult + Send + Sync,
{
    fn handle(&self, ctx: &mut RouteContext) -> HandlerResult {
        self(ctx)
    }
}

/// Rewrites routes as they are registered.
///
/// Transformers run in the order they were added to the router, before the
/// route is validated. Returning `None` drops the route; later transformers
/// do not see it.
pub trait RouteTransformer: Send + Sync {
    fn transform(&self, route: Route) -> Option<Route>;
}

impl<F> RouteTransformer for F
where
    F: Fn(Route) -> Option<Route> + Send + Sync,
{
    fn transform(&self, route: Route) -> Option<Route> {
        self(route)
    }
}

/// A route as declared by the application.
///
/// The request method is kept as the raw token and only validated when the
/// route is registered, so that registration is the single place where a
/// bad route is rejected.
#[derive(Clone)]
pub struct Route {
    uri_pattern: String,
    request_method: String,
    handler: Arc<dyn RouteHandler>,
    name: Option<String>,
    run_as_finally: bool,
    attributes: BTreeMap<String, String>,
}

macro_rules! method_constructors {
    ($($fn_name:ident => $method:literal),* $(,)?) => {
        $(
            #[doc = concat!("Create a `", $method, "` route.")]
            pub fn $fn_name(uri_pattern: impl Into<String>, handler: impl RouteHandler + 'static) -> Self {
                Self::new($method, uri_pattern, handler)
            }
        )*
    };
}

impl Route {
    /// Create a route for an arbitrary method token.
    pub fn new(
        request_method: impl Into<String>,
        uri_pattern: impl Into<String>,
        handler: impl RouteHandler + 'static,
    ) -> Self {
        Self::with_handler(request_method, uri_pattern, Arc::new(handler))
    }

    /// Create a route around a handler shared with other routes.
    pub fn with_handler(
        request_method: impl Into<String>,
        uri_pattern: impl Into<String>,
        handler: Arc<dyn RouteHandler>,
    ) -> Self {
        Self {
            uri_pattern: uri_pattern.into(),
            request_method: request_method.into(),
            handler,
            name: None,
            run_as_finally: false,
            attributes: BTreeMap::new(),
        }
    }

    method_constructors! {
        get => "GET",
        post => "POST",
        put => "PUT",
        delete => "DELETE",
        patch => "PATCH",
        head => "HEAD",
        options => "OPTIONS",
        all => "ALL",
    }

    /// Name the route, for reverse routing.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Run this route after the chain even if nobody called `next()` on it.
    pub fn run_as_finally(mut self) -> Self {
        self.run_as_finally = true;
        self
    }

    /// Attach an attribute to the route.
    pub fn bind(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn uri_pattern(&self) -> &str {
        &self.uri_pattern
    }

    pub fn request_method(&self) -> &str {
        &self.request_method
    }

    pub fn handler(&self) -> &Arc<dyn RouteHandler> {
        &self.handler
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_run_as_finally(&self) -> bool {
        self.run_as_finally
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Replace the handler, e.g. with one wrapping the current handler.
    pub fn set_handler(&mut self, handler: Arc<dyn RouteHandler>) {
        self.handler = handler;
    }

    pub(crate) fn set_uri_pattern(&mut self, uri_pattern: String) {
        self.uri_pattern = uri_pattern;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    /// Adds attributes the route does not define itself.
    pub(crate) fn inherit_attributes(&mut self, attributes: &BTreeMap<String, String>) {
        for (key, value) in attributes {
            self.attributes.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

// Handlers are opaque closures, so Debug is written by hand.
impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("request_method", &self.request_method)
            .field("uri_pattern", &self.uri_pattern)
            .field("name", &self.name)
            .field("run_as_finally", &self.run_as_finally)
            .finish()
    }
}

/// A registered route: validated method, compiled pattern and its
/// position in registration order.
pub struct CompiledRoute {
    route: Route,
    method: HttpMethod,
    pattern: CompiledPattern,
    sequence: u64,
}

impl CompiledRoute {
    /// Validate and compile a route.
    ///
    /// Checks run in order: empty pattern, method token, pattern syntax.
    pub(crate) fn compile(route: Route, sequence: u64) -> RouteResult<Self> {
        if route.uri_pattern.trim().is_empty() {
            return Err(RouteError::EmptyUriPattern);
        }
        let method: HttpMethod = route.request_method.parse()?;
        let pattern = CompiledPattern::compile(&route.uri_pattern)?;

        Ok(Self {
            route,
            method,
            pattern,
            sequence,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn uri_pattern(&self) -> &str {
        self.route.uri_pattern()
    }

    pub fn name(&self) -> Option<&str> {
        self.route.name()
    }

    pub fn handler(&self) -> &Arc<dyn RouteHandler> {
        self.route.handler()
    }

    pub fn is_run_as_finally(&self) -> bool {
        self.route.is_run_as_finally()
    }

    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Serializable summary for introspection.
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            method: self.method,
            uri_pattern: self.uri_pattern().to_string(),
            name: self.name().map(str::to_string),
            regex: self.pattern.regex().to_string(),
            parameters: self.pattern.parameter_names().to_vec(),
            run_as_finally: self.is_run_as_finally(),
            attributes: self.route.attributes().clone(),
        }
    }
}

impl fmt::Debug for CompiledRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("method", &self.method)
            .field("uri_pattern", &self.uri_pattern())
            .field("regex", &self.pattern.regex())
            .field("name", &self.name())
            .finish()
    }
}

impl fmt::Display for CompiledRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.method, self.uri_pattern())
    }
}

/// Route table entry as printed by `routechain routes`.
#[derive(Debug, Clone, Serialize)]
pub struct RouteInfo {
    pub method: HttpMethod,
    pub uri_pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub regex: String,
    pub parameters: Vec<String>,
    pub run_as_finally: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// A route that matched a request path, with the extracted bindings.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    route: Arc<CompiledRoute>,
    path_parameters: HashMap<String, String>,
}

impl RouteMatch {
    pub fn new(route: Arc<CompiledRoute>, path_parameters: HashMap<String, String>) -> Self {
        Self {
            route,
            path_parameters,
        }
    }

    pub fn route(&self) -> &Arc<CompiledRoute> {
        &self.route
    }

    pub fn path_parameters(&self) -> &HashMap<String, String> {
        &self.path_parameters
    }
}
