//! Route registration and lookup.
//!
//! # Responsibilities
//! - Validate and compile routes at registration time
//! - Keep routes in registration order, indexed by request method
//! - Return every route matching a request, in registration order
//! - Build URIs back from route names or patterns
//!
//! # Design Decisions
//! - Linear scan per request: route tables are small and registration
//!   order is the only tie-break, which a trie would obscure
//! - `ALL` routes live in their own bucket, merged with the method bucket
//!   by registration sequence
//! - Mutation needs `&mut self`; share a finished table through `Arc` or
//!   [`SharedRouter`](crate::routing::SharedRouter)

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::RouterConfig;
use crate::routing::error::{RouteError, RouteResult};
use crate::routing::group::RouteGroup;
use crate::routing::method::HttpMethod;
use crate::routing::route::{CompiledRoute, Route, RouteMatch, RouteTransformer};

/// Query names and values keep only unreserved characters unescaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// The application's route table.
#[derive(Clone, Default)]
pub struct Router {
    /// All routes in registration order.
    routes: Vec<Arc<CompiledRoute>>,
    /// Same routes, bucketed by method (`ALL` has its own bucket).
    by_method: HashMap<HttpMethod, Vec<Arc<CompiledRoute>>>,
    next_sequence: u64,
    application_path: String,
    ignore_paths: BTreeSet<String>,
    transformers: Vec<Arc<dyn RouteTransformer>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty router with application path and ignore paths from
    /// configuration.
    pub fn from_config(config: &RouterConfig) -> Self {
        let mut router = Self::new();
        router.set_application_path(&config.application_path);
        router.ignore_paths(config.ignore_paths.iter().cloned());
        router
    }

    /// Register a route.
    ///
    /// Route transformers run first and may drop the route, which yields
    /// `Ok(None)`. The route is rejected with `EmptyUriPattern`,
    /// `InvalidMethod` or `InvalidUriPattern`; a rejected route leaves the
    /// table untouched.
    pub fn add_route(&mut self, route: Route) -> RouteResult<Option<Arc<CompiledRoute>>> {
        tracing::debug!(
            method = %route.request_method(),
            uri_pattern = %route.uri_pattern(),
            "Add route"
        );

        let mut route = route;
        for transformer in &self.transformers {
            let method = route.request_method().to_string();
            let uri_pattern = route.uri_pattern().to_string();
            match transformer.transform(route) {
                Some(transformed) => route = transformed,
                None => {
                    tracing::debug!(method = %method, uri_pattern = %uri_pattern, "Route dropped by transformer");
                    return Ok(None);
                }
            }
        }

        let compiled = Arc::new(CompiledRoute::compile(route, self.next_sequence)?);
        self.next_sequence += 1;

        self.routes.push(Arc::clone(&compiled));
        self.by_method
            .entry(compiled.method())
            .or_default()
            .push(Arc::clone(&compiled));

        Ok(Some(compiled))
    }

    /// Apply `transformer` to every route registered from now on.
    pub fn add_route_transformer(&mut self, transformer: impl RouteTransformer + 'static) {
        self.transformers.push(Arc::new(transformer));
    }

    pub fn route_transformers(&self) -> usize {
        self.transformers.len()
    }

    /// Register every route of a group tree, in declaration order.
    ///
    /// Stops at the first invalid route; routes registered before it stay.
    pub fn add_route_group(&mut self, group: RouteGroup) -> RouteResult<()> {
        tracing::debug!(uri_pattern = %group.uri_pattern(), "Add route group");
        for route in group.flatten() {
            self.add_route(route)?;
        }
        Ok(())
    }

    /// Remove the routes of a group tree, as `add_route_group` registered
    /// them. Returns how many routes were removed.
    pub fn remove_route_group(&mut self, group: &RouteGroup) -> usize {
        tracing::debug!(uri_pattern = %group.uri_pattern(), "Remove route group");
        group
            .clone()
            .flatten()
            .iter()
            .filter_map(|route| {
                let method = route.request_method().parse::<HttpMethod>().ok()?;
                self.remove_route(method, route.uri_pattern())
            })
            .count()
    }

    /// Remove the first route registered for `method` and `uri_pattern`.
    pub fn remove_route(&mut self, method: HttpMethod, uri_pattern: &str) -> Option<Arc<CompiledRoute>> {
        let position = self
            .routes
            .iter()
            .position(|r| r.method() == method && r.uri_pattern() == uri_pattern)?;
        let removed = self.routes.remove(position);

        if let Some(bucket) = self.by_method.get_mut(&method) {
            bucket.retain(|r| !Arc::ptr_eq(r, &removed));
        }

        tracing::debug!(method = %method, uri_pattern = %uri_pattern, "Removed route");
        Some(removed)
    }

    /// Find every route matching `path` for `method`, in registration order.
    ///
    /// An empty result is the normal "not found" answer.
    pub fn find_routes(&self, method: HttpMethod, path: &str) -> Vec<RouteMatch> {
        tracing::trace!(method = %method, path = %path, "Finding route matches");

        let specific = match method {
            HttpMethod::All => &[][..],
            _ => self.bucket(method),
        };
        let any = self.bucket(HttpMethod::All);

        let mut matches = Vec::new();
        let (mut i, mut j) = (0, 0);
        loop {
            let route = match (specific.get(i), any.get(j)) {
                (Some(a), Some(b)) if a.sequence() < b.sequence() => {
                    i += 1;
                    a
                }
                (_, Some(b)) => {
                    j += 1;
                    b
                }
                (Some(a), None) => {
                    i += 1;
                    a
                }
                (None, None) => break,
            };

            if let Some(parameters) = route.pattern().match_path(path) {
                matches.push(RouteMatch::new(Arc::clone(route), parameters));
            }
        }

        tracing::debug!(
            method = %method,
            path = %path,
            matches = matches.len(),
            "Found route matches"
        );
        matches
    }

    /// All routes in registration order.
    pub fn routes(&self) -> &[Arc<CompiledRoute>] {
        &self.routes
    }

    /// Routes registered for exactly `method`, in registration order.
    pub fn routes_for(&self, method: HttpMethod) -> &[Arc<CompiledRoute>] {
        self.bucket(method)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Look a route up by name, falling back to its URI pattern.
    pub fn route_named(&self, name_or_pattern: &str) -> Option<&Arc<CompiledRoute>> {
        self.routes
            .iter()
            .find(|r| r.name() == Some(name_or_pattern))
            .or_else(|| self.routes.iter().find(|r| r.uri_pattern() == name_or_pattern))
    }

    /// Build a URI for a named route (or a route pattern).
    ///
    /// Parameters declared by the pattern are substituted; the rest are
    /// appended as a percent-encoded query string, sorted by name.
    pub fn uri_for(&self, name_or_pattern: &str, parameters: &BTreeMap<String, String>) -> RouteResult<String> {
        let route = self
            .route_named(name_or_pattern)
            .ok_or_else(|| RouteError::UnknownRoute(name_or_pattern.to_string()))?;

        let path = route
            .pattern()
            .expand(parameters)
            .map_err(|parameter| RouteError::MissingUriParameter {
                route: name_or_pattern.to_string(),
                parameter,
            })?;

        let declared = route.pattern().parameter_names();
        let query: Vec<String> = parameters
            .iter()
            .filter(|(name, _)| !declared.contains(name))
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(name, QUERY_COMPONENT),
                    utf8_percent_encode(value, QUERY_COMPONENT)
                )
            })
            .collect();

        let mut uri = self.uri_for_path(&path);
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query.join("&"));
        }
        Ok(uri)
    }

    /// Prefix a relative URI with the application path.
    pub fn uri_for_path(&self, relative_uri: &str) -> String {
        if relative_uri.starts_with('/') {
            format!("{}{}", self.application_path, relative_uri)
        } else {
            format!("{}/{}", self.application_path, relative_uri)
        }
    }

    pub fn application_path(&self) -> &str {
        &self.application_path
    }

    /// The part of a request path below the application path, which is
    /// what routes are matched against. `None` if the path lies outside it.
    pub fn relative_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.application_path.is_empty() {
            return Some(path);
        }
        match path.strip_prefix(self.application_path.as_str())? {
            "" => Some("/"),
            rest if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    /// Set the path the application is mounted under.
    ///
    /// `""` and `"/"` mean the root; otherwise the path gets a leading `/`
    /// and loses any trailing `/`.
    pub fn set_application_path(&mut self, application_path: &str) {
        let trimmed = application_path.trim();
        self.application_path = if trimmed.is_empty() || trimmed == "/" {
            String::new()
        } else {
            let with_slash = if trimmed.starts_with('/') {
                trimmed.to_string()
            } else {
                format!("/{}", trimmed)
            };
            with_slash.trim_end_matches('/').to_string()
        };
    }

    /// Path prefixes the dispatcher answers with "not found" without
    /// looking at the route table. They are relative to the application
    /// path.
    pub fn ignore_paths<I, S>(&mut self, prefixes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for prefix in prefixes {
            let prefix = prefix.into();
            let prefix = if prefix.starts_with('/') { prefix } else { format!("/{}", prefix) };
            self.ignore_paths.insert(prefix);
        }
    }

    pub fn ignored_paths(&self) -> impl Iterator<Item = &str> {
        self.ignore_paths.iter().map(String::as_str)
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn bucket(&self, method: HttpMethod) -> &[Arc<CompiledRoute>] {
        self.by_method.get(&method).map_or(&[][..], Vec::as_slice)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("application_path", &self.application_path)
            .field("ignore_paths", &self.ignore_paths)
            .field("transformers", &self.transformers.len())
            .finish()
    }
}
