//! Route groups.
//!
//! A group prefixes the URI pattern of every route it holds, prefixes the
//! names of its named routes with its own name, and hands its attributes
//! down to routes that do not set them. Groups nest; a child group sees
//! the prefix, name and attributes of all of its ancestors.

use std::collections::BTreeMap;

use crate::routing::route::Route;

/// A set of routes sharing a URI prefix.
#[derive(Debug, Clone)]
pub struct RouteGroup {
    uri_pattern: String,
    name: Option<String>,
    routes: Vec<Route>,
    children: Vec<RouteGroup>,
    attributes: BTreeMap<String, String>,
}

impl RouteGroup {
    pub fn new(uri_pattern: impl Into<String>) -> Self {
        Self {
            uri_pattern: uri_pattern.into(),
            name: None,
            routes: Vec::new(),
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn bind(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a route to the group.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Nest a group inside this one.
    pub fn group(mut self, child: RouteGroup) -> Self {
        self.children.push(child);
        self
    }

    pub fn uri_pattern(&self) -> &str {
        &self.uri_pattern
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn children(&self) -> &[RouteGroup] {
        &self.children
    }

    /// Resolve the group tree into absolute routes, own routes before
    /// children, in declaration order.
    pub(crate) fn flatten(self) -> Vec<Route> {
        let mut routes = Vec::new();
        self.flatten_into("", "", &BTreeMap::new(), &mut routes);
        routes
    }

    fn flatten_into(
        self,
        parent_pattern: &str,
        parent_name: &str,
        parent_attributes: &BTreeMap<String, String>,
        out: &mut Vec<Route>,
    ) {
        let prefix = concat_uri_pattern(parent_pattern, &self.uri_pattern);
        let name_prefix = format!("{}{}", parent_name, self.name.as_deref().unwrap_or_default());

        let mut attributes = parent_attributes.clone();
        attributes.extend(self.attributes);

        for mut route in self.routes {
            route.set_uri_pattern(concat_uri_pattern(&prefix, route.uri_pattern()));
            if let Some(name) = route.name() {
                if !name_prefix.is_empty() {
                    let full_name = format!("{}{}", name_prefix, name);
                    route.set_name(full_name);
                }
            }
            route.inherit_attributes(&attributes);
            out.push(route);
        }

        for child in self.children {
            child.flatten_into(&prefix, &name_prefix, &attributes, out);
        }
    }
}

/// Join a prefix and a pattern with exactly one `/`, dropping a trailing
/// `/` unless the result is the root.
fn concat_uri_pattern(prefix: &str, uri_pattern: &str) -> String {
    let mut joined = prefix.trim_end_matches('/').to_string();
    if !uri_pattern.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(uri_pattern);

    if joined.is_empty() || joined == "/" {
        return "/".to_string();
    }
    match joined.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{HandlerResult, RouteContext};

    fn noop(_: &mut RouteContext) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn test_concat_uri_pattern() {
        assert_eq!(concat_uri_pattern("", "/"), "/");
        assert_eq!(concat_uri_pattern("", ""), "/");
        assert_eq!(concat_uri_pattern("/users", "/"), "/users");
        assert_eq!(concat_uri_pattern("/users", ""), "/users");
        assert_eq!(concat_uri_pattern("/users/", "{id}"), "/users/{id}");
        assert_eq!(concat_uri_pattern("/", "/about"), "/about");
    }

    #[test]
    fn test_flatten_nested_groups() {
        let group = RouteGroup::new("/users")
            .named("users.")
            .bind("layout", "users")
            .route(Route::get("/", noop).named("list"))
            .route(Route::post("", noop))
            .group(
                RouteGroup::new("/{id}")
                    .named("user.")
                    .bind("secure", "yes")
                    .route(Route::get("/", noop).named("show"))
                    .route(Route::delete("/", noop).bind("layout", "none")),
            );

        let routes = group.flatten();
        let summary: Vec<_> = routes
            .iter()
            .map(|r| (r.request_method(), r.uri_pattern(), r.name()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("GET", "/users", Some("users.list")),
                ("POST", "/users", None),
                ("GET", "/users/{id}", Some("users.user.show")),
                ("DELETE", "/users/{id}", None),
            ]
        );

        assert_eq!(routes[0].attribute("layout"), Some("users"));
        assert_eq!(routes[0].attribute("secure"), None);
        assert_eq!(routes[2].attribute("secure"), Some("yes"));
        assert_eq!(routes[3].attribute("layout"), Some("none"));
    }
}
