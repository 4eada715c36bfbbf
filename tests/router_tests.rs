//! Route table behavior seen through the public API.

use std::collections::BTreeMap;

use routechain::routing::{HttpMethod, Route, RouteError, RouteGroup, Router};
use routechain::{HandlerResult, RouteContext};

fn noop(_: &mut RouteContext) -> HandlerResult {
    Ok(())
}

fn matched(router: &Router, method: HttpMethod, path: &str) -> Vec<String> {
    router
        .find_routes(method, path)
        .iter()
        .map(|m| m.route().uri_pattern().to_string())
        .collect()
}

#[test]
fn test_literal_pattern_matches_exactly() {
    let mut router = Router::new();
    router.add_route(Route::get("/contact", noop)).unwrap();

    assert_eq!(matched(&router, HttpMethod::Get, "/contact"), vec!["/contact"]);
    assert!(matched(&router, HttpMethod::Get, "/contact/").is_empty());
    assert!(matched(&router, HttpMethod::Get, "/contact/3").is_empty());
}

#[test]
fn test_wildcard_does_not_shadow_parameters() {
    let mut router = Router::new();
    router.add_route(Route::get("/*", noop)).unwrap();
    router.add_route(Route::get("/contact/:id", noop)).unwrap();

    let matches = router.find_routes(HttpMethod::Get, "/contact/3");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].route().uri_pattern(), "/*");
    assert!(matches[0].path_parameters().is_empty());
    assert_eq!(matches[1].path_parameters()["id"], "3");
}

#[test]
fn test_wildcard_registered_after_handler_runs_after_it() {
    let mut router = Router::new();
    router.add_route(Route::get("/contact/{id}", noop)).unwrap();
    router.add_route(Route::get("/*", noop)).unwrap();

    assert_eq!(
        matched(&router, HttpMethod::Get, "/contact/3"),
        vec!["/contact/{id}", "/*"]
    );
}

#[test]
fn test_bindings_per_declared_parameter() {
    let mut router = Router::new();
    router
        .add_route(Route::get("/{a}/{b}/{c}/{d: [0-9]+}", noop))
        .unwrap();

    let matches = router.find_routes(HttpMethod::Get, "/w/x/y/42");
    assert_eq!(matches.len(), 1);
    let params = matches[0].path_parameters();
    assert_eq!(params.len(), 4);
    assert_eq!(params["a"], "w");
    assert_eq!(params["d"], "42");
}

#[test]
fn test_nonexistent_path_has_no_matches() {
    let mut router = Router::new();
    router.add_route(Route::get("/contact/{id}", noop)).unwrap();
    router.add_route(Route::post("/.*", noop)).unwrap();

    assert!(router.find_routes(HttpMethod::Get, "/nonexistent").is_empty());
}

#[test]
fn test_method_filtering() {
    let mut router = Router::new();
    router.add_route(Route::get("/contact", noop)).unwrap();
    router.add_route(Route::post("/contact", noop)).unwrap();
    router.add_route(Route::new("ANY", "/contact", noop)).unwrap();

    let methods: Vec<_> = router
        .find_routes(HttpMethod::Post, "/contact")
        .iter()
        .map(|m| m.route().method())
        .collect();
    assert_eq!(methods, vec![HttpMethod::Post, HttpMethod::All]);
    assert_eq!(router.find_routes(HttpMethod::Delete, "/contact").len(), 1);
}

#[test]
fn test_registration_errors() {
    let mut router = Router::new();

    assert_eq!(
        router.add_route(Route::new("GETT", "/.*", noop)).unwrap_err(),
        RouteError::InvalidMethod("GETT".into())
    );
    assert_eq!(
        router.add_route(Route::get("", noop)).unwrap_err(),
        RouteError::EmptyUriPattern
    );
    assert!(matches!(
        router.add_route(Route::get("/contact/{id", noop)).unwrap_err(),
        RouteError::InvalidUriPattern { .. }
    ));
    assert!(router.is_empty());
}

#[test]
fn test_duplicate_registration_keeps_both() {
    let mut router = Router::new();
    router.add_route(Route::all("/.*", noop)).unwrap();
    router.add_route(Route::all("/.*", noop).run_as_finally()).unwrap();

    let matches = router.find_routes(HttpMethod::Get, "/");
    assert_eq!(matches.len(), 2);
    assert!(!matches[0].route().is_run_as_finally());
    assert!(matches[1].route().is_run_as_finally());
}

#[test]
fn test_groups_and_reverse_routing() {
    let mut router = Router::new();
    router.set_application_path("/app");
    router
        .add_route_group(
            RouteGroup::new("/users")
                .named("users.")
                .route(Route::get("/", noop).named("list"))
                .group(RouteGroup::new("/{id: [0-9]+}").route(Route::get("/posts/{post}", noop).named("post"))),
        )
        .unwrap();

    assert_eq!(matched(&router, HttpMethod::Get, "/users"), vec!["/users"]);
    assert_eq!(
        matched(&router, HttpMethod::Get, "/users/7/posts/hello"),
        vec!["/users/{id: [0-9]+}/posts/{post}"]
    );

    let params = BTreeMap::from([
        ("id".to_string(), "7".to_string()),
        ("post".to_string(), "hello".to_string()),
        ("draft".to_string(), "true".to_string()),
    ]);
    assert_eq!(
        router.uri_for("users.post", &params).unwrap(),
        "/app/users/7/posts/hello?draft=true"
    );
    assert_eq!(router.uri_for("users.list", &BTreeMap::new()).unwrap(), "/app/users");
}

#[test]
fn test_introspection_in_registration_order() {
    let mut router = Router::new();
    router.add_route(Route::post("/b", noop)).unwrap();
    router.add_route(Route::get("/a", noop)).unwrap();
    router.add_route(Route::get("/c", noop)).unwrap();

    let all: Vec<_> = router.routes().iter().map(|r| r.to_string()).collect();
    assert_eq!(all, vec!["POST '/b'", "GET '/a'", "GET '/c'"]);

    let gets: Vec<_> = router
        .routes_for(HttpMethod::Get)
        .iter()
        .map(|r| r.uri_pattern().to_string())
        .collect();
    assert_eq!(gets, vec!["/a", "/c"]);
}

#[test]
fn test_alternation_does_not_escape_anchors() {
    let mut router = Router::new();
    router.add_route(Route::get("/a|/b", noop)).unwrap();

    assert_eq!(matched(&router, HttpMethod::Get, "/a"), vec!["/a|/b"]);
    assert_eq!(matched(&router, HttpMethod::Get, "/b"), vec!["/a|/b"]);
    assert!(matched(&router, HttpMethod::Get, "/a/zzz").is_empty());
    assert!(matched(&router, HttpMethod::Get, "x/b").is_empty());
}

#[test]
fn test_colon_and_brace_parameters_accept_the_same_names() {
    let mut router = Router::new();
    router.add_route(Route::get("/a/:post-id", noop)).unwrap();
    router.add_route(Route::get("/b/{post-id}", noop)).unwrap();

    assert_eq!(router.find_routes(HttpMethod::Get, "/a/7")[0].path_parameters()["post-id"], "7");
    assert_eq!(router.find_routes(HttpMethod::Get, "/b/7")[0].path_parameters()["post-id"], "7");
}

#[test]
fn test_remove_route_group_undoes_add_route_group() {
    let group = RouteGroup::new("/users")
        .named("users.")
        .route(Route::get("/", noop).named("list"))
        .group(RouteGroup::new("/{id}").route(Route::delete("/", noop)));

    let mut router = Router::new();
    router.add_route(Route::get("/", noop)).unwrap();
    router.add_route_group(group.clone()).unwrap();
    assert_eq!(router.len(), 3);

    assert_eq!(router.remove_route_group(&group), 2);
    assert_eq!(router.len(), 1);
    assert!(router.route_named("users.list").is_none());
    assert!(router.find_routes(HttpMethod::Delete, "/users/3").is_empty());
}

#[test]
fn test_transformer_applies_to_group_routes() {
    let mut router = Router::new();
    router.add_route_transformer(|route: Route| -> Option<Route> {
        let secured = route.uri_pattern().starts_with("/admin");
        Some(if secured { route.bind("secure", "true") } else { route })
    });
    router
        .add_route_group(
            RouteGroup::new("/admin")
                .route(Route::get("/users", noop))
                .route(Route::get("/stats", noop)),
        )
        .unwrap();
    router.add_route(Route::get("/about", noop)).unwrap();

    let secure: Vec<_> = router
        .routes()
        .iter()
        .map(|r| (r.uri_pattern().to_string(), r.route().attribute("secure").is_some()))
        .collect();
    assert_eq!(
        secure,
        vec![
            ("/admin/users".to_string(), true),
            ("/admin/stats".to_string(), true),
            ("/about".to_string(), false),
        ]
    );
}
