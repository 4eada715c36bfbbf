//! Contact book served by `routechain serve`.
//!
//! Shows the chain model end to end: an interceptor guarding `/contact.*`,
//! handlers reading path parameters, reverse routing for links, a route
//! group for the JSON-free API and a finally route that logs every request.

use std::collections::BTreeMap;

use axum::http::StatusCode;

use crate::config::RouterConfig;
use crate::dispatch::{HandlerError, HandlerResult, RouteContext};
use crate::routing::{Route, RouteGroup, RouteResult, Router};

/// Bearer token the demo accepts.
pub const DEMO_TOKEN: &str = "demo-token";

/// The signed-in user, stored as a request local by the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User(pub String);

fn contacts() -> BTreeMap<u32, &'static str> {
    BTreeMap::from([(1, "Ada Lovelace"), (2, "Alan Turing"), (5, "Grace Hopper")])
}

/// Build the demo route table.
pub fn router(config: &RouterConfig) -> RouteResult<Router> {
    let mut router = Router::from_config(config);

    router.add_route(Route::get("/", index).named("index"))?;
    router.add_route(Route::get("/login", login).named("login"))?;
    router.add_route(Route::get("/contact.*", authenticate))?;
    router.add_route(Route::get("/contacts", list_contacts).named("contacts"))?;
    router.add_route(Route::get("/contact/{id: :digit:+}", show_contact).named("contact"))?;
    router.add_route_group(
        RouteGroup::new("/api")
            .named("api.")
            .bind("format", "text")
            .route(Route::get("/contacts/{id: :digit:+}", show_contact).named("contact")),
    )?;
    router.add_route(Route::all("/.*", log_request).run_as_finally())?;

    Ok(router)
}

fn index(ctx: &mut RouteContext) -> HandlerResult {
    let contacts = ctx.uri_for("contacts", &BTreeMap::new())?;
    ctx.send(format!("routechain demo, see {}", contacts))?;
    Ok(())
}

fn login(ctx: &mut RouteContext) -> HandlerResult {
    ctx.send(format!("Send 'Authorization: Bearer {}' to sign in", DEMO_TOKEN))?;
    Ok(())
}

/// Lets the chain continue only for signed-in users.
fn authenticate(ctx: &mut RouteContext) -> HandlerResult {
    let expected = format!("Bearer {}", DEMO_TOKEN);
    if ctx.header("authorization") == Some(expected.as_str()) {
        ctx.set_local(User("demo".to_string()));
        return ctx.next();
    }

    tracing::info!(path = %ctx.request_path(), "Unauthenticated, redirecting to login");
    let login = ctx.uri_for("login", &BTreeMap::new())?;
    ctx.response_mut().redirect(&login)?;
    Ok(())
}

fn list_contacts(ctx: &mut RouteContext) -> HandlerResult {
    let mut lines = Vec::new();
    for (id, name) in contacts() {
        let parameters = BTreeMap::from([("id".to_string(), id.to_string())]);
        lines.push(format!("{} {}", ctx.uri_for("contact", &parameters)?, name));
    }
    ctx.send(lines.join("\n"))?;
    Ok(())
}

fn show_contact(ctx: &mut RouteContext) -> HandlerResult {
    let id = ctx
        .path_parameter("id")
        .and_then(|id| id.parse::<u32>().ok())
        .ok_or_else(|| HandlerError::status(StatusCode::BAD_REQUEST, "Invalid contact id"))?;

    let name = contacts()
        .get(&id)
        .copied()
        .ok_or_else(|| HandlerError::status(StatusCode::NOT_FOUND, format!("No contact {}", id)))?;

    let viewer = ctx.local::<User>().map_or("anonymous", |user| user.0.as_str());
    let body = format!("Contact {}: {} (viewed by {})", id, name, viewer);
    ctx.send(body)?;
    Ok(())
}

fn log_request(ctx: &mut RouteContext) -> HandlerResult {
    tracing::info!(
        request_id = %ctx.request().request_id(),
        method = %ctx.request_method(),
        path = %ctx.request_path(),
        status = ?ctx.response().status().map(|s| s.as_u16()),
        "Request finished"
    );
    Ok(())
}
