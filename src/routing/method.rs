//! HTTP request methods known to the router.

use std::fmt;
use std::str::FromStr;

use axum::http::Method;
use serde::Serialize;

use crate::routing::error::RouteError;

/// Request method a route is registered for.
///
/// `All` is not a wire method: routes registered with it are consulted for
/// every incoming request, whatever its method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
    Connect,
    All,
}

impl HttpMethod {
    /// Canonical upper-case token.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::All => "ALL",
        }
    }

    /// Maps a wire method onto a router method.
    ///
    /// Extension methods have no routes and map to `None`.
    pub fn from_http(method: &Method) -> Option<Self> {
        method.as_str().parse().ok().filter(|m| *m != HttpMethod::All)
    }
}

impl FromStr for HttpMethod {
    type Err = RouteError;

    /// Tokens are case-sensitive, as on the wire. `ANY` is accepted as an
    /// alias of `ALL`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            "CONNECT" => Ok(HttpMethod::Connect),
            "ALL" | "ANY" => Ok(HttpMethod::All),
            other => Err(RouteError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
