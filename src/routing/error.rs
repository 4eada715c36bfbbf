//! Route registration and reverse-routing errors.

use thiserror::Error;

/// Errors raised while registering routes or building URIs from them.
///
/// All registration errors surface from `Router::add_route` at startup,
/// never while a request is being matched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The URI pattern was empty or blank.
    #[error("The uri pattern cannot be null or empty")]
    EmptyUriPattern,

    /// The request method token is not a recognized HTTP verb.
    #[error("Invalid request method '{0}'")]
    InvalidMethod(String),

    /// The URI pattern could not be compiled.
    #[error("Invalid uri pattern '{pattern}': {reason}")]
    InvalidUriPattern { pattern: String, reason: String },

    /// No route is registered under this name or pattern.
    #[error("No route found for '{0}'")]
    UnknownRoute(String),

    /// A path parameter required by the pattern was not supplied.
    #[error("Missing value for path parameter '{parameter}' of '{route}'")]
    MissingUriParameter { route: String, parameter: String },
}

impl RouteError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUriPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;
