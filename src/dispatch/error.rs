//! Handler failures.

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::ResponseError;
use crate::routing::RouteError;

/// Error returned by a route handler.
///
/// Propagates unchanged out of `RouteContext::next` and
/// `Dispatcher::dispatch`; the server boundary turns it into a status.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler asks for a specific error status.
    #[error("{code}: {message}")]
    Status { code: StatusCode, message: String },

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn status(code: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(error.into())
    }

    /// Status the boundary answers with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Status { code, .. } => *code,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RouteError> for HandlerError {
    fn from(error: RouteError) -> Self {
        Self::Other(Box::new(error))
    }
}

/// Result type for route handlers.
pub type HandlerResult = Result<(), HandlerError>;
