//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that hands every request to the dispatcher
//! - Wire up middleware (tracing, request timeout)
//! - Buffer the request body within the configured limit
//! - Run the synchronous dispatcher on the blocking pool
//! - Map outcomes and handler errors to HTTP responses

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::dispatch::{Dispatcher, HandlerError};
use crate::http::request::{Request, X_REQUEST_ID};

/// Application state injected into the fallback handler.
#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
    body_limit: usize,
}

/// HTTP server fronting a [`Dispatcher`].
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(config: AppConfig, dispatcher: Dispatcher) -> Self {
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            body_limit: config.listener.body_limit,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Every method and path goes to the fallback; the route table decides.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The Axum router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Buffers the request and runs it through the route chain.
async fn dispatch_handler(State(state): State<AppState>, request: axum::extract::Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Request body rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let request = Request::from_parts(parts, body);
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let path = request.path().to_string();

    tracing::debug!(request_id = %request_id, method = %method, path = %path, "Dispatching request");

    let dispatcher = Arc::clone(&state.dispatcher);
    let result = tokio::task::spawn_blocking(move || dispatcher.dispatch(request)).await;

    let mut response = match result {
        Ok(Ok(outcome)) => {
            if outcome.is_not_found() {
                tracing::debug!(request_id = %request_id, path = %path, "Not found");
            }
            outcome.into_response().into_response()
        }
        Ok(Err(error)) => error_response(&request_id, &error),
        Err(join_error) => {
            tracing::error!(request_id = %request_id, error = %join_error, "Route handler panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

fn error_response(request_id: &str, error: &HandlerError) -> Response {
    let status = error.status_code();
    match error {
        HandlerError::Status { message, .. } => {
            tracing::info!(request_id = %request_id, status = %status, message = %message, "Handler answered with error status");
            (status, message.clone()).into_response()
        }
        _ => {
            tracing::error!(request_id = %request_id, error = %error, "Route handler failed");
            let reason = status.canonical_reason().unwrap_or_default();
            (status, reason).into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
