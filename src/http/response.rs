//! Response handling.
//!
//! # Responsibilities
//! - Collect status, headers and body written by route handlers
//! - Enforce the commit rule: once committed, the response is read-only
//! - Convert into an axum response at the server boundary
//!
//! # Design Decisions
//! - Status starts unset; the dispatcher uses "still unset" to detect a
//!   chain in which no handler produced a response
//! - Write errors are values (`ResponseError`), handlers propagate them with `?`

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use thiserror::Error;

/// Errors raised when writing to a response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseError {
    /// The response was already committed.
    #[error("The response has already been committed")]
    Committed,

    /// Header name or value is not valid HTTP.
    #[error("Invalid header '{0}'")]
    InvalidHeader(String),
}

/// A response under construction.
#[derive(Debug, Default)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// A committed, empty `404 Not Found`.
    pub fn not_found() -> Self {
        Self {
            status: Some(StatusCode::NOT_FOUND),
            committed: true,
            ..Self::default()
        }
    }

    /// Status set so far, `None` if no handler set one.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<(), ResponseError> {
        self.check_writable()?;
        self.status = Some(status);
        Ok(())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ResponseError> {
        self.check_writable()?;
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ResponseError::InvalidHeader(name.to_string()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| ResponseError::InvalidHeader(name.to_string()))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Append to the body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> Result<(), ResponseError> {
        self.check_writable()?;
        self.body.extend_from_slice(chunk.as_ref());
        Ok(())
    }

    /// Write a text body and commit. Status defaults to `200 OK`.
    pub fn send(&mut self, body: impl Into<String>) -> Result<(), ResponseError> {
        self.check_writable()?;
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        }
        self.body = body.into().into_bytes();
        self.commit();
        Ok(())
    }

    /// Answer with `302 Found` to `location` and commit.
    pub fn redirect(&mut self, location: &str) -> Result<(), ResponseError> {
        self.check_writable()?;
        let value = HeaderValue::from_str(location)
            .map_err(|_| ResponseError::InvalidHeader(LOCATION.to_string()))?;
        self.headers.insert(LOCATION, value);
        self.status = Some(StatusCode::FOUND);
        self.commit();
        Ok(())
    }

    /// Freeze the response. An unset status becomes `200 OK`.
    pub fn commit(&mut self) {
        if self.committed {
            return;
        }
        self.status.get_or_insert(StatusCode::OK);
        self.committed = true;
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    fn check_writable(&self) -> Result<(), ResponseError> {
        if self.committed {
            return Err(ResponseError::Committed);
        }
        Ok(())
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let status = self.status.unwrap_or(StatusCode::OK);
        let mut response = axum::response::Response::new(Body::from(Bytes::from(self.body)));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_starts_unset() {
        let response = Response::new();
        assert_eq!(response.status(), None);
        assert!(!response.is_committed());
    }

    #[test]
    fn test_send_commits() {
        let mut response = Response::new();
        response.send("Hello").unwrap();

        assert!(response.is_committed());
        assert_eq!(response.status(), Some(StatusCode::OK));
        assert_eq!(response.text(), Some("Hello"));
        assert_eq!(response.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_writes_after_commit_fail() {
        let mut response = Response::new();
        response.set_status(StatusCode::CREATED).unwrap();
        response.commit();

        assert_eq!(response.status(), Some(StatusCode::CREATED));
        assert_eq!(response.set_status(StatusCode::OK), Err(ResponseError::Committed));
        assert_eq!(response.set_header("x-a", "b"), Err(ResponseError::Committed));
        assert_eq!(response.write("late"), Err(ResponseError::Committed));
        assert_eq!(response.send("late"), Err(ResponseError::Committed));
        assert_eq!(response.redirect("/login"), Err(ResponseError::Committed));
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_redirect() {
        let mut response = Response::new();
        response.redirect("/login").unwrap();
        assert_eq!(response.status(), Some(StatusCode::FOUND));
        assert_eq!(response.header("location"), Some("/login"));
        assert!(response.is_committed());
    }

    #[test]
    fn test_invalid_header() {
        let mut response = Response::new();
        assert_eq!(
            response.set_header("bad header", "x"),
            Err(ResponseError::InvalidHeader("bad header".into()))
        );
        assert_eq!(
            response.set_header("x-ok", "line\nbreak"),
            Err(ResponseError::InvalidHeader("x-ok".into()))
        );
    }

    #[test]
    fn test_into_axum_response() {
        let mut response = Response::new();
        response.set_status(StatusCode::ACCEPTED).unwrap();
        response.set_header("x-route", "contact").unwrap();

        let response = response.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-route"], "contact");
    }
}
