//! Request handling.
//!
//! # Responsibilities
//! - Hold the buffered request a route chain works on
//! - Carry a request ID (taken from `x-request-id` or generated)
//! - Expose path, query parameters and headers to handlers
//! - Hold typed request-scoped values for interceptors and handlers
//! - Let HTML forms tunnel other methods through a POST (`_method`)
//!
//! # Design Decisions
//! - The body is fully buffered before dispatch; handlers run on a
//!   blocking thread and never await
//! - The path is percent-decoded once, when the request is built; routes
//!   match and bind decoded text. Query strings are decoded on access

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use percent_encoding::percent_decode_str;
use uuid::Uuid;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Form parameter naming the method a POST form stands for.
pub const METHOD_OVERRIDE_PARAMETER: &str = "_method";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// A buffered HTTP request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    request_id: String,
    extensions: Extensions,
}

impl Request {
    /// Create a request without headers or body and with a fresh request ID.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            path: decode_path(&uri),
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            request_id: Uuid::new_v4().to_string(),
            extensions: Extensions::new(),
        }
    }

    /// Build a request from the parts of an incoming HTTP request.
    ///
    /// The client's `x-request-id` is kept when it is valid UTF-8.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            method: parts.method,
            path: decode_path(&parts.uri),
            uri: parts.uri,
            headers: parts.headers,
            body,
            request_id,
            extensions: parts.extensions,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Percent-decoded request path. Invalid UTF-8 sequences become
    /// U+FFFD.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request path as sent, still percent-encoded.
    pub fn raw_path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// First value of a query parameter, form-decoded.
    pub fn query_parameter(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// First value of a parameter in a form-encoded body.
    pub fn form_parameter(&self, name: &str) -> Option<String> {
        if !self.has_content_type(FORM_URLENCODED) {
            return None;
        }
        url::form_urlencoded::parse(&self.body)
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// The method a POST form asks for through its `_method` parameter.
    ///
    /// Only POST requests with a form content type are considered. The
    /// query string is checked first, then a form-encoded body; the value
    /// is upper-cased. `None` when absent, empty or not a method token.
    pub fn method_override(&self) -> Option<Method> {
        if self.method != Method::POST
            || !(self.has_content_type(FORM_URLENCODED) || self.has_content_type(MULTIPART_FORM_DATA))
        {
            return None;
        }

        let value = self
            .query_parameter(METHOD_OVERRIDE_PARAMETER)
            .or_else(|| self.form_parameter(METHOD_OVERRIDE_PARAMETER))?;
        let value = value.trim().to_ascii_uppercase();
        if value.is_empty() {
            return None;
        }
        Method::from_bytes(value.as_bytes()).ok()
    }

    pub(crate) fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Compares the media type of `Content-Type`, ignoring parameters.
    fn has_content_type(&self, media_type: &str) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(media_type))
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

fn decode_path(uri: &Uri) -> String {
    percent_decode_str(uri.path()).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn test_query_parameter_is_decoded() {
        let request = Request::new(Method::GET, Uri::from_static("/search?q=a+b%26c&page=2&q=ignored"));
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query_parameter("q").as_deref(), Some("a b&c"));
        assert_eq!(request.query_parameter("page").as_deref(), Some("2"));
        assert_eq!(request.query_parameter("missing"), None);
    }

    #[test]
    fn test_path_is_percent_decoded() {
        let request = Request::new(Method::GET, Uri::from_static("/contact/John%20Doe?x=1"));
        assert_eq!(request.path(), "/contact/John Doe");
        assert_eq!(request.raw_path(), "/contact/John%20Doe");

        let request = Request::new(Method::GET, Uri::from_static("/caf%C3%A9/%FF"));
        assert_eq!(request.path(), "/café/\u{FFFD}");
    }

    fn form_post(uri: &'static str, content_type: &'static str, body: &'static str) -> Request {
        Request::new(Method::POST, Uri::from_static(uri))
            .with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
            .with_body(body)
    }

    #[test]
    fn test_method_override_from_form_body() {
        let request = form_post("/contact/5", "application/x-www-form-urlencoded", "name=x&_method=delete");
        assert_eq!(request.method_override(), Some(Method::DELETE));
        assert_eq!(request.form_parameter("name").as_deref(), Some("x"));

        let request = form_post(
            "/contact/5",
            "application/x-www-form-urlencoded; charset=UTF-8",
            "_method=PUT",
        );
        assert_eq!(request.method_override(), Some(Method::PUT));
    }

    #[test]
    fn test_method_override_from_query_for_multipart() {
        let request = form_post("/upload?_method=put", "multipart/form-data; boundary=x", "--x--");
        assert_eq!(request.method_override(), Some(Method::PUT));
        assert_eq!(request.form_parameter("_method"), None);
    }

    #[test]
    fn test_method_override_needs_form_post() {
        let json = form_post("/contact/5", "application/json", "_method=DELETE");
        assert_eq!(json.method_override(), None);

        let get = Request::new(Method::GET, Uri::from_static("/contact/5?_method=DELETE"))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        assert_eq!(get.method_override(), None);

        let empty = form_post("/contact/5", "application/x-www-form-urlencoded", "_method=");
        assert_eq!(empty.method_override(), None);

        let invalid = form_post("/contact/5", "application/x-www-form-urlencoded", "_method=DE%20LETE");
        assert_eq!(invalid.method_override(), None);
    }

    #[test]
    fn test_from_parts_keeps_request_id() {
        let (parts, _) = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/contact")
            .header(X_REQUEST_ID, "abc-123")
            .header(AUTHORIZATION, "token")
            .body(())
            .unwrap()
            .into_parts();

        let request = Request::from_parts(parts, Bytes::from_static(b"name=John"));
        assert_eq!(request.request_id(), "abc-123");
        assert_eq!(request.header("authorization"), Some("token"));
        assert_eq!(request.body().as_ref(), b"name=John");
    }

    #[test]
    fn test_generated_request_id() {
        let a = Request::new(Method::GET, Uri::from_static("/"));
        let b = Request::new(Method::GET, Uri::from_static("/"));
        assert_ne!(a.request_id(), b.request_id());
        assert!(Uuid::parse_str(a.request_id()).is_ok());
    }
}
