//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::http::{HeaderName, HeaderValue, Method, Uri};
use routechain::{HandlerResult, Request, RouteContext};

/// Records which handlers ran, in order.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.calls.lock().unwrap().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Interceptor that records `label` and continues the chain.
    pub fn pass(&self, label: &'static str) -> impl Fn(&mut RouteContext) -> HandlerResult + Send + Sync + 'static {
        let recorder = self.clone();
        move |ctx: &mut RouteContext| -> HandlerResult {
            recorder.push(label);
            ctx.next()
        }
    }

    /// Handler that records `label`, sends it as the body and stops.
    pub fn answer(&self, label: &'static str) -> impl Fn(&mut RouteContext) -> HandlerResult + Send + Sync + 'static {
        let recorder = self.clone();
        move |ctx: &mut RouteContext| -> HandlerResult {
            recorder.push(label);
            ctx.send(label)?;
            Ok(())
        }
    }

    /// Handler that records `label` and stops without touching the response.
    pub fn stop(&self, label: &'static str) -> impl Fn(&mut RouteContext) -> HandlerResult + Send + Sync + 'static {
        let recorder = self.clone();
        move |_: &mut RouteContext| -> HandlerResult {
            recorder.push(label);
            Ok(())
        }
    }
}

/// Build a request for `path`.
pub fn request(method: Method, path: &str) -> Request {
    Request::new(method, path.parse::<Uri>().unwrap())
}

/// Build a request carrying one header.
pub fn request_with_header(method: Method, path: &str, name: &'static str, value: &str) -> Request {
    request(method, path).with_header(
        HeaderName::from_static(name),
        HeaderValue::from_str(value).unwrap(),
    )
}
