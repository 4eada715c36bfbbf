//! Route table shared between request workers and late registration.
//!
//! Readers take a snapshot per request without locking. Writers clone the
//! current table, change the clone and swap it in; a mutex serialises
//! writers so concurrent updates are not lost.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::routing::router::Router;

#[derive(Debug, Clone)]
pub struct SharedRouter {
    current: Arc<ArcSwap<Router>>,
    writer: Arc<Mutex<()>>,
}

impl SharedRouter {
    pub fn new(router: Router) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(router)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// The table as of now. Requests in flight keep the snapshot they took.
    pub fn snapshot(&self) -> Arc<Router> {
        self.current.load_full()
    }

    /// Apply a change to a copy of the table and publish it.
    ///
    /// Nothing is published when `change` fails.
    pub fn update<T, E, F>(&self, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut Router) -> Result<T, E>,
    {
        // A poisoned lock only means another writer panicked mid-clone; the
        // published table is still intact.
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut next = Router::clone(&self.current.load());
        let value = change(&mut next)?;
        self.current.store(Arc::new(next));

        tracing::debug!(routes = self.current.load().len(), "Published route table");
        Ok(value)
    }

    /// Replace the whole table.
    pub fn replace(&self, router: Router) -> Arc<Router> {
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.current.swap(Arc::new(router))
    }
}

impl From<Router> for SharedRouter {
    fn from(router: Router) -> Self {
        Self::new(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{HandlerResult, RouteContext};
    use crate::routing::{HttpMethod, Route, RouteError};

    fn noop(_: &mut RouteContext) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn test_update_publishes_new_snapshot() {
        let shared = SharedRouter::new(Router::new());
        let before = shared.snapshot();

        shared
            .update(|router| router.add_route(Route::get("/contact", noop)).map(|_| ()))
            .unwrap();

        assert!(before.is_empty());
        assert_eq!(shared.snapshot().len(), 1);
        assert_eq!(shared.snapshot().find_routes(HttpMethod::Get, "/contact").len(), 1);
    }

    #[test]
    fn test_failed_update_publishes_nothing() {
        let shared = SharedRouter::new(Router::new());
        let result = shared.update(|router| {
            router.add_route(Route::get("/ok", noop))?;
            router.add_route(Route::new("GETT", "/bad", noop))?;
            Ok::<_, RouteError>(())
        });

        assert!(result.is_err());
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn test_replace() {
        let shared = SharedRouter::new(Router::new());
        let mut router = Router::new();
        router.add_route(Route::all("/.*", noop)).unwrap();

        let old = shared.replace(router);
        assert!(old.is_empty());
        assert_eq!(shared.snapshot().len(), 1);
    }
}
