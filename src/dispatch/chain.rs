//! Per-request handler chain.
//!
//! # Responsibilities
//! - Hold the matches of one request, in registration order
//! - Track which match runs next and which one is running now
//! - Report the chain state to handlers
//!
//! # Design Decisions
//! - The match list is immutable; advancing moves a cursor
//! - Nesting depth tells a handler running inside `next()` apart from the
//!   chain having returned to the dispatcher

use crate::routing::RouteMatch;

/// Where a request is in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// The chain has not been started.
    Pending,
    /// A handler is executing.
    Running,
    /// The outermost `next()` returned, even if it had nothing to run.
    Terminal,
}

/// Cursor over the routes matched for one request.
#[derive(Debug)]
pub struct RouteHandlerChain {
    matches: Vec<RouteMatch>,
    cursor: usize,
    current: Option<usize>,
    depth: usize,
    executed: usize,
    finished: bool,
}

impl RouteHandlerChain {
    pub fn new(matches: Vec<RouteMatch>) -> Self {
        Self {
            matches,
            cursor: 0,
            current: None,
            depth: 0,
            executed: 0,
            finished: false,
        }
    }

    pub fn matches(&self) -> &[RouteMatch] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.matches.len()
    }

    /// Matches the cursor has not reached yet.
    pub fn remaining(&self) -> usize {
        self.matches.len() - self.cursor
    }

    /// Number of handlers invoked so far, finally routes included.
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// The match whose handler is executing.
    pub fn current(&self) -> Option<&RouteMatch> {
        self.current.and_then(|index| self.matches.get(index))
    }

    pub fn state(&self) -> ChainState {
        if self.depth > 0 {
            ChainState::Running
        } else if self.finished {
            ChainState::Terminal
        } else {
            ChainState::Pending
        }
    }

    /// Take the next match off the cursor. Called outside any handler with
    /// nothing left, the chain is finished.
    pub(crate) fn advance(&mut self) -> Option<usize> {
        if !self.has_next() {
            if self.depth == 0 {
                self.finished = true;
            }
            return None;
        }
        let index = self.cursor;
        self.cursor += 1;
        Some(index)
    }

    /// Take every match not yet reached that asked to run as finally.
    /// The cursor is exhausted afterwards.
    pub(crate) fn take_finally(&mut self) -> Vec<usize> {
        let pending = (self.cursor..self.matches.len())
            .filter(|&index| self.matches[index].route().is_run_as_finally())
            .collect();
        self.cursor = self.matches.len();
        pending
    }

    /// Mark `index` as running. Returns the match that was running before.
    pub(crate) fn enter(&mut self, index: usize) -> Option<usize> {
        self.depth += 1;
        self.executed += 1;
        self.current.replace(index)
    }

    pub(crate) fn leave(&mut self, previous: Option<usize>) {
        self.depth = self.depth.saturating_sub(1);
        self.current = previous;
        if self.depth == 0 {
            self.finished = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{HandlerResult, RouteContext};
    use crate::routing::{HttpMethod, Route, Router};

    fn noop(_: &mut RouteContext) -> HandlerResult {
        Ok(())
    }

    fn chain() -> RouteHandlerChain {
        let mut router = Router::new();
        router.add_route(Route::all("/.*", noop)).unwrap();
        router.add_route(Route::get("/a", noop)).unwrap();
        router.add_route(Route::all("/.*", noop).run_as_finally()).unwrap();
        RouteHandlerChain::new(router.find_routes(HttpMethod::Get, "/a"))
    }

    #[test]
    fn test_cursor_and_state() {
        let mut chain = chain();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.state(), ChainState::Pending);

        let first = chain.advance().unwrap();
        let previous = chain.enter(first);
        assert_eq!(previous, None);
        assert_eq!(chain.state(), ChainState::Running);
        assert_eq!(chain.remaining(), 2);
        assert_eq!(chain.current().unwrap().route().uri_pattern(), "/.*");

        chain.leave(previous);
        assert_eq!(chain.state(), ChainState::Terminal);
        assert!(chain.current().is_none());
        assert_eq!(chain.executed(), 1);
    }

    #[test]
    fn test_empty_chain_finishes_when_advanced() {
        let mut chain = RouteHandlerChain::new(Vec::new());
        assert_eq!(chain.state(), ChainState::Pending);

        assert!(chain.advance().is_none());
        assert_eq!(chain.state(), ChainState::Terminal);
        assert_eq!(chain.executed(), 0);
    }

    #[test]
    fn test_take_finally_skips_plain_routes() {
        let mut chain = chain();
        chain.advance();

        assert_eq!(chain.take_finally(), vec![2]);
        assert!(!chain.has_next());
        assert!(chain.advance().is_none());
    }
}
