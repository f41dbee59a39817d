//! Action middleware
//!
//! Middleware sees every action an effect store dispatches, before and after
//! the reducer runs. Controllers use [`LoggingMiddleware`] so each
//! transition shows up in the trace output.

use crate::Action;

/// Middleware trait for intercepting actions
pub trait Middleware<A: Action> {
    /// Called before the action is dispatched to the reducer
    fn before(&mut self, action: &A);

    /// Called after the action is processed by the reducer
    fn after(&mut self, action: &A, state_changed: bool);
}

/// A no-op middleware
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action> Middleware<A> for NoopMiddleware {
    fn before(&mut self, _action: &A) {}
    fn after(&mut self, _action: &A, _state_changed: bool) {}
}

/// Middleware that traces every action at debug level
///
/// `scope` is attached to each event so that several controllers
/// (a save button and an invalidate button, say) can be told apart.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    /// Label attached to each trace event
    pub scope: &'static str,
    /// Whether to log before dispatch
    pub log_before: bool,
    /// Whether to log after dispatch
    pub log_after: bool,
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new("store")
    }
}

impl LoggingMiddleware {
    /// Log after dispatch only
    pub fn new(scope: &'static str) -> Self {
        Self {
            scope,
            log_before: false,
            log_after: true,
        }
    }

    /// Log both before and after dispatch
    pub fn verbose(scope: &'static str) -> Self {
        Self {
            scope,
            log_before: true,
            log_after: true,
        }
    }
}

impl<A: Action> Middleware<A> for LoggingMiddleware {
    fn before(&mut self, action: &A) {
        if self.log_before {
            tracing::debug!(scope = self.scope, action = %action.name(), "Dispatching action");
        }
    }

    fn after(&mut self, action: &A, state_changed: bool) {
        if self.log_after {
            tracing::debug!(
                scope = self.scope,
                action = %action.name(),
                state_changed = state_changed,
                "Action processed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Ping;

    impl Action for Ping {
        fn name(&self) -> &'static str {
            "Ping"
        }
    }

    #[test]
    fn test_logging_middleware_presets() {
        let quiet = LoggingMiddleware::new("save-form");
        assert_eq!(quiet.scope, "save-form");
        assert!(!quiet.log_before && quiet.log_after);

        let mut verbose = LoggingMiddleware::verbose("invalidate");
        assert!(verbose.log_before && verbose.log_after);

        // No subscriber installed: tracing is a no-op
        verbose.before(&Ping);
        verbose.after(&Ping, true);

        assert_eq!(LoggingMiddleware::default().scope, "store");
    }

    #[test]
    fn test_noop_middleware() {
        let mut noop = NoopMiddleware;
        Middleware::<Ping>::before(&mut noop, &Ping);
        Middleware::<Ping>::after(&mut noop, &Ping, false);
    }
}
