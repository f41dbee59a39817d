//! Test utilities for deferred actions and save forms
//!
//! - [`CountingExecutor`]: a scripted async operation that counts its calls
//! - [`run_for`]: drive a controller for a span of (usually paused) time
//! - Assertion macros for checking collected [`ControllerEvent`]s
//!
//! Timing tests should run on a paused clock so they are exact and instant:
//!
//! ```ignore
//! use form_dispatch::testing::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn invalidate_shows_busy() {
//!     let executor = CountingExecutor::succeeding(Duration::from_millis(10));
//!     let exec = executor.clone();
//!     let mut ctrl = DeferredAction::new(RecordingNotifier::new(), ControllerConfig::invalidate())
//!         .with_executor(move || exec.call());
//!
//!     ctrl.trigger();
//!     let events = run_for(&mut ctrl, Duration::from_secs(1)).await;
//!     assert_emitted!(events, ControllerEvent::Succeeded);
//!     assert_eq!(executor.calls(), 1);
//! }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::controller::{ControllerEvent, DeferredAction};
use crate::error::ApiError;

pub use crate::notify::RecordingNotifier;

/// A fake async operation with fixed latency and a scripted outcome.
///
/// Clones share the call counter and the outcome, so a test can keep one
/// handle while the controller owns another.
#[derive(Debug, Clone)]
pub struct CountingExecutor {
    calls: Arc<AtomicUsize>,
    latency: Duration,
    outcome: Arc<Mutex<Result<(), ApiError>>>,
}

impl CountingExecutor {
    pub fn succeeding(latency: Duration) -> Self {
        Self::with_outcome(latency, Ok(()))
    }

    pub fn failing(latency: Duration, error: ApiError) -> Self {
        Self::with_outcome(latency, Err(error))
    }

    fn with_outcome(latency: Duration, outcome: Result<(), ApiError>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            latency,
            outcome: Arc::new(Mutex::new(outcome)),
        }
    }

    /// Change the outcome of later calls.
    pub fn set_outcome(&self, outcome: Result<(), ApiError>) {
        if let Ok(mut current) = self.outcome.lock() {
            *current = outcome;
        }
    }

    /// How many times [`call`](Self::call) ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Start one operation. The call is counted immediately.
    pub fn call(&self) -> impl Future<Output = Result<(), ApiError>> + Send + 'static {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency;
        let outcome = self
            .outcome
            .lock()
            .map(|outcome| outcome.clone())
            .unwrap_or(Ok(()));
        async move {
            tokio::time::sleep(latency).await;
            outcome
        }
    }
}

/// Apply every controller event that happens within `duration`.
///
/// Always waits the full duration, even when the controller runs out of
/// work early, so callers can reason about the clock afterwards.
pub async fn run_for(ctrl: &mut DeferredAction, duration: Duration) -> Vec<ControllerEvent> {
    let deadline = tokio::time::Instant::now() + duration;
    let mut events = Vec::new();
    loop {
        match tokio::time::timeout_at(deadline, ctrl.next_event()).await {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {
                tokio::time::sleep_until(deadline).await;
                break;
            }
            Err(_) => break,
        }
    }
    events
}

/// Advance the paused test clock.
#[cfg(feature = "testing-time")]
pub async fn advance_time(duration: Duration) {
    tokio::time::advance(duration).await;
}

/// Pause the test clock.
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

/// Resume the test clock.
#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Assert that an event matching a pattern was collected.
///
/// ```ignore
/// let events = run_for(&mut ctrl, Duration::from_secs(1)).await;
/// assert_emitted!(events, ControllerEvent::Failed(_));
/// ```
#[macro_export]
macro_rules! assert_emitted {
    ($events:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $events.iter().any(|e| matches!(e, $pattern $(if $guard)?)),
            "Expected event matching `{}`, but got: {:?}",
            stringify!($pattern),
            $events
        );
    };
}

/// Assert that no event matching a pattern was collected.
#[macro_export]
macro_rules! assert_not_emitted {
    ($events:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$events.iter().any(|e| matches!(e, $pattern $(if $guard)?)),
            "Expected no event matching `{}`, but got: {:?}",
            stringify!($pattern),
            $events
        );
    };
}

/// Find the first collected event matching a pattern.
///
/// ```ignore
/// if let Some(ControllerEvent::Failed(error)) = find_emitted!(events, ControllerEvent::Failed(_)) {
///     assert_eq!(error.message(), Some("Cache is locked"));
/// }
/// ```
#[macro_export]
macro_rules! find_emitted {
    ($events:expr, $pattern:pat $(if $guard:expr)?) => {
        $events.iter().find(|e| matches!(e, $pattern $(if $guard)?))
    };
}

/// Count collected events matching a pattern.
#[macro_export]
macro_rules! count_emitted {
    ($events:expr, $pattern:pat $(if $guard:expr)?) => {
        $events.iter().filter(|e| matches!(e, $pattern $(if $guard)?)).count()
    };
}
