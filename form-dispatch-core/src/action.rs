//! Action trait for controller-internal state transitions

use std::fmt::Debug;

/// Marker trait for actions reduced by a form-dispatch store
///
/// Actions describe something that happened to a form or button: a user
/// trigger, an operation settling, a timer expiring. They should be:
/// - Clone: Actions may be logged or replayed in tests
/// - Debug: For tracing output
/// - Send + 'static: Task completions are sent across the tokio runtime
pub trait Action: Clone + Debug + Send + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> &'static str;
}
