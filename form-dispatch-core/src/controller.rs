//! Deferred action controller
//!
//! Wraps a user-triggered async operation ("save", "invalidate") so that:
//! - the status is visibly Pending for at least `min_display`, even when the
//!   operation finishes sooner (the operation and a timer are joined)
//! - a trigger while Pending is ignored, never run concurrently
//! - a failure surfaces as an [`ActionError`], and publishes a notification
//!   when the error carries a message
//! - `is_recently_pending` lingers for a short window after settling so
//!   trailing UI (save/discard buttons) does not vanish abruptly
//! - dropping the controller aborts every timer and in-flight operation
//!
//! State transitions are computed by a pure reducer over
//! [`ControllerAction`]s; the controller interprets the resulting
//! [`ControllerEffect`]s with a [`TaskManager`].
//!
//! ```ignore
//! let mut invalidate = DeferredAction::new(notifier, ControllerConfig::invalidate())
//!     .with_executor(move || api.invalidate(database_id));
//!
//! invalidate.trigger();
//! assert!(invalidate.status().is_pending());
//!
//! // In the UI loop; `next_event` is cancel-safe
//! tokio::select! {
//!     Some(event) = invalidate.next_event() => redraw(),
//!     // ...
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::action::Action;
use crate::config::ControllerConfig;
use crate::effect::{DispatchResult, EffectStoreWithMiddleware};
use crate::error::{ActionError, ErrorShape};
use crate::notify::{Notification, Notifier};
use crate::status::ActionStatus;
use crate::middleware::LoggingMiddleware;
use crate::tasks::{TaskKey, TaskManager};

const ACTION_TASK: &str = "action";
const DECAY_TASK: &str = "recently-pending";

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
type Executor = Arc<dyn Fn() -> BoxFuture<Result<(), ActionError>> + Send + Sync>;

/// Everything a button or label needs to render a deferred action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub status: ActionStatus,
    /// True for a short window after Pending ends.
    pub recently_pending: bool,
    /// Message of the last failure, if it had one.
    pub last_error: Option<String>,
    /// Number of operations started.
    pub runs: u64,
    decay_epoch: u64,
}

/// Inputs to the controller reducer.
#[derive(Clone, Debug)]
pub enum ControllerAction {
    Trigger,
    DidResolve,
    DidReject(Arc<ActionError>),
    DirtyEdge,
    Reset,
    RecentlyPendingDidExpire(u64),
}

impl Action for ControllerAction {
    fn name(&self) -> &'static str {
        match self {
            ControllerAction::Trigger => "Trigger",
            ControllerAction::DidResolve => "DidResolve",
            ControllerAction::DidReject(_) => "DidReject",
            ControllerAction::DirtyEdge => "DirtyEdge",
            ControllerAction::Reset => "Reset",
            ControllerAction::RecentlyPendingDidExpire(_) => "RecentlyPendingDidExpire",
        }
    }
}

/// Work requested by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEffect {
    /// Start the operation joined with the minimum display timer.
    Execute,
    /// (Re)start the recently-pending timer for the given epoch.
    ArmDecay(u64),
    Notify(Notification),
}

/// Pure transition function of the controller.
pub fn reducer(
    state: &mut ControllerState,
    action: ControllerAction,
) -> DispatchResult<ControllerEffect> {
    match action {
        ControllerAction::Trigger => {
            if !state.status.accepts_trigger() {
                return DispatchResult::unchanged();
            }
            state.status = ActionStatus::Pending;
            state.recently_pending = false;
            state.last_error = None;
            state.runs += 1;
            DispatchResult::changed_with(ControllerEffect::Execute)
        }

        ControllerAction::DidResolve => {
            if !state.status.is_pending() {
                return DispatchResult::unchanged();
            }
            state.status = ActionStatus::Success;
            DispatchResult::changed_with(arm_decay(state))
        }

        ControllerAction::DidReject(error) => {
            if !state.status.is_pending() {
                return DispatchResult::unchanged();
            }
            state.status = ActionStatus::Failed;
            state.last_error = error.message().map(str::to_owned);

            let result = DispatchResult::changed_with(arm_decay(state));
            match error.message() {
                Some(message) => result.with(ControllerEffect::Notify(Notification::error(message))),
                None => result,
            }
        }

        ControllerAction::DirtyEdge | ControllerAction::Reset => {
            if state.status.reset() {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        ControllerAction::RecentlyPendingDidExpire(epoch) => {
            if epoch != state.decay_epoch || !state.recently_pending {
                return DispatchResult::unchanged();
            }
            state.recently_pending = false;
            DispatchResult::changed()
        }
    }
}

fn arm_decay(state: &mut ControllerState) -> ControllerEffect {
    state.recently_pending = true;
    state.decay_epoch += 1;
    ControllerEffect::ArmDecay(state.decay_epoch)
}

/// What happened when a trigger was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triggered {
    Started,
    /// An operation is already in flight.
    IgnoredWhilePending,
    /// `trigger` was called on a controller built without an executor.
    NoExecutor,
}

impl Triggered {
    pub fn started(self) -> bool {
        matches!(self, Triggered::Started)
    }
}

/// Completion observed by [`DeferredAction::next_event`].
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Succeeded,
    /// The operation failed. This is the caller's copy of the error.
    Failed(Arc<ActionError>),
    RecentlyPendingExpired,
    /// A stale completion that did not change anything.
    Ignored,
}

/// Controller for one async action on one form or button instance.
pub struct DeferredAction {
    store: EffectStoreWithMiddleware<
        ControllerState,
        ControllerAction,
        ControllerEffect,
        LoggingMiddleware,
    >,
    tasks: TaskManager<ControllerAction>,
    action_rx: mpsc::UnboundedReceiver<ControllerAction>,
    executor: Option<Executor>,
    notifier: Arc<dyn Notifier>,
    config: ControllerConfig,
}

impl DeferredAction {
    pub fn new(notifier: impl Notifier + 'static, config: ControllerConfig) -> Self {
        Self::with_scope("deferred-action", notifier, config)
    }

    /// Like [`new`](Self::new), labelling trace output with `scope`.
    pub fn with_scope(
        scope: &'static str,
        notifier: impl Notifier + 'static,
        config: ControllerConfig,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            store: EffectStoreWithMiddleware::new(
                ControllerState::default(),
                reducer,
                LoggingMiddleware::new(scope),
            ),
            tasks: TaskManager::new(action_tx),
            action_rx,
            executor: None,
            notifier: Arc::new(notifier),
            config,
        }
    }

    /// Set the operation run by [`trigger`](Self::trigger).
    pub fn with_executor<F, Fut, E>(mut self, executor: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: ErrorShape,
    {
        self.executor = Some(Arc::new(move || -> BoxFuture<Result<(), ActionError>> {
            let operation = executor();
            Box::pin(async move { operation.await.map_err(ActionError::from_rejection) })
        }));
        self
    }

    pub fn state(&self) -> &ControllerState {
        self.store.state()
    }

    pub fn status(&self) -> ActionStatus {
        self.state().status
    }

    pub fn is_pending(&self) -> bool {
        self.status().is_pending()
    }

    pub fn is_recently_pending(&self) -> bool {
        self.state().recently_pending
    }

    /// Pending, or settled within the recently-pending window.
    pub fn show_busy(&self) -> bool {
        self.is_pending() || self.is_recently_pending()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state().last_error.as_deref()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Run the configured executor.
    pub fn trigger(&mut self) -> Triggered {
        let Some(executor) = self.executor.clone() else {
            tracing::warn!(scope = self.scope(), "Trigger without an executor");
            return Triggered::NoExecutor;
        };
        self.start(move || executor())
    }

    /// Run a one-off operation.
    ///
    /// `operation` is only called if the trigger is accepted, so a form can
    /// snapshot its current value inside it.
    pub fn trigger_with<F, Fut, E>(&mut self, operation: F) -> Triggered
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: ErrorShape,
    {
        self.start(move || -> BoxFuture<Result<(), ActionError>> {
            let operation = operation();
            Box::pin(async move { operation.await.map_err(ActionError::from_rejection) })
        })
    }

    fn start<F>(&mut self, operation: F) -> Triggered
    where
        F: FnOnce() -> BoxFuture<Result<(), ActionError>>,
    {
        let result = self.store.dispatch(ControllerAction::Trigger);
        if !result.changed {
            tracing::debug!(scope = self.scope(), "Trigger ignored while pending");
            return Triggered::IgnoredWhilePending;
        }

        tracing::debug!(
            scope = self.scope(),
            run = self.state().runs,
            min_display_ms = self.config.min_display_ms,
            "Action triggered"
        );

        let mut operation = Some(operation);
        for effect in result.effects {
            match effect {
                ControllerEffect::Execute => {
                    if let Some(operation) = operation.take() {
                        self.spawn_operation(operation());
                    }
                }
                other => self.handle_effect(other),
            }
        }
        Triggered::Started
    }

    fn spawn_operation(&mut self, operation: BoxFuture<Result<(), ActionError>>) {
        let floor = self.config.min_display();
        self.tasks.spawn(ACTION_TASK, async move {
            let (outcome, ()) = tokio::join!(operation, tokio::time::sleep(floor));
            match outcome {
                Ok(()) => ControllerAction::DidResolve,
                Err(error) => ControllerAction::DidReject(Arc::new(error)),
            }
        });
    }

    fn handle_effect(&mut self, effect: ControllerEffect) {
        match effect {
            // Only produced by Trigger, which `start` handles itself
            ControllerEffect::Execute => {}
            ControllerEffect::ArmDecay(epoch) => {
                self.tasks.debounce(DECAY_TASK, self.config.recently_pending(), async move {
                    ControllerAction::RecentlyPendingDidExpire(epoch)
                });
            }
            ControllerEffect::Notify(notification) => {
                if self.config.notify_on_failure {
                    self.notifier.notify(notification);
                }
            }
        }
    }

    /// Consume a dirty edge: a settled status goes back to Idle.
    ///
    /// Returns `true` if the status changed.
    pub fn dirty_edge(&mut self) -> bool {
        self.store.dispatch(ControllerAction::DirtyEdge).changed
    }

    /// Explicitly return a settled status to Idle.
    pub fn reset(&mut self) -> bool {
        self.store.dispatch(ControllerAction::Reset).changed
    }

    /// Whether any operation or timer is still owned by this controller.
    pub fn has_pending_work(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Wait for the next completion and apply it.
    ///
    /// Returns `None` once nothing is in flight. Cancel-safe, so it can sit
    /// in a `tokio::select!` arm.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        if self.tasks.is_empty() {
            return None;
        }
        let action = self.action_rx.recv().await?;
        Some(self.apply(action))
    }

    /// Drive the in-flight operation to completion.
    ///
    /// Returns `None` if nothing was pending. A failure is returned as `Err`
    /// after the status has become Failed.
    pub async fn settle(&mut self) -> Option<Result<(), Arc<ActionError>>> {
        while self.is_pending() {
            match self.next_event().await? {
                ControllerEvent::Succeeded => return Some(Ok(())),
                ControllerEvent::Failed(error) => return Some(Err(error)),
                ControllerEvent::RecentlyPendingExpired | ControllerEvent::Ignored => {}
            }
        }
        None
    }

    /// Tear down: abort every timer and operation.
    ///
    /// Dropping the controller does the same.
    pub fn dispose(mut self) {
        self.tasks.cancel_all();
        tracing::debug!(scope = self.scope(), "Controller disposed");
    }

    fn apply(&mut self, action: ControllerAction) -> ControllerEvent {
        let event = match &action {
            ControllerAction::DidResolve => {
                self.tasks.finish(&TaskKey::new(ACTION_TASK));
                ControllerEvent::Succeeded
            }
            ControllerAction::DidReject(error) => {
                self.tasks.finish(&TaskKey::new(ACTION_TASK));
                ControllerEvent::Failed(error.clone())
            }
            ControllerAction::RecentlyPendingDidExpire(epoch) => {
                if *epoch == self.state().decay_epoch {
                    self.tasks.finish(&TaskKey::new(DECAY_TASK));
                }
                ControllerEvent::RecentlyPendingExpired
            }
            ControllerAction::Trigger | ControllerAction::DirtyEdge | ControllerAction::Reset => {
                ControllerEvent::Ignored
            }
        };

        let result = self.store.dispatch(action);
        if !result.changed {
            return ControllerEvent::Ignored;
        }

        match &event {
            ControllerEvent::Succeeded => {
                tracing::info!(scope = self.scope(), "Action succeeded");
            }
            ControllerEvent::Failed(error) => {
                tracing::warn!(scope = self.scope(), error = %error, "Action failed");
            }
            _ => {}
        }

        for effect in result.effects {
            self.handle_effect(effect);
        }
        event
    }

    fn scope(&self) -> &'static str {
        self.store.middleware().scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::notify::{NoopNotifier, RecordingNotifier};
    use crate::testing::CountingExecutor;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn controller(executor: &CountingExecutor, notifier: RecordingNotifier) -> DeferredAction {
        let executor = executor.clone();
        DeferredAction::new(notifier, ControllerConfig::invalidate())
            .with_executor(move || executor.call())
    }

    #[test]
    fn test_reducer_transitions() {
        let mut state = ControllerState::default();

        let r = reducer(&mut state, ControllerAction::Trigger);
        assert_eq!(r.effects, vec![ControllerEffect::Execute]);
        assert_eq!(state.status, ActionStatus::Pending);

        // Re-entrant trigger is ignored
        let r = reducer(&mut state, ControllerAction::Trigger);
        assert!(!r.changed && !r.has_effects());

        // Dirty edge cannot interrupt Pending
        assert!(!reducer(&mut state, ControllerAction::DirtyEdge).changed);

        let r = reducer(&mut state, ControllerAction::DidResolve);
        assert_eq!(state.status, ActionStatus::Success);
        assert_eq!(r.effects, vec![ControllerEffect::ArmDecay(1)]);
        assert!(state.recently_pending);

        assert!(reducer(&mut state, ControllerAction::DirtyEdge).changed);
        assert_eq!(state.status, ActionStatus::Idle);
    }

    #[test]
    fn test_reducer_reject_notifies_only_with_message() {
        let mut state = ControllerState::default();
        reducer(&mut state, ControllerAction::Trigger);

        let error = ActionError::from_rejection(ApiError::new(
            500,
            json!({ "data": { "message": "Cache is locked" } }),
        ));
        let r = reducer(&mut state, ControllerAction::DidReject(Arc::new(error)));
        assert_eq!(state.status, ActionStatus::Failed);
        assert_eq!(state.last_error.as_deref(), Some("Cache is locked"));
        assert!(r
            .effects
            .contains(&ControllerEffect::Notify(Notification::error("Cache is locked"))));

        reducer(&mut state, ControllerAction::Trigger);
        let error = ActionError::from_rejection(ApiError::new(502, json!(null)));
        let r = reducer(&mut state, ControllerAction::DidReject(Arc::new(error)));
        assert_eq!(state.status, ActionStatus::Failed);
        assert_eq!(state.last_error, None);
        assert_eq!(r.effects, vec![ControllerEffect::ArmDecay(2)]);
    }

    #[test]
    fn test_reducer_ignores_stale_decay() {
        let mut state = ControllerState::default();
        reducer(&mut state, ControllerAction::Trigger);
        reducer(&mut state, ControllerAction::DidResolve);
        reducer(&mut state, ControllerAction::Trigger);
        reducer(&mut state, ControllerAction::DidResolve);
        assert_eq!(state.decay_epoch, 2);

        assert!(!reducer(&mut state, ControllerAction::RecentlyPendingDidExpire(1)).changed);
        assert!(state.recently_pending);
        assert!(reducer(&mut state, ControllerAction::RecentlyPendingDidExpire(2)).changed);
        assert!(!state.recently_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_action_stays_pending_for_min_display() {
        let executor = CountingExecutor::succeeding(Duration::from_millis(10));
        let mut ctrl = controller(&executor, RecordingNotifier::new());

        let start = Instant::now();
        assert!(ctrl.trigger().started());
        assert!(ctrl.is_pending());

        // Well after the operation itself finished, still pending
        let early = tokio::time::timeout(Duration::from_millis(250), ctrl.next_event()).await;
        assert!(early.is_err());
        assert!(ctrl.is_pending());

        assert!(ctrl.settle().await.expect("was pending").is_ok());
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!(ctrl.status(), ActionStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_action_is_not_extended() {
        let executor = CountingExecutor::succeeding(Duration::from_millis(800));
        let mut ctrl = controller(&executor, RecordingNotifier::new());

        let start = Instant::now();
        ctrl.trigger();
        ctrl.settle().await.expect("was pending").expect("succeeds");

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(800));
        assert!(elapsed < Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_while_pending_runs_once() {
        let executor = CountingExecutor::succeeding(Duration::from_millis(50));
        let mut ctrl = controller(&executor, RecordingNotifier::new());

        assert_eq!(ctrl.trigger(), Triggered::Started);
        assert_eq!(ctrl.trigger(), Triggered::IgnoredWhilePending);
        ctrl.settle().await.expect("was pending").expect("succeeds");

        assert_eq!(executor.calls(), 1);
        assert_eq!(ctrl.state().runs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_returned_and_notified() {
        let executor = CountingExecutor::failing(
            Duration::from_millis(10),
            ApiError::new(500, json!({ "data": { "message": "Database is offline" } })),
        );
        let notifier = RecordingNotifier::new();
        let mut ctrl = controller(&executor, notifier.clone());

        ctrl.trigger();
        let error = ctrl.settle().await.expect("was pending").unwrap_err();

        assert_eq!(error.message(), Some("Database is offline"));
        assert_eq!(error.source_as::<ApiError>().map(|e| e.status), Some(500));
        assert_eq!(ctrl.status(), ActionStatus::Failed);
        assert_eq!(ctrl.last_error(), Some("Database is offline"));
        assert_eq!(
            notifier.notifications(),
            vec![Notification::error("Database is offline")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_without_message_is_silent() {
        let executor =
            CountingExecutor::failing(Duration::from_millis(10), ApiError::new(502, json!("")));
        let notifier = RecordingNotifier::new();
        let mut ctrl = controller(&executor, notifier.clone());

        ctrl.trigger();
        let error = ctrl.settle().await.expect("was pending").unwrap_err();

        assert!(matches!(*error, ActionError::MalformedShape { .. }));
        assert_eq!(ctrl.status(), ActionStatus::Failed);
        assert!(notifier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_can_be_disabled() {
        let executor = CountingExecutor::failing(
            Duration::ZERO,
            ApiError::new(500, json!({ "message": "nope" })),
        );
        let notifier = RecordingNotifier::new();
        let config = ControllerConfig {
            notify_on_failure: false,
            ..ControllerConfig::default()
        };
        let exec = executor.clone();
        let mut ctrl =
            DeferredAction::new(notifier.clone(), config).with_executor(move || exec.call());

        ctrl.trigger();
        assert!(ctrl.settle().await.expect("was pending").is_err());
        assert!(notifier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stays_failed_without_edit() {
        let executor = CountingExecutor::failing(
            Duration::from_millis(10),
            ApiError::new(500, json!({ "message": "nope" })),
        );
        let mut ctrl = controller(&executor, RecordingNotifier::new());

        ctrl.trigger();
        let _ = ctrl.settle().await;

        // Let the decay timer and anything else run out
        let _ = tokio::time::timeout(Duration::from_secs(10), async {
            while ctrl.next_event().await.is_some() {}
            std::future::pending::<()>().await
        })
        .await;

        assert_eq!(ctrl.status(), ActionStatus::Failed);
        assert!(ctrl.dirty_edge());
        assert_eq!(ctrl.status(), ActionStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recently_pending_decays() {
        let executor = CountingExecutor::succeeding(Duration::ZERO);
        let mut ctrl = controller(&executor, RecordingNotifier::new());

        ctrl.trigger();
        ctrl.settle().await.expect("was pending").expect("succeeds");
        assert!(ctrl.is_recently_pending());
        assert!(ctrl.show_busy());

        let settled = Instant::now();
        let event = ctrl.next_event().await;
        assert!(matches!(event, Some(ControllerEvent::RecentlyPendingExpired)));
        assert!(settled.elapsed() >= Duration::from_millis(500));
        assert!(!ctrl.show_busy());

        assert!(!ctrl.has_pending_work());
        assert!(ctrl.next_event().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_from_success() {
        let executor = CountingExecutor::succeeding(Duration::ZERO);
        let mut ctrl = controller(&executor, RecordingNotifier::new());

        ctrl.trigger();
        ctrl.settle().await.expect("was pending").expect("succeeds");
        assert_eq!(ctrl.trigger(), Triggered::Started);
        assert!(!ctrl.is_recently_pending());
        ctrl.settle().await.expect("was pending").expect("succeeds");
        assert_eq!(executor.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_while_pending_cancels_everything() {
        let completed = Arc::new(AtomicBool::new(false));
        let notifier = RecordingNotifier::new();
        let mut ctrl = DeferredAction::new(notifier.clone(), ControllerConfig::invalidate());

        let flag = completed.clone();
        ctrl.trigger_with(move || async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            flag.store(true, Ordering::SeqCst);
            Err::<(), _>(ApiError::new(500, json!({ "message": "late" })))
        });
        assert!(ctrl.is_pending());

        ctrl.dispose();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(!completed.load(Ordering::SeqCst));
        assert!(notifier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_without_executor() {
        let mut ctrl = DeferredAction::new(NoopNotifier, ControllerConfig::default());
        assert_eq!(ctrl.trigger(), Triggered::NoExecutor);
        assert_eq!(ctrl.status(), ActionStatus::Idle);
        assert!(ctrl.settle().await.is_none());
    }
}
