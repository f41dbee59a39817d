//! Save form: a dirty tracker paired with a deferred save action
//!
//! The form owns the value being edited and the baseline it was loaded
//! with. Submitting snapshots the value and hands it to a save operation;
//! when that save succeeds the snapshot becomes the new baseline.
//!
//! The first edit after a save (the dirty edge) drops a stale "Saved" or
//! "Error" status back to Idle. Re-keying the form to another entity tears
//! the whole controller down.

use std::future::Future;
use std::sync::Arc;

use crate::config::ControllerConfig;
use crate::controller::{ControllerEvent, DeferredAction, Triggered};
use crate::dirty::{Comparator, DirtyChange, DirtyTracker, Structural};
use crate::error::{ActionError, ErrorShape};
use crate::notify::Notifier;
use crate::status::ActionStatus;

/// Outcome of [`SaveForm::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    Started,
    /// Nothing to save.
    NotDirty,
    IgnoredWhilePending,
}

/// Which form controls to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormButtons {
    pub visible: bool,
    pub discard_enabled: bool,
    pub submit_enabled: bool,
    pub status: ActionStatus,
}

/// An editable value with save / discard semantics.
pub struct SaveForm<T, C = Structural> {
    key: String,
    tracker: DirtyTracker<T, C>,
    save: DeferredAction,
    in_flight: Option<T>,
    notifier: Arc<dyn Notifier>,
    config: ControllerConfig,
}

impl<T: Clone + PartialEq> SaveForm<T, Structural> {
    pub fn new(
        key: impl Into<String>,
        baseline: T,
        notifier: impl Notifier + 'static,
        config: ControllerConfig,
    ) -> Self {
        Self::with_comparator(key, baseline, Structural, notifier, config)
    }
}

impl<T: Clone, C: Comparator<T>> SaveForm<T, C> {
    pub fn with_comparator(
        key: impl Into<String>,
        baseline: T,
        comparator: C,
        notifier: impl Notifier + 'static,
        config: ControllerConfig,
    ) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(notifier);
        Self {
            key: key.into(),
            tracker: DirtyTracker::with_comparator(baseline, comparator),
            save: DeferredAction::with_scope("save-form", notifier.clone(), config.clone()),
            in_flight: None,
            notifier,
            config,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &T {
        self.tracker.value()
    }

    pub fn baseline(&self) -> &T {
        self.tracker.baseline()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    pub fn status(&self) -> ActionStatus {
        self.save.status()
    }

    pub fn is_pending(&self) -> bool {
        self.save.is_pending()
    }

    pub fn is_recently_pending(&self) -> bool {
        self.save.is_recently_pending()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.save.last_error()
    }

    pub fn controller(&self) -> &DeferredAction {
        &self.save
    }

    pub fn buttons(&self) -> FormButtons {
        let dirty = self.is_dirty();
        let pending = self.is_pending();
        FormButtons {
            visible: dirty || pending || self.is_recently_pending(),
            discard_enabled: dirty && !pending,
            submit_enabled: dirty && !pending,
            status: self.status(),
        }
    }

    /// Replace the edited value.
    pub fn set_value(&mut self, value: T) -> DirtyChange {
        let change = self.tracker.set_value(value);
        self.on_change(change)
    }

    /// Edit the value in place.
    pub fn update(&mut self, edit: impl FnOnce(&mut T)) -> DirtyChange {
        let change = self.tracker.update(edit);
        self.on_change(change)
    }

    fn on_change(&mut self, change: DirtyChange) -> DirtyChange {
        if change.became_dirty && self.save.dirty_edge() {
            tracing::debug!(form = %self.key, "Edited after settling, status reset");
        }
        change
    }

    /// Save a snapshot of the current value.
    ///
    /// `save` is only called when the form is dirty and not already saving.
    pub fn submit<F, Fut, E>(&mut self, save: F) -> Submit
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: ErrorShape,
    {
        if self.is_pending() {
            return Submit::IgnoredWhilePending;
        }
        if !self.is_dirty() {
            return Submit::NotDirty;
        }

        let snapshot = self.tracker.value().clone();
        let saved = snapshot.clone();
        match self.save.trigger_with(move || save(snapshot)) {
            Triggered::Started => {
                tracing::debug!(form = %self.key, "Submitted");
                self.in_flight = Some(saved);
                Submit::Started
            }
            Triggered::IgnoredWhilePending | Triggered::NoExecutor => Submit::IgnoredWhilePending,
        }
    }

    /// Restore the baseline. Refused while saving or when clean.
    pub fn discard(&mut self) -> bool {
        if !self.is_dirty() || self.is_pending() {
            return false;
        }
        self.tracker.discard();
        true
    }

    /// Point the form at another entity.
    ///
    /// A different key cancels any in-flight save and timer, and starts over
    /// clean from `baseline` with status Idle. The same key is a no-op.
    pub fn rekey(&mut self, key: impl Into<String>, baseline: T) -> bool {
        let key = key.into();
        if key == self.key {
            return false;
        }

        tracing::debug!(from = %self.key, to = %key, "Form rekeyed");
        let fresh = DeferredAction::with_scope("save-form", self.notifier.clone(), self.config.clone());
        std::mem::replace(&mut self.save, fresh).dispose();
        self.tracker.rebase(baseline);
        self.in_flight = None;
        self.key = key;
        true
    }

    /// Wait for the next save completion or timer and apply it.
    ///
    /// Cancel-safe. Returns `None` once nothing is in flight.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        let event = self.save.next_event().await?;
        match &event {
            ControllerEvent::Succeeded => {
                // Edits made while saving may differ from the new baseline
                if let Some(saved) = self.in_flight.take() {
                    let change = self.tracker.commit_value(saved);
                    self.on_change(change);
                }
            }
            ControllerEvent::Failed(_) => self.in_flight = None,
            ControllerEvent::RecentlyPendingExpired | ControllerEvent::Ignored => {}
        }
        Some(event)
    }

    /// Drive the in-flight save to completion. `None` if nothing was saving.
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
}
