//! Application state and action handling

use std::collections::VecDeque;

use form_dispatch::{ChannelNotifier, ControllerEvent, DeferredAction, Notification, SaveForm, Submit};

use crate::action::Action;
use crate::backend::SimBackend;
use crate::config::AppConfig;
use crate::strategy::{Field, Strategy, ROOT_ID};

const MAX_TOASTS: usize = 3;

/// A target whose caching strategy can be edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: u64,
    pub name: String,
}

impl Target {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn is_database(&self) -> bool {
        self.id != ROOT_ID
    }
}

pub fn default_targets() -> Vec<Target> {
    vec![
        Target::new(ROOT_ID, "Default policy"),
        Target::new(1, "Sample Database"),
        Target::new(2, "Orders"),
        Target::new(3, "Analytics warehouse"),
    ]
}

/// A completion from one of the app's controllers
#[derive(Debug, Clone)]
pub enum AppEvent {
    Save(ControllerEvent),
    Invalidate(ControllerEvent),
}

pub struct App {
    targets: Vec<Target>,
    selected: usize,
    focused_field: usize,
    form: SaveForm<Strategy>,
    invalidate: Option<DeferredAction>,
    backend: SimBackend,
    notifier: ChannelNotifier,
    config: AppConfig,
    toasts: VecDeque<Notification>,
    hint: Option<&'static str>,
    last_failure: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        targets: Vec<Target>,
        backend: SimBackend,
        notifier: ChannelNotifier,
        config: AppConfig,
    ) -> Self {
        let first = targets.first().map(|t| t.id).unwrap_or(ROOT_ID);
        let baseline = saved_or_default(&backend, first);
        let form = SaveForm::new(first.to_string(), baseline, notifier.clone(), config.save.clone());
        let invalidate = invalidate_for(first, &backend, &notifier, &config);

        Self {
            targets,
            selected: 0,
            focused_field: 0,
            form,
            invalidate,
            backend,
            notifier,
            config,
            toasts: VecDeque::new(),
            hint: None,
            last_failure: None,
            should_quit: false,
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn target_id(&self) -> u64 {
        self.targets.get(self.selected).map(|t| t.id).unwrap_or(ROOT_ID)
    }

    pub fn target(&self) -> Option<&Target> {
        self.targets.get(self.selected)
    }

    pub fn form(&self) -> &SaveForm<Strategy> {
        &self.form
    }

    pub fn invalidate(&self) -> Option<&DeferredAction> {
        self.invalidate.as_ref()
    }

    pub fn focused_field(&self) -> Option<Field> {
        self.form.value().fields().get(self.focused_field).copied()
    }

    pub fn toasts(&self) -> impl Iterator<Item = &Notification> {
        self.toasts.iter()
    }

    pub fn hint(&self) -> Option<&'static str> {
        self.hint
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Apply a user action. Returns `true` if anything visible changed.
    pub fn handle(&mut self, action: Action) -> bool {
        tracing::trace!(action = form_dispatch::Action::name(&action), "Handle action");
        self.hint = None;

        match action {
            Action::TargetNext => self.move_selection(1),
            Action::TargetPrev => self.move_selection(-1),

            Action::StrategyNext | Action::StrategyPrev => {
                let next = self
                    .form
                    .value()
                    .cycle(self.target_id(), action == Action::StrategyNext);
                self.form.set_value(next);
                self.focused_field = 0;
                true
            }

            Action::FieldNext => {
                let count = self.form.value().fields().len();
                if count == 0 {
                    return false;
                }
                self.focused_field = (self.focused_field + 1) % count;
                true
            }

            Action::FieldAdjust(steps) => {
                let Some(field) = self.focused_field() else {
                    return false;
                };
                self.form.update(|strategy| {
                    strategy.adjust(field, steps);
                });
                true
            }

            Action::Save => {
                let backend = self.backend.clone();
                let target_id = self.target_id();
                match self
                    .form
                    .submit(move |strategy| backend.update_strategy(target_id, strategy))
                {
                    Submit::Started => {
                        self.last_failure = None;
                        true
                    }
                    Submit::NotDirty | Submit::IgnoredWhilePending => false,
                }
            }

            Action::Discard => self.form.discard(),

            Action::Invalidate => match self.invalidate.as_mut() {
                Some(invalidate) => invalidate.trigger().started(),
                None => false,
            },

            Action::DismissToast => self.toasts.pop_front().is_some(),

            Action::Quit => {
                self.should_quit = true;
                true
            }
        }
    }

    fn move_selection(&mut self, delta: isize) -> bool {
        if self.form.is_dirty() {
            self.hint = Some("Save or discard your changes first");
            return true;
        }
        let last = self.targets.len().saturating_sub(1);
        let next = self.selected.saturating_add_signed(delta).min(last);
        if next == self.selected {
            return false;
        }
        self.select(next);
        true
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.focused_field = 0;
        let id = self.target_id();
        let baseline = saved_or_default(&self.backend, id);
        self.form.rekey(id.to_string(), baseline);
        // Replacing the controller aborts an in-flight invalidation
        self.invalidate = invalidate_for(id, &self.backend, &self.notifier, &self.config);
        tracing::debug!(target_id = id, "Selected target");
    }

    pub fn push_toast(&mut self, notification: Notification) {
        if self.toasts.len() == MAX_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.push_back(notification);
    }

    /// Wait for the next completion from the save form or the invalidate
    /// button. Cancel-safe; `None` when neither has work in flight.
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        tokio::select! {
            Some(event) = self.form.next_event() => Some(AppEvent::Save(event)),
            Some(event) = next_invalidate_event(&mut self.invalidate) => Some(AppEvent::Invalidate(event)),
            else => None,
        }
    }

    /// React to a completion. Failures land here as the caller's copy of
    /// the error.
    pub fn on_event(&mut self, event: AppEvent) {
        let (what, event) = match event {
            AppEvent::Save(event) => ("save", event),
            AppEvent::Invalidate(event) => ("invalidate", event),
        };
        if let ControllerEvent::Failed(error) = event {
            tracing::error!(action = what, error = %error, "Action failed");
            self.last_failure = Some(format!("{what} failed: {error}"));
        }
    }
}

async fn next_invalidate_event(invalidate: &mut Option<DeferredAction>) -> Option<ControllerEvent> {
    match invalidate {
        Some(invalidate) => invalidate.next_event().await,
        None => None,
    }
}

fn saved_or_default(backend: &SimBackend, target_id: u64) -> Strategy {
    backend
        .saved_strategy(target_id)
        .unwrap_or_else(|| Strategy::default_for(target_id))
}

fn invalidate_for(
    target_id: u64,
    backend: &SimBackend,
    notifier: &ChannelNotifier,
    config: &AppConfig,
) -> Option<DeferredAction> {
    if target_id == ROOT_ID {
        return None;
    }
    let backend = backend.clone();
    Some(
        DeferredAction::with_scope("invalidate", notifier.clone(), config.invalidate.clone())
            .with_executor(move || backend.invalidate(target_id)),
    )
}
