//! Core types for form-dispatch
//!
//! This crate provides the building blocks for forms and buttons that run
//! a user-triggered async action ("save", "invalidate") with predictable
//! feedback.
//!
//! # Core Concepts
//!
//! - **DirtyTracker**: Compares an edited value against its saved baseline
//!   and reports the first edit as a one-shot edge
//! - **DeferredAction**: Runs an async operation with a minimum busy time,
//!   ignores re-triggers while pending, and reports failures
//! - **SaveForm**: A dirty tracker and a deferred save working together
//! - **StatusButton**: A ratatui widget that labels the action's status
//!
//! # Basic Example
//!
//! ```ignore
//! use form_dispatch_core::prelude::*;
//!
//! let mut form = SaveForm::new(
//!     "1",
//!     json!({ "type": "inherit" }),
//!     notifier,
//!     ControllerConfig::save(),
//! );
//!
//! form.set_value(json!({ "type": "nocache" }));
//! form.submit(|strategy| api.update_strategy(1, strategy));
//!
//! match form.settle().await {
//!     Some(Ok(())) => assert!(!form.is_dirty()),
//!     Some(Err(error)) => report(error),
//!     None => {}
//! }
//! ```
//!
//! # Event Loop Pattern
//!
//! Controllers never spawn work the caller cannot see. Completions queue up
//! inside the controller and are applied when the caller polls
//! `next_event`, which fits a `tokio::select!` next to terminal input:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = form.next_event() => {
//!             if let ControllerEvent::Failed(error) = event {
//!                 tracing::warn!(%error, "save failed");
//!             }
//!         }
//!         Some(key) = key_rx.recv() => handle_key(&mut form, key),
//!     }
//!     terminal.draw(|frame| render(frame, &form))?;
//! }
//! ```

pub mod action;
pub mod button;
pub mod config;
pub mod controller;
pub mod dirty;
pub mod effect;
pub mod error;
pub mod form;
pub mod middleware;
pub mod notify;
pub mod status;
pub mod tasks;
pub mod testing;

// Core trait exports
pub use action::Action;

// Middleware exports
pub use middleware::{LoggingMiddleware, Middleware, NoopMiddleware};

// Effect exports
pub use effect::{DispatchResult, EffectReducer, EffectStore, EffectStoreWithMiddleware};

// Task exports
pub use tasks::{TaskKey, TaskManager};

// Deferred action exports
pub use button::{StatusButton, StatusLabels, StatusStyles, FAILED_LABEL};
pub use config::{ControllerConfig, MAX_MIN_DISPLAY_MS};
pub use controller::{
    ControllerAction, ControllerEffect, ControllerEvent, ControllerState, DeferredAction,
    Triggered,
};
pub use dirty::{
    canonical_numbers, cards_changed, unordered_eq, Comparator, DirtyChange, DirtyTracker,
    Normalized, Structural, Unordered,
};
pub use error::{extract_message, ActionError, ApiError, BoxError, ConfigError, ErrorShape};
pub use form::{FormButtons, SaveForm, Submit};
pub use notify::{ChannelNotifier, NoopNotifier, Notification, Notifier, RecordingNotifier};
pub use status::ActionStatus;

// Re-export ratatui so apps render with the same version
pub use ratatui;

// Testing exports
pub use testing::{run_for, CountingExecutor};

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::button::{StatusButton, StatusLabels};
    pub use crate::config::ControllerConfig;
    pub use crate::controller::{ControllerEvent, DeferredAction, Triggered};
    pub use crate::dirty::{
        Comparator, DirtyChange, DirtyTracker, Normalized, Structural, Unordered,
    };
    pub use crate::effect::{
        DispatchResult, EffectReducer, EffectStore, EffectStoreWithMiddleware,
    };
    pub use crate::error::{ActionError, ApiError, ErrorShape};
    pub use crate::form::{FormButtons, SaveForm, Submit};
    pub use crate::middleware::{LoggingMiddleware, Middleware};
    pub use crate::notify::{ChannelNotifier, Notification, Notifier};
    pub use crate::status::ActionStatus;
    pub use crate::tasks::{TaskKey, TaskManager};
}
