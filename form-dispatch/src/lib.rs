//! form-dispatch: Dirty tracking and flicker-free deferred actions
//!
//! Edit a value, see whether it differs from what was saved, and run the
//! save (or any other one-shot action) with a status that never flickers.
//!
//! # Example
//! ```ignore
//! use form_dispatch::prelude::*;
//!
//! let mut invalidate = DeferredAction::new(notifier, ControllerConfig::invalidate())
//!     .with_executor(move || api.invalidate_cache(database_id));
//! let labels = StatusLabels::invalidate();
//!
//! invalidate.trigger();
//! frame.render_widget(StatusButton::new(&labels, invalidate.status()), area);
//! ```

// Re-export everything from core
pub use form_dispatch_core::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use form_dispatch_core::prelude::*;

    // Ratatui re-exports used when rendering status buttons
    pub use form_dispatch_core::ratatui::{
        layout::Rect,
        style::{Color, Modifier, Style},
        text::{Line, Span},
        Frame,
    };
}
