//! Actions the strategy editor reacts to
//!
//! Keyboard input is mapped to these in `input`; `App::handle` applies them.

/// User intents
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    // ===== Targets =====
    TargetNext,
    TargetPrev,

    // ===== Form =====
    StrategyNext,
    StrategyPrev,
    FieldNext,
    /// Nudge the focused field by this many steps
    FieldAdjust(i64),
    Save,
    Discard,

    // ===== Cache =====
    Invalidate,

    // ===== Global =====
    DismissToast,
    Quit,
}

impl form_dispatch::Action for Action {
    fn name(&self) -> &'static str {
        match self {
            Action::TargetNext => "TargetNext",
            Action::TargetPrev => "TargetPrev",
            Action::StrategyNext => "StrategyNext",
            Action::StrategyPrev => "StrategyPrev",
            Action::FieldNext => "FieldNext",
            Action::FieldAdjust(_) => "FieldAdjust",
            Action::Save => "Save",
            Action::Discard => "Discard",
            Action::Invalidate => "Invalidate",
            Action::DismissToast => "DismissToast",
            Action::Quit => "Quit",
        }
    }
}
