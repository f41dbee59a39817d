//! Effect-aware reducers
//!
//! A reducer here returns both whether state changed and a list of
//! declarative effects. The reducer stays pure; whoever owns the store
//! (the [`DeferredAction`](crate::DeferredAction) controller, for one)
//! interprets the effects by spawning tasks or publishing notifications.
//!
//! ```ignore
//! fn reducer(state: &mut SaveState, action: SaveAction) -> DispatchResult<SaveEffect> {
//!     match action {
//!         SaveAction::Trigger if state.status.is_pending() => DispatchResult::unchanged(),
//!         SaveAction::Trigger => {
//!             state.status = ActionStatus::Pending;
//!             DispatchResult::changed_with(SaveEffect::Execute)
//!         }
//!         // ...
//!     }
//! }
//! ```

use std::marker::PhantomData;

use crate::action::Action;
use crate::middleware::Middleware;

/// Result of dispatching an action to an effect-aware store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult<E> {
    /// Whether the state was modified by this action.
    pub changed: bool,
    /// Effects to be processed after dispatch.
    pub effects: Vec<E>,
}

impl<E> Default for DispatchResult<E> {
    fn default() -> Self {
        Self::unchanged()
    }
}

impl<E> DispatchResult<E> {
    /// No state change and no effects.
    #[inline]
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            effects: vec![],
        }
    }

    /// State changed, no effects.
    #[inline]
    pub fn changed() -> Self {
        Self {
            changed: true,
            effects: vec![],
        }
    }

    /// A single effect without a state change.
    #[inline]
    pub fn effect(effect: E) -> Self {
        Self {
            changed: false,
            effects: vec![effect],
        }
    }

    /// State changed with a single effect.
    #[inline]
    pub fn changed_with(effect: E) -> Self {
        Self {
            changed: true,
            effects: vec![effect],
        }
    }

    /// State changed with multiple effects.
    #[inline]
    pub fn changed_with_many(effects: Vec<E>) -> Self {
        Self {
            changed: true,
            effects,
        }
    }

    /// Add an effect to this result.
    #[inline]
    pub fn with(mut self, effect: E) -> Self {
        self.effects.push(effect);
        self
    }

    /// Returns true if there are any effects to process.
    #[inline]
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }
}

/// A reducer function that can emit effects.
pub type EffectReducer<S, A, E> = fn(&mut S, A) -> DispatchResult<E>;

/// A store whose reducer returns [`DispatchResult<E>`].
pub struct EffectStore<S, A, E> {
    state: S,
    reducer: EffectReducer<S, A, E>,
    _marker: PhantomData<(A, E)>,
}

impl<S, A, E> EffectStore<S, A, E>
where
    A: Action,
{
    /// Create a new effect store with the given initial state and reducer.
    pub fn new(state: S, reducer: EffectReducer<S, A, E>) -> Self {
        Self {
            state,
            reducer,
            _marker: PhantomData,
        }
    }

    /// Get a reference to the current state.
    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Dispatch an action to the store.
    #[inline]
    pub fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        (self.reducer)(&mut self.state, action)
    }
}

/// An effect store with middleware support.
///
/// The middleware sees each action and the state change indicator,
/// but not the effects.
pub struct EffectStoreWithMiddleware<S, A, E, M>
where
    A: Action,
    M: Middleware<A>,
{
    store: EffectStore<S, A, E>,
    middleware: M,
}

impl<S, A, E, M> EffectStoreWithMiddleware<S, A, E, M>
where
    A: Action,
    M: Middleware<A>,
{
    /// Create a new effect store with middleware.
    pub fn new(state: S, reducer: EffectReducer<S, A, E>, middleware: M) -> Self {
        Self {
            store: EffectStore::new(state, reducer),
            middleware,
        }
    }

    /// Get a reference to the current state.
    #[inline]
    pub fn state(&self) -> &S {
        self.store.state()
    }

    /// Get a reference to the middleware.
    #[inline]
    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    /// Dispatch an action through middleware and store.
    pub fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        self.middleware.before(&action);
        let result = self.store.dispatch(action.clone());
        self.middleware.after(&action, result.changed);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    enum UploadAction {
        Start,
        Progress(u8),
        Cancel,
    }

    impl Action for UploadAction {
        fn name(&self) -> &'static str {
            match self {
                UploadAction::Start => "Start",
                UploadAction::Progress(_) => "Progress",
                UploadAction::Cancel => "Cancel",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum UploadEffect {
        Spawn,
        Abort,
        Announce(String),
    }

    #[derive(Default)]
    struct UploadState {
        running: bool,
        percent: u8,
    }

    fn upload_reducer(state: &mut UploadState, action: UploadAction) -> DispatchResult<UploadEffect> {
        match action {
            UploadAction::Start if state.running => DispatchResult::unchanged(),
            UploadAction::Start => {
                state.running = true;
                state.percent = 0;
                DispatchResult::changed_with(UploadEffect::Spawn)
            }
            UploadAction::Progress(p) if p >= 100 => {
                state.running = false;
                state.percent = 100;
                DispatchResult::changed_with(UploadEffect::Announce("done".into()))
            }
            UploadAction::Progress(p) => {
                state.percent = p;
                DispatchResult::changed()
            }
            UploadAction::Cancel if state.running => {
                state.running = false;
                DispatchResult::changed_with_many(vec![
                    UploadEffect::Abort,
                    UploadEffect::Announce("cancelled".into()),
                ])
            }
            UploadAction::Cancel => DispatchResult::unchanged(),
        }
    }

    #[test]
    fn test_dispatch_result_builders() {
        let r: DispatchResult<UploadEffect> = DispatchResult::unchanged();
        assert!(!r.changed);
        assert!(!r.has_effects());

        let r = DispatchResult::effect(UploadEffect::Abort);
        assert!(!r.changed);
        assert_eq!(r.effects, vec![UploadEffect::Abort]);

        let r = DispatchResult::<UploadEffect>::changed().with(UploadEffect::Spawn);
        assert!(r.changed);
        assert_eq!(r.effects, vec![UploadEffect::Spawn]);
    }

    #[test]
    fn test_effect_store_guards_reentry() {
        let mut store = EffectStore::new(UploadState::default(), upload_reducer);

        let result = store.dispatch(UploadAction::Start);
        assert!(result.changed);
        assert_eq!(result.effects, vec![UploadEffect::Spawn]);

        // Second start while running is a no-op with no effect
        let result = store.dispatch(UploadAction::Start);
        assert!(!result.changed);
        assert!(!result.has_effects());
    }

    #[test]
    fn test_effect_store_multiple_effects() {
        let mut store = EffectStore::new(UploadState::default(), upload_reducer);
        store.dispatch(UploadAction::Start);
        store.dispatch(UploadAction::Progress(40));
        assert_eq!(store.state().percent, 40);

        let result = store.dispatch(UploadAction::Cancel);
        assert_eq!(result.effects.len(), 2);
        assert!(!store.state().running);
    }

    #[test]
    fn test_effect_store_with_middleware_counts() {
        #[derive(Default)]
        struct Seen(Vec<&'static str>);

        impl Middleware<UploadAction> for Seen {
            fn before(&mut self, action: &UploadAction) {
                self.0.push(action.name());
            }
            fn after(&mut self, _action: &UploadAction, _changed: bool) {}
        }

        let mut store =
            EffectStoreWithMiddleware::new(UploadState::default(), upload_reducer, Seen::default());
        store.dispatch(UploadAction::Start);
        let result = store.dispatch(UploadAction::Progress(100));

        assert_eq!(result.effects, vec![UploadEffect::Announce("done".into())]);
        assert_eq!(store.middleware().0, vec!["Start", "Progress"]);
        assert_eq!(store.state().percent, 100);
    }
}
