//! Dirty-state tracking against a committed baseline
//!
//! A [`DirtyTracker`] holds the last value its owner considers saved (the
//! baseline) and the value currently being edited. Every change recomputes
//! the dirty flag through a [`Comparator`] and reports the not-dirty to
//! dirty transition as a one-shot edge, which is what a
//! [`DeferredAction`](crate::DeferredAction) uses to drop a stale
//! "Saved" / "Error" label.
//!
//! ```
//! use form_dispatch_core::DirtyTracker;
//! use serde_json::json;
//!
//! let mut form = DirtyTracker::new(json!({ "type": "inherit" }));
//!
//! let change = form.set_value(json!({ "type": "ttl", "min_duration_ms": 1000 }));
//! assert!(change.dirty && change.became_dirty);
//!
//! // Still dirty, but the edge does not fire twice
//! let change = form.set_value(json!({ "type": "ttl", "min_duration_ms": 2000 }));
//! assert!(change.dirty && !change.became_dirty);
//! ```

use serde_json::Value;

/// Decides whether two values are the same for dirty-tracking purposes.
pub trait Comparator<T> {
    fn same(&self, current: &T, baseline: &T) -> bool;
}

/// Deep structural equality via `PartialEq`.
///
/// No coercion happens: `1` and `1.0` in a `serde_json::Value` differ, and
/// sequence order matters. Wrap [`canonical_numbers`] in [`Normalized`] to
/// compare JSON numbers by value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Structural;

impl<T: PartialEq> Comparator<T> for Structural {
    fn same(&self, current: &T, baseline: &T) -> bool {
        current == baseline
    }
}

/// Order-insensitive sequence comparison, see [`unordered_eq`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Unordered;

impl<T: PartialEq> Comparator<Vec<T>> for Unordered {
    fn same(&self, current: &Vec<T>, baseline: &Vec<T>) -> bool {
        unordered_eq(current, baseline)
    }
}

/// Two sequences are equal if every element of each one appears in the other.
///
/// This is a set-style check, quadratic in the lengths: multiplicity is
/// ignored, so `[a, a, b]` equals `[a, b]`. It is meant for small card lists
/// whose order can shuffle without the cards themselves changing.
pub fn unordered_eq<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.iter().all(|x| b.contains(x)) && b.iter().all(|y| a.contains(y))
}

/// Compare what a projection of each value yields.
///
/// The caller decides which parts matter. A dashboard whose card contents
/// are tracked elsewhere can be reduced to its fields plus the card count:
///
/// ```
/// use form_dispatch_core::{DirtyTracker, Normalized};
///
/// let cards = |d: &(String, Vec<u32>)| (d.0.clone(), d.1.len());
/// let mut dashboard = DirtyTracker::with_comparator(("Sales".to_string(), vec![1, 2]), Normalized(cards));
///
/// assert!(!dashboard.set_value(("Sales".to_string(), vec![3, 4])).dirty);
/// assert!(dashboard.set_value(("Sales".to_string(), vec![3])).dirty);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalized<F>(pub F);

impl<T, K, F> Comparator<T> for Normalized<F>
where
    F: Fn(&T) -> K,
    K: PartialEq,
{
    fn same(&self, current: &T, baseline: &T) -> bool {
        (self.0)(current) == (self.0)(baseline)
    }
}

/// Copy of `value` with every number stored as `f64`, so `10` and `10.0`
/// compare equal. Strings are left alone: `"10"` still differs from `10`.
pub fn canonical_numbers(value: &Value) -> Value {
    match value {
        Value::Number(n) => n.as_f64().map_or_else(|| value.clone(), Value::from),
        Value::Array(items) => Value::Array(items.iter().map(canonical_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), canonical_numbers(v)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::String(_) => value.clone(),
    }
}

/// Whether a card list changed, ignoring order.
pub fn cards_changed<T: PartialEq>(new_cards: &[T], old_cards: &[T]) -> bool {
    !unordered_eq(new_cards, old_cards)
}

/// Outcome of a value change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyChange {
    /// Dirty flag after the change.
    pub dirty: bool,
    /// Not dirty before, dirty now. Fires once per transition.
    pub became_dirty: bool,
    /// Dirty before, clean now.
    pub became_clean: bool,
}

impl DirtyChange {
    fn between(was_dirty: bool, dirty: bool) -> Self {
        Self {
            dirty,
            became_dirty: !was_dirty && dirty,
            became_clean: was_dirty && !dirty,
        }
    }
}

/// Tracks a value against its last committed baseline.
#[derive(Debug, Clone)]
pub struct DirtyTracker<T, C = Structural> {
    baseline: T,
    current: T,
    dirty: bool,
    comparator: C,
}

impl<T: Clone + PartialEq> DirtyTracker<T, Structural> {
    /// Start clean, with `baseline` as both baseline and current value.
    pub fn new(baseline: T) -> Self {
        Self::with_comparator(baseline, Structural)
    }
}

impl<T: Clone + PartialEq> DirtyTracker<Vec<T>, Unordered> {
    /// Like [`new`](DirtyTracker::new), comparing with [`unordered_eq`].
    pub fn unordered(baseline: Vec<T>) -> Self {
        Self::with_comparator(baseline, Unordered)
    }
}

impl<T: Clone, C: Comparator<T>> DirtyTracker<T, C> {
    pub fn with_comparator(baseline: T, comparator: C) -> Self {
        Self {
            current: baseline.clone(),
            baseline,
            dirty: false,
            comparator,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn value(&self) -> &T {
        &self.current
    }

    pub fn baseline(&self) -> &T {
        &self.baseline
    }

    /// Replace the current value and recompute the dirty flag.
    pub fn set_value(&mut self, value: T) -> DirtyChange {
        self.current = value;
        self.recompute()
    }

    /// Edit the current value in place.
    pub fn update(&mut self, edit: impl FnOnce(&mut T)) -> DirtyChange {
        edit(&mut self.current);
        self.recompute()
    }

    /// Adopt the current value as the baseline.
    pub fn commit(&mut self) -> DirtyChange {
        self.baseline = self.current.clone();
        self.recompute()
    }

    /// Adopt `saved` as the baseline without touching the current value.
    ///
    /// Used when a save of an earlier snapshot completes: edits made while
    /// the save was in flight keep the form dirty.
    pub fn commit_value(&mut self, saved: T) -> DirtyChange {
        self.baseline = saved;
        self.recompute()
    }

    /// Throw away edits, restoring the baseline.
    pub fn discard(&mut self) -> DirtyChange {
        self.current = self.baseline.clone();
        self.recompute()
    }

    /// Replace both baseline and current value. The tracker ends clean.
    pub fn rebase(&mut self, baseline: T) -> DirtyChange {
        self.current = baseline.clone();
        self.baseline = baseline;
        self.recompute()
    }

    fn recompute(&mut self) -> DirtyChange {
        let was_dirty = self.dirty;
        self.dirty = !self.comparator.same(&self.current, &self.baseline);
        DirtyChange::between(was_dirty, self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Card {
        id: u32,
        col: u16,
        row: u16,
    }

    fn card(id: u32, col: u16, row: u16) -> Card {
        Card { id, col, row }
    }

    #[test]
    fn test_edge_fires_once() {
        let mut tracker = DirtyTracker::<i32>::new(1);
        assert!(!tracker.is_dirty());

        let change = tracker.set_value(2);
        assert_eq!(
            change,
            DirtyChange {
                dirty: true,
                became_dirty: true,
                became_clean: false
            }
        );

        let change = tracker.set_value(3);
        assert!(change.dirty);
        assert!(!change.became_dirty);

        let change = tracker.set_value(1);
        assert!(!change.dirty);
        assert!(change.became_clean);

        // Dirty again after returning to clean is a fresh edge
        assert!(tracker.set_value(5).became_dirty);
    }

    #[test]
    fn test_json_strategy_scenario() {
        let mut tracker = DirtyTracker::new(json!({ "type": "inherit" }));
        let change = tracker.set_value(json!({ "type": "ttl", "min_duration_ms": 1000 }));
        assert!(change.became_dirty);

        // Key order in objects does not matter
        let mut tracker = DirtyTracker::new(json!({ "type": "ttl", "multiplier": 10 }));
        assert!(!tracker.set_value(json!({ "multiplier": 10, "type": "ttl" })).dirty);

        // No numeric coercion
        assert!(tracker.set_value(json!({ "type": "ttl", "multiplier": 10.0 })).dirty);
        // No string/number coercion
        assert!(tracker.set_value(json!({ "type": "ttl", "multiplier": "10" })).dirty);
    }

    #[test]
    fn test_canonical_numbers() {
        let mut tracker = DirtyTracker::with_comparator(
            json!({ "type": "ttl", "min_duration_ms": 1000, "multiplier": 10 }),
            Normalized(canonical_numbers),
        );
        assert!(!tracker
            .set_value(json!({ "type": "ttl", "min_duration_ms": 1000.0, "multiplier": 10 }))
            .dirty);
        assert!(tracker.set_value(json!({ "type": "ttl", "min_duration_ms": 1000, "multiplier": "10" })).dirty);
        assert!(tracker.set_value(json!({ "type": "ttl", "min_duration_ms": 1000, "multiplier": 11 })).dirty);

        assert_eq!(canonical_numbers(&json!([1, [2.0], null])), json!([1.0, [2.0], null]));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Dashboard {
        name: String,
        ordered_cards: Vec<Card>,
    }

    /// Card contents are saved through their own tracker, so the dashboard
    /// itself only cares how many there are.
    fn dashboard_shape(d: &Dashboard) -> (String, usize) {
        (d.name.clone(), d.ordered_cards.len())
    }

    #[test]
    fn test_normalized_dashboard_ignores_card_contents() {
        let saved = Dashboard {
            name: "Revenue".into(),
            ordered_cards: vec![card(1, 0, 0), card(2, 4, 0)],
        };
        let mut tracker = DirtyTracker::with_comparator(saved.clone(), Normalized(dashboard_shape));

        let change = tracker.update(|d| d.ordered_cards = vec![card(1, 0, 6), card(3, 2, 2)]);
        assert!(!change.dirty);

        let change = tracker.update(|d| d.ordered_cards.push(card(4, 0, 8)));
        assert!(change.became_dirty);

        tracker.discard();
        assert!(tracker.update(|d| d.name = "Revenue by region".into()).dirty);
        assert_eq!(tracker.baseline(), &saved);
    }

    #[test]
    fn test_structural_sequences_are_ordered() {
        let mut tracker = DirtyTracker::new(vec![card(1, 0, 0), card(2, 4, 0)]);
        assert!(tracker.set_value(vec![card(2, 4, 0), card(1, 0, 0)]).dirty);
    }

    #[test]
    fn test_unordered_cards() {
        let a = card(1, 0, 0);
        let b = card(2, 4, 0);

        let mut tracker = DirtyTracker::unordered(vec![a.clone(), b.clone()]);
        assert!(!tracker.set_value(vec![b.clone(), a.clone()]).dirty);

        // Moving a card is a real change
        assert!(tracker.set_value(vec![b.clone(), card(1, 0, 3)]).dirty);

        assert!(!cards_changed(&[a.clone(), b.clone()], &[b.clone(), a.clone()]));
        assert!(cards_changed(&[a.clone()], &[a, b]));
    }

    #[test]
    fn test_unordered_ignores_multiplicity() {
        assert!(unordered_eq(&[1, 1, 2], &[2, 1]));
        assert!(unordered_eq::<i32>(&[], &[]));
        assert!(!unordered_eq(&[1], &[]));
    }

    #[test]
    fn test_commit_discard_rebase() {
        let mut tracker = DirtyTracker::<String>::new("nocache".into());
        tracker.set_value("duration".into());

        let change = tracker.discard();
        assert!(change.became_clean);
        assert_eq!(tracker.value(), "nocache");

        tracker.set_value("ttl".into());
        tracker.commit();
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.baseline(), "ttl");

        tracker.rebase("inherit".into());
        assert_eq!(tracker.value(), "inherit");
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_commit_value_keeps_inflight_edits() {
        let mut tracker = DirtyTracker::<u32>::new(0);
        tracker.set_value(10);
        let snapshot = *tracker.value();
        // User keeps typing while the save is pending
        tracker.update(|v| *v += 5);

        let change = tracker.commit_value(snapshot);
        assert!(change.dirty);
        assert_eq!(*tracker.baseline(), 10);

        tracker.set_value(10);
        assert!(!tracker.is_dirty());
    }

    proptest! {
        #[test]
        fn prop_equal_values_are_clean(v in proptest::collection::vec(any::<i64>(), 0..16)) {
            let mut tracker = DirtyTracker::<Vec<i64>>::new(v.clone());
            prop_assert!(!tracker.set_value(v).dirty);
        }

        #[test]
        fn prop_different_values_are_dirty(
            a in proptest::collection::vec(any::<i64>(), 0..16),
            b in proptest::collection::vec(any::<i64>(), 0..16),
        ) {
            prop_assume!(a != b);
            let mut tracker = DirtyTracker::<Vec<i64>>::new(a);
            prop_assert!(tracker.set_value(b).dirty);
        }

        #[test]
        fn prop_unordered_ignores_permutation(
            v in proptest::collection::vec(any::<u8>(), 0..12)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let (original, shuffled) = v;
            prop_assert!(unordered_eq(&original, &shuffled));
            prop_assert!(!cards_changed(&shuffled, &original));
        }
    }
}
