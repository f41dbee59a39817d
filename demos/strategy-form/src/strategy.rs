//! Caching strategies and the rules for editing them

use serde::{Deserialize, Serialize};

/// Id of the root target, whose strategy is the default for every database.
pub const ROOT_ID: u64 = 0;

pub const DEFAULT_MIN_DURATION_MS: u64 = 1000;
pub const DEFAULT_MULTIPLIER: u32 = 10;
pub const DEFAULT_DURATION_HOURS: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Hours,
    Minutes,
    Seconds,
    Days,
}

impl DurationUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            DurationUnit::Hours => "hours",
            DurationUnit::Minutes => "minutes",
            DurationUnit::Seconds => "seconds",
            DurationUnit::Days => "days",
        }
    }
}

/// When cached query results are invalidated.
///
/// Serializes in the API's shape: `{ "type": "ttl", "min_duration_ms": 1000, "multiplier": 10 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Strategy {
    /// Use the root target's strategy.
    Inherit,
    Nocache,
    Ttl { min_duration_ms: u64, multiplier: u32 },
    Duration { duration: u32, unit: DurationUnit },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Inherit,
    Nocache,
    Ttl,
    Duration,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Inherit,
        StrategyKind::Nocache,
        StrategyKind::Ttl,
        StrategyKind::Duration,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::Inherit => "Use default",
            StrategyKind::Nocache => "Don't cache results",
            StrategyKind::Ttl => "When the TTL expires",
            StrategyKind::Duration => "After a specific number of hours",
        }
    }

    /// Strategies a target may choose. The root has nothing to inherit from.
    pub fn available(target_id: u64) -> &'static [StrategyKind] {
        static ROOT: [StrategyKind; 3] = [
            StrategyKind::Nocache,
            StrategyKind::Ttl,
            StrategyKind::Duration,
        ];
        if target_id == ROOT_ID {
            &ROOT
        } else {
            &Self::ALL
        }
    }
}

/// A numeric field of the current strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    MinDurationMs,
    Multiplier,
    Duration,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::MinDurationMs => "Minimum query duration (ms)",
            Field::Multiplier => "Cache TTL multiplier",
            Field::Duration => "Cache results for this many hours",
        }
    }

    /// Step applied by one `+` / `-` press.
    pub fn step(self) -> i64 {
        match self {
            Field::MinDurationMs => 100,
            Field::Multiplier | Field::Duration => 1,
        }
    }
}

impl Strategy {
    /// What a target shows before anything was saved for it.
    pub fn default_for(target_id: u64) -> Self {
        if target_id == ROOT_ID {
            Strategy::Nocache
        } else {
            Strategy::Inherit
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Inherit => StrategyKind::Inherit,
            Strategy::Nocache => StrategyKind::Nocache,
            Strategy::Ttl { .. } => StrategyKind::Ttl,
            Strategy::Duration { .. } => StrategyKind::Duration,
        }
    }

    /// A fresh strategy of `kind`. A duration is always counted in hours.
    pub fn of_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Inherit => Strategy::Inherit,
            StrategyKind::Nocache => Strategy::Nocache,
            StrategyKind::Ttl => Strategy::Ttl {
                min_duration_ms: DEFAULT_MIN_DURATION_MS,
                multiplier: DEFAULT_MULTIPLIER,
            },
            StrategyKind::Duration => Strategy::Duration {
                duration: DEFAULT_DURATION_HOURS,
                unit: DurationUnit::Hours,
            },
        }
    }

    /// The next (or previous) strategy kind this target may choose.
    pub fn cycle(&self, target_id: u64, forward: bool) -> Self {
        let available = StrategyKind::available(target_id);
        let len = available.len();
        let next = match available.iter().position(|kind| *kind == self.kind()) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        Self::of_kind(available[next])
    }

    pub fn fields(&self) -> &'static [Field] {
        match self {
            Strategy::Ttl { .. } => &[Field::MinDurationMs, Field::Multiplier],
            Strategy::Duration { .. } => &[Field::Duration],
            Strategy::Inherit | Strategy::Nocache => &[],
        }
    }

    pub fn field_value(&self, field: Field) -> Option<u64> {
        match (self, field) {
            (Strategy::Ttl { min_duration_ms, .. }, Field::MinDurationMs) => Some(*min_duration_ms),
            (Strategy::Ttl { multiplier, .. }, Field::Multiplier) => Some(u64::from(*multiplier)),
            (Strategy::Duration { duration, .. }, Field::Duration) => Some(u64::from(*duration)),
            _ => None,
        }
    }

    /// Nudge a numeric field by `steps`. Values never drop below 1.
    ///
    /// Returns `false` if the field does not belong to this strategy.
    pub fn adjust(&mut self, field: Field, steps: i64) -> bool {
        let delta = steps.saturating_mul(field.step());
        match (self, field) {
            (Strategy::Ttl { min_duration_ms, .. }, Field::MinDurationMs) => {
                *min_duration_ms = nudge(*min_duration_ms, delta);
                true
            }
            (Strategy::Ttl { multiplier, .. }, Field::Multiplier) => {
                *multiplier = nudge(u64::from(*multiplier), delta).min(u64::from(u32::MAX)) as u32;
                true
            }
            (Strategy::Duration { duration, .. }, Field::Duration) => {
                *duration = nudge(u64::from(*duration), delta).min(u64::from(u32::MAX)) as u32;
                true
            }
            _ => false,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Strategy::Inherit => "inherit".into(),
            Strategy::Nocache => "no caching".into(),
            Strategy::Ttl {
                min_duration_ms,
                multiplier,
            } => format!("ttl ×{multiplier} for queries over {min_duration_ms}ms"),
            Strategy::Duration { duration, unit } => format!("{duration} {}", unit.as_str()),
        }
    }
}

fn nudge(value: u64, delta: i64) -> u64 {
    let next = if delta.is_negative() {
        value.saturating_sub(delta.unsigned_abs())
    } else {
        value.saturating_add(delta as u64)
    };
    next.max(1)
}
