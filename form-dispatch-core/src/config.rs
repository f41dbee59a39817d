//! Controller timing configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound for `min_display_ms`. Longer than this and the busy
/// indicator is hiding a slow action rather than smoothing a fast one.
pub const MAX_MIN_DISPLAY_MS: u64 = 60_000;

/// Timing and behavior of a [`DeferredAction`](crate::DeferredAction).
///
/// Every field is optional in JSON:
///
/// ```
/// use form_dispatch_core::ControllerConfig;
///
/// let config = ControllerConfig::from_json(r#"{ "min_display_ms": 150 }"#).unwrap();
/// assert_eq!(config.min_display().as_millis(), 150);
/// assert_eq!(config.recently_pending().as_millis(), 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Minimum time the status stays Pending, even if the action is faster.
    pub min_display_ms: u64,
    /// How long `is_recently_pending` stays true after Pending ends.
    pub recently_pending_ms: u64,
    /// Publish a notification when a failed action carries a message.
    pub notify_on_failure: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_display_ms: 300,
            recently_pending_ms: 500,
            notify_on_failure: true,
        }
    }
}

impl ControllerConfig {
    /// Settings for an "invalidate now" style button.
    pub fn invalidate() -> Self {
        Self::default()
    }

    /// Settings for a form save button: no busy floor, but the buttons
    /// linger for a moment after saving.
    pub fn save() -> Self {
        Self {
            min_display_ms: 0,
            ..Self::default()
        }
    }

    /// Clamped to [`MAX_MIN_DISPLAY_MS`], so the result always validates.
    pub fn with_min_display(mut self, duration: Duration) -> Self {
        self.min_display_ms = millis(duration).min(MAX_MIN_DISPLAY_MS);
        self
    }

    pub fn with_recently_pending(mut self, duration: Duration) -> Self {
        self.recently_pending_ms = millis(duration);
        self
    }

    pub fn min_display(&self) -> Duration {
        Duration::from_millis(self.min_display_ms)
    }

    pub fn recently_pending(&self) -> Duration {
        Duration::from_millis(self.recently_pending_ms)
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_display_ms > MAX_MIN_DISPLAY_MS {
            return Err(ConfigError::Invalid(format!(
                "min_display_ms must be at most {MAX_MIN_DISPLAY_MS}, got {}",
                self.min_display_ms
            )));
        }
        Ok(())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
