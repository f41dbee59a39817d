//! Status of a deferred action

use serde::{Deserialize, Serialize};

/// Visible status of a deferred action.
///
/// ```text
/// Idle ──trigger──▶ Pending ──resolve──▶ Success
///                      │                    │
///                      └──reject──▶ Failed  │
///                                    │      │
///              Idle ◀──dirty edge / reset───┘
/// ```
///
/// Success and Failed may also be re-triggered directly. Only Pending
/// refuses a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Failed,
}

impl ActionStatus {
    pub fn is_pending(self) -> bool {
        matches!(self, ActionStatus::Pending)
    }

    /// Success or Failed.
    pub fn is_settled(self) -> bool {
        matches!(self, ActionStatus::Success | ActionStatus::Failed)
    }

    /// Whether a trigger is accepted from this status.
    pub fn accepts_trigger(self) -> bool {
        !self.is_pending()
    }

    /// Move a settled status back to Idle.
    ///
    /// Returns `true` if the status changed. Idle and Pending are left alone.
    pub fn reset(&mut self) -> bool {
        if self.is_settled() {
            *self = ActionStatus::Idle;
            true
        } else {
            false
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Idle => "idle",
            ActionStatus::Pending => "pending",
            ActionStatus::Success => "success",
            ActionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_only_from_settled() {
        let mut status = ActionStatus::Pending;
        assert!(!status.reset());
        assert_eq!(status, ActionStatus::Pending);

        let mut status = ActionStatus::Failed;
        assert!(status.reset());
        assert_eq!(status, ActionStatus::Idle);

        let mut status = ActionStatus::Idle;
        assert!(!status.reset());
    }

    #[test]
    fn test_accepts_trigger() {
        assert!(ActionStatus::Idle.accepts_trigger());
        assert!(ActionStatus::Success.accepts_trigger());
        assert!(ActionStatus::Failed.accepts_trigger());
        assert!(!ActionStatus::Pending.accepts_trigger());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ActionStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
        let status: ActionStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, ActionStatus::Pending);
        assert_eq!(status.to_string(), "pending");
    }
}
