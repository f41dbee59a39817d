//! Error types for deferred actions
//!
//! An executor may fail with any error type implementing [`ErrorShape`].
//! The controller probes it for a user-facing message and wraps it in an
//! [`ActionError`]: `Rejected` when a message was found, `MalformedShape`
//! otherwise. Either way the action ends in `Failed` and the error is handed
//! back to the caller.

use serde_json::Value;

/// Boxed source error carried by [`ActionError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Probe for a human-readable message on an executor error.
///
/// The default reports no message, so any error type can opt in with an
/// empty impl and be treated as message-less.
pub trait ErrorShape: std::error::Error + Send + Sync + 'static {
    fn user_message(&self) -> Option<String> {
        None
    }
}

/// Extract a message from an API error body.
///
/// Looks at `data.message` first, then a top-level `message`. Only non-empty
/// strings count.
///
/// ```
/// use form_dispatch_core::extract_message;
/// use serde_json::json;
///
/// let body = json!({ "data": { "message": "Database is offline" } });
/// assert_eq!(extract_message(&body).as_deref(), Some("Database is offline"));
///
/// assert_eq!(extract_message(&json!({ "data": { "message": 42 } })), None);
/// assert_eq!(extract_message(&json!("boom")), None);
/// ```
pub fn extract_message(body: &Value) -> Option<String> {
    body.pointer("/data/message")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(str::to_owned)
}

/// Error returned by an HTTP-style API call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("request failed with status {status}")]
pub struct ApiError {
    pub status: u16,
    pub body: Value,
}

impl ApiError {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

impl ErrorShape for ApiError {
    fn user_message(&self) -> Option<String> {
        extract_message(&self.body)
    }
}

/// A deferred action failed.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The executor rejected with an extractable message.
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: BoxError,
    },

    /// The executor rejected, but the error carried no usable message.
    #[error("action failed: {source}")]
    MalformedShape {
        #[source]
        source: BoxError,
    },
}

impl ActionError {
    /// Classify an executor error by probing it for a message.
    pub fn from_rejection<E: ErrorShape>(error: E) -> Self {
        match error.user_message() {
            Some(message) => ActionError::Rejected {
                message,
                source: Box::new(error),
            },
            None => ActionError::MalformedShape {
                source: Box::new(error),
            },
        }
    }

    /// The user-facing message, if one was extracted.
    pub fn message(&self) -> Option<&str> {
        match self {
            ActionError::Rejected { message, .. } => Some(message),
            ActionError::MalformedShape { .. } => None,
        }
    }

    /// Downcast the original executor error.
    pub fn source_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        let source = match self {
            ActionError::Rejected { source, .. } | ActionError::MalformedShape { source } => source,
        };
        source.downcast_ref::<E>()
    }
}

/// Invalid controller configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
