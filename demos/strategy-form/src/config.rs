//! Demo configuration: one controller config per button

use std::path::Path;

use form_dispatch::{ConfigError, ControllerConfig};
use serde::{Deserialize, Serialize};

/// Loaded from `--config <file>`:
///
/// ```json
/// { "save": { "recently_pending_ms": 800 }, "invalidate": { "min_display_ms": 500 } }
/// ```
///
/// A missing section keeps its preset. Missing fields inside a section take
/// the general controller defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub save: ControllerConfig,
    pub invalidate: ControllerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save: ControllerConfig::save(),
            invalidate: ControllerConfig::invalidate(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.save.validate()?;
        config.invalidate.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_are_optional() {
        let config = AppConfig::from_json(r#"{ "invalidate": { "min_display_ms": 500 } }"#).unwrap();
        assert_eq!(config.save, ControllerConfig::save());
        assert_eq!(config.invalidate.min_display_ms, 500);
        assert_eq!(config.invalidate.recently_pending_ms, 500);
    }

    #[test]
    fn test_invalid_section_is_rejected() {
        let err = AppConfig::from_json(r#"{ "save": { "min_display_ms": 999999 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
