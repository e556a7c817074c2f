//! Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Configuration for a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Log verbosity, 0 (crit) through 5 (trace).
    pub verbosity: u8,
    /// Worker threads for the relay runtime.
    pub worker_threads: usize,
    /// Channel capacity used when a subscriber does not pick one.
    pub default_buffer: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            verbosity: 3,
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            default_buffer: 16,
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(BridgeError::InvalidConfig(
                "worker_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.verbosity, 3);
        assert_eq!(config.default_buffer, 16);
        assert!(config.worker_threads >= 1);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json(r#"{"verbosity": 5}"#).unwrap();
        assert_eq!(config.verbosity, 5);
        assert_eq!(config.default_buffer, 16);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            BridgeConfig::from_json("{"),
            Err(BridgeError::InvalidConfig(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json(r#"{"worker_threads": 0}"#),
            Err(BridgeError::InvalidConfig(_))
        ));
    }
}
