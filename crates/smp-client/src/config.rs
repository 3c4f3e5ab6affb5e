//! Client configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smp_protocol::HEADER_SIZE;

use crate::error::ConfigError;

/// Default transmission unit, small enough for a default BLE link.
pub const DEFAULT_MTU: usize = 140;

/// Default per-chunk acknowledgement deadline.
pub const DEFAULT_RETRY_TIMEOUT_MS: u64 = 1000;

/// Configuration for the SMP client.
///
/// ```yaml
/// mtu: 252
/// retry_timeout_ms: 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum bytes per transport write; bounds upload chunk size.
    ///
    /// Chunk sizing measures the body with an empty `data` field, whose
    /// length prefix grows once data is added. Upload frames can therefore
    /// exceed this by up to 2 bytes; leave that much headroom below the
    /// link's real limit.
    pub mtu: usize,
    /// How long to wait for an upload acknowledgement before resending.
    pub retry_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            mtu: DEFAULT_MTU,
            retry_timeout_ms: DEFAULT_RETRY_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check that the values can drive an upload.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mtu <= HEADER_SIZE {
            return Err(ConfigError::Invalid(format!(
                "mtu {} must exceed the {}-byte frame header",
                self.mtu, HEADER_SIZE
            )));
        }
        if self.retry_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "retry_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry deadline as a `Duration`.
    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }
}
