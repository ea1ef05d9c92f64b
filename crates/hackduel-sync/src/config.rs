//! Configuration for the write-behind synchronizer
//!
//! Controls the flush queue bound and the retry schedule for durable writes.

use crate::SyncError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the flush queue and its drain worker
///
/// # Examples
///
/// ```
/// use hackduel_sync::SyncConfig;
/// use std::time::Duration;
///
/// let config = SyncConfig::default();
/// assert_eq!(config.queue_capacity, 1024);
/// assert_eq!(config.backoff_delay(1), Duration::from_millis(100));
/// assert_eq!(config.backoff_delay(2), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Bounded channel size between request handlers and the drain worker.
    /// Entries that do not fit are parked in the overflow map.
    /// Default: 1024
    pub queue_capacity: usize,

    /// Attempts per durable write before it is declared a durability gap
    /// Default: 5
    pub max_attempts: u32,

    /// Delay before the first retry (in milliseconds), doubled per attempt
    /// Default: 100
    pub initial_backoff_ms: u64,

    /// Upper bound on the retry delay (in milliseconds)
    /// Default: 5000
    pub max_backoff_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 5000,
        }
    }
}

impl SyncConfig {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// Check that the configuration can drive a worker
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.queue_capacity == 0 {
            return Err(SyncError::Config("queue_capacity must be at least 1".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(SyncError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(SyncError::Config(format!(
                "max_backoff_ms ({}) is below initial_backoff_ms ({})",
                self.max_backoff_ms, self.initial_backoff_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.initial_backoff_ms, 100);
        assert_eq!(config.max_backoff_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = SyncConfig::default();
        assert_eq!(config.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(400));
        assert_eq!(config.backoff_delay(6), Duration::from_millis(3200));
        assert_eq!(config.backoff_delay(7), Duration::from_millis(5000));
        assert_eq!(config.backoff_delay(100), Duration::from_millis(5000));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = SyncConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let config = SyncConfig {
            initial_backoff_ms: 500,
            max_backoff_ms: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: SyncConfig = serde_json::from_str(r#"{"max_attempts": 2}"#).unwrap();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.queue_capacity, 1024);
    }
}
