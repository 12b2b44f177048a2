//! Session configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ReconnectPolicy;
use crate::errors::BridgeError;

/// Configuration for a [`SubscriptionSession`](super::SubscriptionSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Reconnection policy.
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
    /// Upper bound for one connect attempt; exceeding it counts as a failure.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Upper bound for each teardown step (unsubscribe, close).
    #[serde(default = "default_teardown_timeout_ms")]
    pub teardown_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_teardown_timeout_ms() -> u64 {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
            teardown_timeout_ms: default_teardown_timeout_ms(),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with the reference policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON; absent fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the reconnection policy.
    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.connect_timeout_ms = timeout;
        self
    }

    /// Sets the teardown timeout.
    #[must_use]
    pub fn with_teardown_timeout_ms(mut self, timeout: u64) -> Self {
        self.teardown_timeout_ms = timeout;
        self
    }

    /// Gets the connect timeout as Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Gets the teardown timeout as Duration.
    #[must_use]
    pub fn teardown_timeout(&self) -> Duration {
        Duration::from_millis(self.teardown_timeout_ms)
    }

    /// Checks the configuration for values that would stall a session.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.reconnect.max_attempts == 0 {
            return Err(BridgeError::Config(
                "reconnect.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(BridgeError::Config(
                "connect_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
