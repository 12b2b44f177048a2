//! Durable completion flags.
//!
//! Once a pipeline reports every step completed, the flag is written so a
//! later observer can skip subscribing altogether. Flags are write-once per
//! key and never cleared here, which lets concurrent writers race without a
//! lock: they all write the same value.

mod file;
mod memory;

pub use file::FileCompletionCache;
pub use memory::InMemoryCompletionCache;

use async_trait::async_trait;

use crate::errors::BridgeError;

/// Value stored under a completion key.
pub const COMPLETED_VALUE: &str = "true";

/// Returns the storage key for a token address: `bridge-<address>-completed`.
#[must_use]
pub fn completion_key(token_address: &str) -> String {
    format!("bridge-{token_address}-completed")
}

/// Storage backend for completion flags.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionCache: Send + Sync {
    /// Returns true if the address was recorded as complete.
    async fn has(&self, token_address: &str) -> Result<bool, BridgeError>;

    /// Records the address as complete. Idempotent.
    async fn mark_complete(&self, token_address: &str) -> Result<(), BridgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_key_layout() {
        assert_eq!(completion_key("0xAbC"), "bridge-0xAbC-completed");
    }
}
