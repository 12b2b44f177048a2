//! Pipeline state machine with replace-whole snapshot semantics.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::ApplyOutcome;
use crate::cache::CompletionCache;
use crate::core::{PipelineState, TokenAddress};

/// Holds the status of every step for one token address.
///
/// Each snapshot from the executor is a complete restatement, so `apply`
/// replaces the held state rather than merging it. The first transition to
/// all-completed records the completion flag.
pub struct PipelineStateMachine {
    subject: TokenAddress,
    state: PipelineState,
    cache: Arc<dyn CompletionCache>,
}

impl PipelineStateMachine {
    /// Creates a machine with every step pending.
    #[must_use]
    pub fn new(subject: TokenAddress, cache: Arc<dyn CompletionCache>) -> Self {
        Self {
            subject,
            state: PipelineState::pending(),
            cache,
        }
    }

    /// Returns the observed token address.
    #[must_use]
    pub fn subject(&self) -> &TokenAddress {
        &self.subject
    }

    /// Replaces the held state if `token_address` is the subject.
    ///
    /// A foreign address is a silent no-op. A cache write failure is logged
    /// and does not undo the applied snapshot.
    pub async fn apply(&mut self, token_address: &str, snapshot: PipelineState) -> ApplyOutcome {
        if !self.subject.matches(token_address) {
            debug!(
                subject = %self.subject,
                token_address,
                "Dropping snapshot for foreign address"
            );
            return ApplyOutcome::AddressMismatch;
        }

        let was_complete = self.state.is_complete();
        self.state = snapshot;

        if was_complete || !self.state.is_complete() {
            return ApplyOutcome::Applied;
        }

        info!(token_address = %self.subject, "Bridging pipeline completed");
        if let Err(e) = self.cache.mark_complete(self.subject.as_str()).await {
            warn!(
                token_address = %self.subject,
                error = %e,
                "Failed to record completion flag"
            );
        }
        ApplyOutcome::Completed
    }

    /// Returns true iff every step is completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Returns the present state.
    #[must_use]
    pub fn current(&self) -> PipelineState {
        self.state
    }
}

impl std::fmt::Debug for PipelineStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStateMachine")
            .field("subject", &self.subject)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryCompletionCache, MockCompletionCache};
    use crate::core::{Step, StepStatus};
    use crate::errors::BridgeError;
    use pretty_assertions::assert_eq;

    fn machine_with(cache: impl CompletionCache + 'static) -> PipelineStateMachine {
        PipelineStateMachine::new(TokenAddress::new("0xabc").unwrap(), Arc::new(cache))
    }

    fn nearly_done() -> PipelineState {
        PipelineState::all_completed().with(Step::LiquidityDeposit, StepStatus::InProgress)
    }

    #[tokio::test]
    async fn test_initial_state_is_pending_and_incomplete() {
        let machine = machine_with(InMemoryCompletionCache::new());
        assert_eq!(machine.current(), PipelineState::pending());
        assert!(!machine.is_complete());
    }

    #[tokio::test]
    async fn test_later_snapshot_replaces_whole_state() {
        let mut machine = machine_with(InMemoryCompletionCache::new());
        let s1 = PipelineState::pending()
            .with(Step::TokenCreationPart1, StepStatus::Completed)
            .with(Step::TokenCreationPart2, StepStatus::InProgress);
        let s2 = PipelineState::pending().with(Step::TokenCreationPart1, StepStatus::InProgress);

        machine.apply("0xabc", s1).await;
        machine.apply("0xabc", s2).await;

        assert_eq!(machine.current(), s2);
    }

    #[tokio::test]
    async fn test_foreign_address_is_noop() {
        let mut machine = machine_with(InMemoryCompletionCache::new());
        machine.apply("0xabc", nearly_done()).await;
        let before = machine.current();

        let outcome = machine.apply("0xdef", PipelineState::all_completed()).await;

        assert_eq!(outcome, ApplyOutcome::AddressMismatch);
        assert_eq!(machine.current(), before);
    }

    #[tokio::test]
    async fn test_address_match_ignores_case() {
        let mut machine = machine_with(InMemoryCompletionCache::new());
        let outcome = machine.apply("0xABC", nearly_done()).await;
        assert_eq!(outcome, ApplyOutcome::Applied);
    }

    #[tokio::test]
    async fn test_completion_marks_cache_exactly_once() {
        let mut cache = MockCompletionCache::new();
        cache
            .expect_mark_complete()
            .withf(|address: &str| address == "0xabc")
            .times(1)
            .returning(|_| Ok(()));
        let mut machine = machine_with(cache);

        assert_eq!(machine.apply("0xabc", nearly_done()).await, ApplyOutcome::Applied);
        assert!(!machine.is_complete());

        assert_eq!(
            machine.apply("0xabc", PipelineState::all_completed()).await,
            ApplyOutcome::Completed
        );
        assert!(machine.is_complete());

        // Repeated completed snapshots do not write again.
        assert_eq!(
            machine.apply("0xabc", PipelineState::all_completed()).await,
            ApplyOutcome::Applied
        );
    }

    #[tokio::test]
    async fn test_incomplete_snapshot_leaves_cache_untouched() {
        let mut cache = MockCompletionCache::new();
        cache.expect_mark_complete().times(0);
        let mut machine = machine_with(cache);

        machine.apply("0xabc", nearly_done()).await;
        assert!(!machine.is_complete());
    }

    #[tokio::test]
    async fn test_cache_failure_keeps_state() {
        let mut cache = MockCompletionCache::new();
        cache
            .expect_mark_complete()
            .times(1)
            .returning(|_| Err(BridgeError::Storage("read-only".to_string())));
        let mut machine = machine_with(cache);

        let outcome = machine.apply("0xabc", PipelineState::all_completed()).await;

        assert_eq!(outcome, ApplyOutcome::Completed);
        assert!(machine.is_complete());
    }
}
