//! Latest-value holder for gas telemetry.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApplyOutcome;
use crate::core::{Step, StepStatus, TokenAddress};

/// Gas reading for one step.
///
/// The step need not be the current one in pipeline order; readings can lag
/// or lead the status snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasStatus {
    /// Step the reading belongs to.
    pub step: Step,
    /// Gas currently available to the executor.
    pub current_gas: f64,
    /// Gas required before the step can proceed.
    pub threshold: f64,
    /// Status of the step at the time of the reading.
    pub status: StepStatus,
}

impl GasStatus {
    /// Creates a new gas reading.
    #[must_use]
    pub fn new(step: Step, current_gas: f64, threshold: f64, status: StepStatus) -> Self {
        Self {
            step,
            current_gas,
            threshold,
            status,
        }
    }

    /// Returns true if the available gas is below the threshold.
    #[must_use]
    pub fn is_below_threshold(&self) -> bool {
        self.current_gas < self.threshold
    }

    /// Gas still missing to reach the threshold, zero once reached.
    #[must_use]
    pub fn shortfall(&self) -> f64 {
        (self.threshold - self.current_gas).max(0.0)
    }
}

/// Holds the most recent gas reading for one token address.
#[derive(Debug, Clone)]
pub struct GasMonitor {
    subject: TokenAddress,
    latest: Option<GasStatus>,
}

impl GasMonitor {
    /// Creates a monitor with no reading yet.
    #[must_use]
    pub fn new(subject: TokenAddress) -> Self {
        Self {
            subject,
            latest: None,
        }
    }

    /// Returns the observed token address.
    #[must_use]
    pub fn subject(&self) -> &TokenAddress {
        &self.subject
    }

    /// Overwrites the held reading if `token_address` is the subject.
    pub fn apply(&mut self, token_address: &str, update: GasStatus) -> ApplyOutcome {
        if !self.subject.matches(token_address) {
            debug!(
                subject = %self.subject,
                token_address,
                "Dropping gas update for foreign address"
            );
            return ApplyOutcome::AddressMismatch;
        }
        self.latest = Some(update);
        ApplyOutcome::Applied
    }

    /// Returns the last applied reading.
    #[must_use]
    pub fn current(&self) -> Option<GasStatus> {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn monitor() -> GasMonitor {
        GasMonitor::new(TokenAddress::new("0xabc").unwrap())
    }

    #[test]
    fn test_starts_empty() {
        assert_eq!(monitor().current(), None);
    }

    #[test]
    fn test_latest_update_wins() {
        let mut gas = monitor();
        let first = GasStatus::new(Step::LiquidityBridge, 40.0, 50.0, StepStatus::WaitingForGas);
        let second = GasStatus::new(Step::LiquidityBridge, 55.0, 50.0, StepStatus::InProgress);

        assert_eq!(gas.apply("0xabc", first), ApplyOutcome::Applied);
        assert_eq!(gas.apply("0xabc", second), ApplyOutcome::Applied);

        assert_eq!(gas.current(), Some(second));
    }

    #[test]
    fn test_foreign_address_dropped() {
        let mut gas = monitor();
        let reading = GasStatus::new(Step::LiquidityDeposit, 1.0, 2.0, StepStatus::WaitingForGas);

        assert_eq!(gas.apply("0xdef", reading), ApplyOutcome::AddressMismatch);
        assert_eq!(gas.current(), None);
    }

    #[test]
    fn test_threshold_helpers() {
        let waiting = GasStatus::new(Step::LiquidityBridge, 40.0, 50.0, StepStatus::WaitingForGas);
        assert!(waiting.is_below_threshold());
        assert!((waiting.shortfall() - 10.0).abs() < f64::EPSILON);

        let funded = GasStatus::new(Step::LiquidityBridge, 55.0, 50.0, StepStatus::InProgress);
        assert!(!funded.is_below_threshold());
        assert!(funded.shortfall().abs() < f64::EPSILON);
    }
}
