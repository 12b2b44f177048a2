//! Pipeline steps and their display metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::PipelineState;

/// One step of the bridging pipeline.
///
/// Variants are declared in pipeline order, so `Ord` follows execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    /// First half of the token creation on the destination chain.
    #[serde(rename = "TOKEN_CREATION_1_2")]
    TokenCreationPart1,
    /// Second half of the token creation.
    #[serde(rename = "TOKEN_CREATION_2_2")]
    TokenCreationPart2,
    /// Moving liquidity across the bridge.
    #[serde(rename = "LIQUIDITY_BRIDGE")]
    LiquidityBridge,
    /// Depositing the bridged liquidity into the pool.
    #[serde(rename = "LIQUIDITY_DEPOSIT")]
    LiquidityDeposit,
}

impl Step {
    /// All steps in pipeline order.
    pub const ALL: [Self; 4] = [
        Self::TokenCreationPart1,
        Self::TokenCreationPart2,
        Self::LiquidityBridge,
        Self::LiquidityDeposit,
    ];

    /// Returns the wire identifier of the step.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenCreationPart1 => "TOKEN_CREATION_1_2",
            Self::TokenCreationPart2 => "TOKEN_CREATION_2_2",
            Self::LiquidityBridge => "LIQUIDITY_BRIDGE",
            Self::LiquidityDeposit => "LIQUIDITY_DEPOSIT",
        }
    }

    /// Zero-based position in pipeline order.
    #[must_use]
    pub fn position(&self) -> usize {
        *self as usize
    }

    /// Returns the display metadata for this step.
    #[must_use]
    pub fn metadata(&self) -> StepMetadata {
        match self {
            Self::TokenCreationPart1 => StepMetadata::new("Creating token (1/2)", 60),
            Self::TokenCreationPart2 => StepMetadata::new("Creating token (2/2)", 60),
            Self::LiquidityBridge => StepMetadata::new("Bridging liquidity", 600),
            Self::LiquidityDeposit => StepMetadata::new("Depositing liquidity", 120),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepMetadata {
    /// Human readable label.
    pub label: &'static str,
    /// Rough wall-clock estimate for the step.
    pub estimated_duration: Duration,
}

impl StepMetadata {
    const fn new(label: &'static str, seconds: u64) -> Self {
        Self {
            label,
            estimated_duration: Duration::from_secs(seconds),
        }
    }
}

/// Lookups over the fixed step table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRegistry;

impl StepRegistry {
    /// Sum of every step's estimated duration.
    #[must_use]
    pub fn estimated_total() -> Duration {
        Step::ALL.iter().map(|s| s.metadata().estimated_duration).sum()
    }

    /// Sum of the estimates of steps that have not completed.
    #[must_use]
    pub fn estimated_remaining(state: &PipelineState) -> Duration {
        state
            .iter()
            .filter(|(_, status)| !status.is_completed())
            .map(|(step, _)| step.metadata().estimated_duration)
            .sum()
    }

    /// First step in pipeline order that has not completed.
    #[must_use]
    pub fn current_step(state: &PipelineState) -> Option<Step> {
        state
            .iter()
            .find(|(_, status)| !status.is_completed())
            .map(|(step, _)| step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepStatus;

    #[test]
    fn test_step_order() {
        let positions: Vec<usize> = Step::ALL.iter().map(Step::position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert!(Step::TokenCreationPart1 < Step::LiquidityDeposit);
    }

    #[test]
    fn test_step_wire_names() {
        for step in Step::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{}\"", step.as_str()));
        }
        let step: Step = serde_json::from_str(r#""LIQUIDITY_BRIDGE""#).unwrap();
        assert_eq!(step, Step::LiquidityBridge);
        assert!(serde_json::from_str::<Step>(r#""TOKEN_CREATION""#).is_err());
    }

    #[test]
    fn test_estimated_total() {
        assert_eq!(StepRegistry::estimated_total(), Duration::from_secs(840));
    }

    #[test]
    fn test_estimated_remaining_skips_completed() {
        let state = PipelineState::pending()
            .with(Step::TokenCreationPart1, StepStatus::Completed)
            .with(Step::TokenCreationPart2, StepStatus::Completed);

        assert_eq!(
            StepRegistry::estimated_remaining(&state),
            Duration::from_secs(720)
        );
        assert_eq!(
            StepRegistry::estimated_remaining(&PipelineState::all_completed()),
            Duration::ZERO
        );
    }

    #[test]
    fn test_current_step() {
        let state = PipelineState::pending()
            .with(Step::TokenCreationPart1, StepStatus::Completed)
            .with(Step::TokenCreationPart2, StepStatus::InProgress);
        assert_eq!(
            StepRegistry::current_step(&state),
            Some(Step::TokenCreationPart2)
        );
        assert_eq!(StepRegistry::current_step(&PipelineState::all_completed()), None);
    }
}
