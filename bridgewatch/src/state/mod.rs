//! Client-side state for one observed pipeline.
//!
//! - [`PipelineStateMachine`] holds the step statuses
//! - [`GasMonitor`] holds the latest gas reading
//! - [`BridgeView`] is the pair exposed to the UI

mod gas;
mod pipeline;

pub use gas::{GasMonitor, GasStatus};
pub use pipeline::PipelineStateMachine;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::core::{PipelineState, Step, StepRegistry};

/// Result of applying an inbound update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The update replaced the held value.
    Applied,
    /// The update was applied and the pipeline just became complete.
    Completed,
    /// The update named another token address and was dropped.
    AddressMismatch,
}

impl ApplyOutcome {
    /// Returns true if the held value changed.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::AddressMismatch)
    }
}

/// Snapshot of the client-side state handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeView {
    /// Status of every step.
    pub bridge_state: PipelineState,
    /// Latest gas reading, if any arrived this session.
    pub gas_status: Option<GasStatus>,
    /// When the last applied event arrived.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for BridgeView {
    fn default() -> Self {
        Self {
            bridge_state: PipelineState::pending(),
            gas_status: None,
            updated_at: None,
        }
    }
}

impl BridgeView {
    /// View of a pipeline already known to be complete.
    #[must_use]
    pub fn completed() -> Self {
        Self {
            bridge_state: PipelineState::all_completed(),
            ..Self::default()
        }
    }

    /// Returns true if every step is completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.bridge_state.is_complete()
    }

    /// First unfinished step in pipeline order.
    #[must_use]
    pub fn current_step(&self) -> Option<Step> {
        StepRegistry::current_step(&self.bridge_state)
    }

    /// Estimated time left, from the step registry.
    #[must_use]
    pub fn estimated_remaining(&self) -> Duration {
        StepRegistry::estimated_remaining(&self.bridge_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepStatus;
    use serde_json::json;

    #[test]
    fn test_default_view() {
        let view = BridgeView::default();
        assert!(!view.is_complete());
        assert_eq!(view.current_step(), Some(Step::TokenCreationPart1));
        assert_eq!(view.estimated_remaining(), StepRegistry::estimated_total());
    }

    #[test]
    fn test_completed_view() {
        let view = BridgeView::completed();
        assert!(view.is_complete());
        assert_eq!(view.current_step(), None);
        assert_eq!(view.estimated_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_view_serializes_for_ui() {
        let view = BridgeView {
            gas_status: Some(GasStatus::new(
                Step::LiquidityBridge,
                40.0,
                50.0,
                StepStatus::WaitingForGas,
            )),
            ..BridgeView::default()
        };
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["bridgeState"]["LIQUIDITY_BRIDGE"], json!("pending"));
        assert_eq!(
            value["gasStatus"],
            json!({
                "step": "LIQUIDITY_BRIDGE",
                "currentGas": 40.0,
                "threshold": 50.0,
                "status": "waitingForGas",
            })
        );
        assert_eq!(value["updatedAt"], json!(null));
    }

    #[test]
    fn test_apply_outcome_is_applied() {
        assert!(ApplyOutcome::Applied.is_applied());
        assert!(ApplyOutcome::Completed.is_applied());
        assert!(!ApplyOutcome::AddressMismatch.is_applied());
    }
}
