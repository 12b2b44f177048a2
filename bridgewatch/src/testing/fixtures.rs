//! Frame builders for driving a session by hand.

use serde_json::json;

use crate::core::{PipelineState, Step, StepStatus};
use crate::protocol::{GasUpdate, ServerEvent, StatusUpdate, GAS_UPDATE_EVENT, STATUS_UPDATE_EVENT};
use crate::state::GasStatus;

/// A `bridgeStatusUpdate` event carrying a full snapshot.
#[must_use]
pub fn status_event(token_address: &str, state: PipelineState) -> ServerEvent {
    ServerEvent::Status(StatusUpdate {
        token_address: token_address.to_string(),
        status: state,
    })
}

/// A `gasStatusUpdate` event.
#[must_use]
pub fn gas_event(token_address: &str, gas: GasStatus) -> ServerEvent {
    ServerEvent::Gas(GasUpdate {
        token_address: token_address.to_string(),
        gas,
    })
}

/// Raw status frame with the given `(step, status)` pairs only.
///
/// Useful for partial snapshots, which the typed builders cannot express.
#[must_use]
pub fn status_frame(token_address: &str, steps: &[(Step, StepStatus)]) -> String {
    let status: serde_json::Map<String, serde_json::Value> = steps
        .iter()
        .map(|(step, status)| (step.as_str().to_string(), json!(status)))
        .collect();
    json!({
        "event": STATUS_UPDATE_EVENT,
        "data": { "tokenAddress": token_address, "status": status },
    })
    .to_string()
}

/// Raw gas frame.
#[must_use]
pub fn gas_frame(
    token_address: &str,
    step: Step,
    current_gas: f64,
    threshold: f64,
    status: StepStatus,
) -> String {
    json!({
        "event": GAS_UPDATE_EVENT,
        "data": {
            "tokenAddress": token_address,
            "step": step.as_str(),
            "currentGas": current_gas,
            "threshold": threshold,
            "status": status,
        },
    })
    .to_string()
}

/// Snapshot with the first `n` steps completed and the rest pending.
#[must_use]
pub fn completed_through(n: usize) -> PipelineState {
    Step::ALL
        .iter()
        .take(n)
        .fold(PipelineState::pending(), |state, step| {
            state.with(*step, StepStatus::Completed)
        })
}
