//! The per-step status mapping for one pipeline instance.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use super::{Step, StepStatus};
use crate::errors::IncompleteSnapshotError;

/// Status of every step of one pipeline.
///
/// Always holds all four steps; a fresh state has every step `pending`.
/// On the wire it is a JSON object keyed by step identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "BTreeMap<Step, StepStatus>")]
pub struct PipelineState {
    statuses: [StepStatus; 4],
}

impl PipelineState {
    /// Creates a state with every step pending.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Creates a state with every step completed.
    #[must_use]
    pub fn all_completed() -> Self {
        Self {
            statuses: [StepStatus::Completed; 4],
        }
    }

    /// Returns the state with one step replaced.
    #[must_use]
    pub fn with(mut self, step: Step, status: StepStatus) -> Self {
        self.set(step, status);
        self
    }

    /// Sets the status of a step.
    pub fn set(&mut self, step: Step, status: StepStatus) {
        self.statuses[step.position()] = status;
    }

    /// Returns the status of a step.
    #[must_use]
    pub fn get(&self, step: Step) -> StepStatus {
        self.statuses[step.position()]
    }

    /// Iterates over all steps in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (Step, StepStatus)> + '_ {
        Step::ALL.iter().map(move |step| (*step, self.get(*step)))
    }

    /// Returns true iff every step is completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.statuses.iter().all(StepStatus::is_completed)
    }

    /// Number of completed steps.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_completed()).count()
    }
}

impl TryFrom<BTreeMap<Step, StepStatus>> for PipelineState {
    type Error = IncompleteSnapshotError;

    fn try_from(map: BTreeMap<Step, StepStatus>) -> Result<Self, Self::Error> {
        let missing: Vec<Step> = Step::ALL
            .into_iter()
            .filter(|step| !map.contains_key(step))
            .collect();
        if !missing.is_empty() {
            return Err(IncompleteSnapshotError::new(missing));
        }

        let mut state = Self::pending();
        for (step, status) in map {
            state.set(step, status);
        }
        Ok(state)
    }
}

impl Serialize for PipelineState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Step::ALL.len()))?;
        for (step, status) in self.iter() {
            map.serialize_entry(&step, &status)?;
        }
        map.end()
    }
}
