//! Step status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution status of a single pipeline step, as reported by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    /// Step has not started yet.
    Pending,
    /// Step is currently executing.
    InProgress,
    /// Step is blocked until the deployer funds enough gas.
    WaitingForGas,
    /// Step finished.
    Completed,
}

impl Default for StepStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "inProgress"),
            Self::WaitingForGas => write!(f, "waitingForGas"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl StepStatus {
    /// Returns true if the step has completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the step is actively being worked on, including gas waits.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress | Self::WaitingForGas)
    }
}
