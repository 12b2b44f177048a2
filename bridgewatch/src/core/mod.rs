//! Core domain model types for bridgewatch.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Pipeline steps and their metadata registry
//! - Step status enum
//! - The per-step pipeline state
//! - Token address newtype

mod address;
mod state;
mod status;
mod step;

pub use address::TokenAddress;
pub use state::PipelineState;
pub use status::StepStatus;
pub use step::{Step, StepMetadata, StepRegistry};
