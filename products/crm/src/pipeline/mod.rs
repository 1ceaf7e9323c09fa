//! Pipeline aggregation and stage transitions.

mod metrics;
mod partition;
mod session;
mod transition;

use entity::{RecordId, StageId};
use platform_store::StoreError;
use thiserror::Error;

pub use metrics::{PipelineMetrics, pipeline_metrics};
pub use partition::{PipelineBoard, StageAggregate, StageColumn, partition};
pub use session::{DEFAULT_WRITE_TIMEOUT, MoveOutcome, PipelineSession, StageMove};
pub use transition::{Transition, validate_transition};

/// Why a stage move was refused before any write was attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("deal {0} is not on the board")]
    UnknownDeal(RecordId),
    #[error("stage {0} does not exist")]
    UnknownStage(StageId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("transition rejected: {0}")]
    TransitionRejected(RejectReason),
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[source] StoreError),
    /// Partitioner bug; never a runtime condition.
    #[error("aggregate for stage {stage} does not match its members")]
    AggregateInconsistency { stage: StageId },
    #[error("failed to load pipeline: {0}")]
    Load(#[source] StoreError),
}
