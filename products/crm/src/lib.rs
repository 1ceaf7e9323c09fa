//! CRM vertical slice.
//!
//! The pipeline module is the only stateful part: a [`pipeline::PipelineSession`]
//! owns one user's view of deals and stages and applies stage moves only after
//! the store confirms them. Everything else is pure list shaping over records
//! fetched from a [`platform_store::StoreSet`].

pub mod activities;
pub mod contacts;
pub mod format;
pub mod pipeline;
pub mod validation;

pub use pipeline::{
    MoveOutcome, PipelineBoard, PipelineError, PipelineMetrics, PipelineSession, StageAggregate,
    StageColumn, StageMove,
};
pub use validation::ValidationErrors;
