//! Normalized CRM records.
//!
//! Every store backend maps its own wire shape onto these types, so nothing
//! above the store ever branches on which backend produced a record.

pub mod activity;
pub mod contact;
pub mod deal;
pub mod stage;

use chrono::{DateTime, Utc};

pub use stage::StageId;

/// Integer identity shared by contacts, deals and activities.
pub type RecordId = i64;

/// A mutable record kept in a [`RecordId`]-keyed table.
pub trait Record: Clone + Send + Sync + 'static {
    /// Fields supplied when creating a record.
    type Draft: Clone + Send + Sync + 'static;
    /// Partial update; `None` fields are left untouched.
    type Patch: Clone + Send + Sync + 'static;

    /// Human readable kind used in errors and spans.
    const KIND: &'static str;

    fn id(&self) -> RecordId;

    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);
}
