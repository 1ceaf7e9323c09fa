//! Record store primitives.
//!
//! Consumers hold a [`StoreSet`] of trait objects and never learn which
//! backend sits behind it: [`memory::MemoryBackend`] for development and
//! tests, [`hosted::HostedBackend`] for the hosted record API.

pub mod hosted;
pub mod memory;
pub mod seed;

use std::sync::Arc;

use async_trait::async_trait;
use entity::{Record, RecordId, StageId, activity, contact, deal, stage};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("store request timed out")]
    Timeout,
    #[error("store rejected request: {0}")]
    Rejected(String),
    #[error("store transport error: {0}")]
    Transport(String),
    #[error("malformed store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD over one table of records.
#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<T>>;

    async fn get(&self, id: RecordId) -> StoreResult<T>;

    async fn create(&self, draft: T::Draft) -> StoreResult<T>;

    async fn update(&self, id: RecordId, patch: T::Patch) -> StoreResult<T>;

    async fn delete(&self, id: RecordId) -> StoreResult<()>;
}

/// Deal table with the single-field stage write used by pipeline moves.
#[async_trait]
pub trait DealStore: RecordStore<deal::Model> {
    /// Persist a new stage reference. No other deal field may change.
    async fn set_deal_stage(&self, id: RecordId, stage: StageId) -> StoreResult<deal::Model>;
}

/// Read-only stage reference data.
#[async_trait]
pub trait StageStore: Send + Sync {
    /// Stages in column order.
    async fn list_stages(&self) -> StoreResult<Vec<stage::Model>>;

    async fn get_stage(&self, id: &StageId) -> StoreResult<stage::Model> {
        self.list_stages()
            .await?
            .into_iter()
            .find(|stage| &stage.id == id)
            .ok_or_else(|| StoreError::not_found("stage", id))
    }
}

/// The full set of stores handed to the CRM core.
#[derive(Clone)]
pub struct StoreSet {
    pub contacts: Arc<dyn RecordStore<contact::Model>>,
    pub deals: Arc<dyn DealStore>,
    pub stages: Arc<dyn StageStore>,
    pub activities: Arc<dyn RecordStore<activity::Model>>,
}

impl std::fmt::Debug for StoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSet").finish_non_exhaustive()
    }
}
