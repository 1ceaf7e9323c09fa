//! In-process backend. Each table is an explicit value injected into its
//! consumers; nothing here is global.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use entity::{Record, RecordId, StageId, activity, contact, deal, stage};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{DealStore, RecordStore, StageStore, StoreError, StoreResult, StoreSet, seed};

/// Knobs for simulating a slow or failing backend.
#[derive(Debug, Default)]
struct Behaviour {
    latency_ms: AtomicU64,
    fail_writes: AtomicBool,
    write_attempts: AtomicUsize,
}

impl Behaviour {
    async fn pause(&self) {
        let ms = self.latency_ms.load(Ordering::Relaxed);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    async fn begin_write(&self) -> StoreResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("simulated write failure".into()));
        }
        Ok(())
    }
}

pub struct MemoryTable<T> {
    rows: RwLock<Vec<T>>,
    behaviour: Behaviour,
}

impl<T: Record> MemoryTable<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows: RwLock::new(rows),
            behaviour: Behaviour::default(),
        }
    }

    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.behaviour.latency_ms.store(ms, Ordering::Relaxed);
    }

    /// Make every subsequent write fail until switched off again.
    pub fn fail_writes(&self, fail: bool) {
        self.behaviour.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of writes attempted against this table, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.behaviour.write_attempts.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.rows.read().await.clone()
    }

    fn next_id(rows: &[T]) -> RecordId {
        rows.iter().map(Record::id).max().unwrap_or(0) + 1
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryTable<T> {
    async fn list(&self) -> StoreResult<Vec<T>> {
        self.behaviour.pause().await;
        Ok(self.rows.read().await.clone())
    }

    async fn get(&self, id: RecordId) -> StoreResult<T> {
        self.behaviour.pause().await;
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.id() == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(T::KIND, id))
    }

    async fn create(&self, draft: T::Draft) -> StoreResult<T> {
        self.behaviour.begin_write().await?;
        let mut rows = self.rows.write().await;
        let id = Self::next_id(&rows);
        let record = T::from_draft(id, draft, Utc::now());
        rows.push(record.clone());
        debug!(kind = T::KIND, id, "memory record created");
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: T::Patch) -> StoreResult<T> {
        self.behaviour.begin_write().await?;
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(|| StoreError::not_found(T::KIND, id))?;
        row.apply_patch(patch, Utc::now());
        Ok(row.clone())
    }

    async fn delete(&self, id: RecordId) -> StoreResult<()> {
        self.behaviour.begin_write().await?;
        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or_else(|| StoreError::not_found(T::KIND, id))?;
        rows.remove(index);
        debug!(kind = T::KIND, id, "memory record deleted");
        Ok(())
    }
}

#[async_trait]
impl DealStore for MemoryTable<deal::Model> {
    async fn set_deal_stage(&self, id: RecordId, stage: StageId) -> StoreResult<deal::Model> {
        self.update(id, deal::Patch::stage_only(stage)).await
    }
}

pub struct MemoryStages {
    stages: Vec<stage::Model>,
}

impl MemoryStages {
    pub fn new(mut stages: Vec<stage::Model>) -> Self {
        stage::sort_for_display(&mut stages);
        Self { stages }
    }
}

#[async_trait]
impl StageStore for MemoryStages {
    async fn list_stages(&self) -> StoreResult<Vec<stage::Model>> {
        Ok(self.stages.clone())
    }
}

/// Concrete handles to every in-memory table, kept so tests can inspect
/// and steer them after the [`StoreSet`] has been handed out.
#[derive(Clone)]
pub struct MemoryBackend {
    pub contacts: Arc<MemoryTable<contact::Model>>,
    pub deals: Arc<MemoryTable<deal::Model>>,
    pub stages: Arc<MemoryStages>,
    pub activities: Arc<MemoryTable<activity::Model>>,
}

impl MemoryBackend {
    pub fn new(
        stages: Vec<stage::Model>,
        contacts: Vec<contact::Model>,
        deals: Vec<deal::Model>,
        activities: Vec<activity::Model>,
    ) -> Self {
        Self {
            contacts: Arc::new(MemoryTable::new(contacts)),
            deals: Arc::new(MemoryTable::new(deals)),
            stages: Arc::new(MemoryStages::new(stages)),
            activities: Arc::new(MemoryTable::new(activities)),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    /// Backend preloaded with the demo pipeline.
    pub fn seeded() -> Self {
        let data = seed::demo_dataset(Utc::now());
        Self::new(data.stages, data.contacts, data.deals, data.activities)
    }

    pub fn set_latency(&self, latency: Duration) {
        self.contacts.set_latency(latency);
        self.deals.set_latency(latency);
        self.activities.set_latency(latency);
    }

    pub fn store_set(&self) -> StoreSet {
        StoreSet {
            contacts: self.contacts.clone(),
            deals: self.deals.clone(),
            stages: self.stages.clone(),
            activities: self.activities.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_draft(name: &str) -> contact::Draft {
        contact::Draft {
            name: name.into(),
            company: "Acme".into(),
            email: format!("{}@acme.test", name.to_lowercase()),
            ..contact::Draft::default()
        }
    }

    #[tokio::test]
    async fn ids_continue_from_the_highest_existing_id() {
        let table = MemoryTable::<contact::Model>::new(Vec::new());
        let first = table.create(contact_draft("Ada")).await.unwrap();
        let second = table.create(contact_draft("Grace")).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        table.delete(1).await.unwrap();
        let third = table.create(contact_draft("Linus")).await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let table = MemoryTable::<contact::Model>::new(Vec::new());
        assert!(table.get(7).await.unwrap_err().is_not_found());
        assert!(table.update(7, contact::Patch::default()).await.unwrap_err().is_not_found());
        assert!(table.delete(7).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_keeps_id_and_bumps_updated_at() {
        let table = MemoryTable::<contact::Model>::new(Vec::new());
        let created = table.create(contact_draft("Ada")).await.unwrap();
        let updated = table
            .update(
                created.id,
                contact::Patch {
                    company: Some("Analytical".into()),
                    ..contact::Patch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.company, "Analytical");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn failing_writes_leave_rows_untouched() {
        let backend = MemoryBackend::seeded();
        let before = backend.deals.snapshot().await;
        backend.deals.fail_writes(true);
        let err = backend
            .deals
            .set_deal_stage(before[0].id, StageId::from("won"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(backend.deals.snapshot().await, before);
        assert_eq!(backend.deals.write_attempts(), 1);
    }

    #[tokio::test]
    async fn stages_come_back_in_column_order() {
        let stages = MemoryStages::new(vec![
            stage::Model::new("won", "Won", 2),
            stage::Model::new("lead", "Lead", 1),
        ]);
        let listed = stages.list_stages().await.unwrap();
        assert_eq!(listed[0].id.as_str(), "lead");
        let won = stages.get_stage(&StageId::from("won")).await.unwrap();
        assert!(won.is_won);
        assert!(stages.get_stage(&StageId::from("x")).await.is_err());
    }
}
