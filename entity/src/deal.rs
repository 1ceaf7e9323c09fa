use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Record, RecordId, StageId};

pub const DEFAULT_PROBABILITY: u8 = 50;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: RecordId,
    pub title: String,
    /// Deal value in cents. `None` counts as zero in every aggregate.
    pub value_cents: Option<i64>,
    pub stage: StageId,
    pub contact_id: Option<RecordId>,
    #[serde(default)]
    pub notes: String,
    pub close_date: Option<NaiveDate>,
    pub probability: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn value_or_zero(&self) -> i64 {
        self.value_cents.unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    pub value_cents: Option<i64>,
    pub stage: StageId,
    pub contact_id: Option<RecordId>,
    #[serde(default)]
    pub notes: String,
    pub close_date: Option<NaiveDate>,
    #[serde(default = "default_probability")]
    pub probability: u8,
}

fn default_probability() -> u8 {
    DEFAULT_PROBABILITY
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub title: Option<String>,
    pub value_cents: Option<Option<i64>>,
    pub stage: Option<StageId>,
    pub contact_id: Option<Option<RecordId>>,
    pub notes: Option<String>,
    pub close_date: Option<Option<NaiveDate>>,
    pub probability: Option<u8>,
}

impl Patch {
    /// A patch touching nothing but the stage reference.
    pub fn stage_only(stage: StageId) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }
}

impl Record for Model {
    type Draft = Draft;
    type Patch = Patch;

    const KIND: &'static str = "deal";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: Draft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            value_cents: draft.value_cents,
            stage: draft.stage,
            contact_id: draft.contact_id,
            notes: draft.notes,
            close_date: draft.close_date,
            probability: draft.probability,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: Patch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(value) = patch.value_cents {
            self.value_cents = value;
        }
        if let Some(stage) = patch.stage {
            self.stage = stage;
        }
        if let Some(contact_id) = patch.contact_id {
            self.contact_id = contact_id;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(close_date) = patch.close_date {
            self.close_date = close_date;
        }
        if let Some(probability) = patch.probability {
            self.probability = probability;
        }
        self.updated_at = now;
    }
}
