//! Row adapters between the hosted API's `_c` field naming and the
//! normalized records.

use chrono::{DateTime, NaiveDate, Utc};
use entity::{Record, RecordId, StageId, activity, contact, deal, stage};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{StoreError, StoreResult};

pub const STAGE_TABLE: &str = "stages";

/// A record type the hosted API can store.
pub trait HostedRecord: Record {
    const TABLE: &'static str;

    fn from_row(row: Value) -> StoreResult<Self>;

    fn draft_row(draft: &Self::Draft) -> Value;

    /// Only fields present in the patch are written.
    fn patch_row(patch: &Self::Patch) -> Value;
}

fn decode<T: for<'de> Deserialize<'de>>(kind: &str, row: Value) -> StoreResult<T> {
    serde_json::from_value(row).map_err(|err| StoreError::Decode(format!("{} row: {}", kind, err)))
}

fn cents_from_units(units: f64) -> i64 {
    (units * 100.0).round() as i64
}

fn units_from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn stamp(value: Option<DateTime<Utc>>) -> DateTime<Utc> {
    value.unwrap_or_default()
}

fn set_field<T: serde::Serialize>(row: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(value) = value {
        row.insert(key.to_string(), json!(value));
    }
}

#[derive(Deserialize)]
struct DealRow {
    #[serde(rename = "Id")]
    id: RecordId,
    title_c: String,
    value_c: Option<f64>,
    stage_c: StageId,
    contact_id_c: Option<RecordId>,
    notes_c: Option<String>,
    close_date_c: Option<NaiveDate>,
    probability_c: Option<u8>,
    #[serde(rename = "CreatedOn")]
    created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn")]
    modified_on: Option<DateTime<Utc>>,
}

impl HostedRecord for deal::Model {
    const TABLE: &'static str = "deals";

    fn from_row(row: Value) -> StoreResult<Self> {
        let row: DealRow = decode(Self::KIND, row)?;
        Ok(deal::Model {
            id: row.id,
            title: row.title_c,
            value_cents: row.value_c.map(cents_from_units),
            stage: row.stage_c,
            contact_id: row.contact_id_c,
            notes: row.notes_c.unwrap_or_default(),
            close_date: row.close_date_c,
            probability: row.probability_c.unwrap_or(deal::DEFAULT_PROBABILITY),
            created_at: stamp(row.created_on),
            updated_at: stamp(row.modified_on.or(row.created_on)),
        })
    }

    fn draft_row(draft: &deal::Draft) -> Value {
        json!({
            "title_c": draft.title,
            "value_c": draft.value_cents.map(units_from_cents),
            "stage_c": draft.stage,
            "contact_id_c": draft.contact_id,
            "notes_c": draft.notes,
            "close_date_c": draft.close_date,
            "probability_c": draft.probability,
        })
    }

    fn patch_row(patch: &deal::Patch) -> Value {
        let mut row = Map::new();
        set_field(&mut row, "title_c", &patch.title);
        set_field(
            &mut row,
            "value_c",
            &patch.value_cents.map(|value| value.map(units_from_cents)),
        );
        set_field(&mut row, "stage_c", &patch.stage);
        set_field(&mut row, "contact_id_c", &patch.contact_id);
        set_field(&mut row, "notes_c", &patch.notes);
        set_field(&mut row, "close_date_c", &patch.close_date);
        set_field(&mut row, "probability_c", &patch.probability);
        Value::Object(row)
    }
}

#[derive(Deserialize)]
struct ContactRow {
    #[serde(rename = "Id")]
    id: RecordId,
    name_c: String,
    company_c: Option<String>,
    email_c: Option<String>,
    phone_c: Option<String>,
    notes_c: Option<String>,
    /// Comma separated on the wire.
    tags_c: Option<String>,
    #[serde(rename = "CreatedOn")]
    created_on: Option<DateTime<Utc>>,
    #[serde(rename = "ModifiedOn")]
    modified_on: Option<DateTime<Utc>>,
}

impl HostedRecord for contact::Model {
    const TABLE: &'static str = "contacts";

    fn from_row(row: Value) -> StoreResult<Self> {
        let row: ContactRow = decode(Self::KIND, row)?;
        Ok(contact::Model {
            id: row.id,
            name: row.name_c,
            company: row.company_c.unwrap_or_default(),
            email: row.email_c.unwrap_or_default(),
            phone: row.phone_c.filter(|phone| !phone.trim().is_empty()),
            notes: row.notes_c.unwrap_or_default(),
            tags: row
                .tags_c
                .as_deref()
                .map(contact::parse_tags)
                .unwrap_or_default(),
            created_at: stamp(row.created_on),
            updated_at: stamp(row.modified_on.or(row.created_on)),
        })
    }

    fn draft_row(draft: &contact::Draft) -> Value {
        json!({
            "name_c": draft.name,
            "company_c": draft.company,
            "email_c": draft.email,
            "phone_c": draft.phone,
            "notes_c": draft.notes,
            "tags_c": draft.tags.join(","),
        })
    }

    fn patch_row(patch: &contact::Patch) -> Value {
        let mut row = Map::new();
        set_field(&mut row, "name_c", &patch.name);
        set_field(&mut row, "company_c", &patch.company);
        set_field(&mut row, "email_c", &patch.email);
        set_field(&mut row, "phone_c", &patch.phone);
        set_field(&mut row, "notes_c", &patch.notes);
        set_field(
            &mut row,
            "tags_c",
            &patch.tags.as_ref().map(|tags| tags.join(",")),
        );
        Value::Object(row)
    }
}

#[derive(Deserialize)]
struct ActivityRow {
    #[serde(rename = "Id")]
    id: RecordId,
    type_c: activity::Kind,
    subject_c: Option<String>,
    description_c: Option<String>,
    contact_id_c: Option<RecordId>,
    deal_id_c: Option<RecordId>,
    timestamp_c: Option<DateTime<Utc>>,
    #[serde(rename = "CreatedOn")]
    created_on: Option<DateTime<Utc>>,
}

impl HostedRecord for activity::Model {
    const TABLE: &'static str = "activities";

    fn from_row(row: Value) -> StoreResult<Self> {
        let row: ActivityRow = decode(Self::KIND, row)?;
        Ok(activity::Model {
            id: row.id,
            kind: row.type_c,
            subject: row.subject_c.unwrap_or_default(),
            description: row.description_c.unwrap_or_default(),
            contact_id: row.contact_id_c,
            deal_id: row.deal_id_c,
            occurred_at: stamp(row.timestamp_c.or(row.created_on)),
        })
    }

    fn draft_row(draft: &activity::Draft) -> Value {
        let mut row = json!({
            "type_c": draft.kind,
            "subject_c": draft.subject,
            "description_c": draft.description,
            "contact_id_c": draft.contact_id,
            "deal_id_c": draft.deal_id,
        });
        if let (Some(occurred_at), Value::Object(map)) = (draft.occurred_at, &mut row) {
            map.insert("timestamp_c".into(), json!(occurred_at));
        }
        row
    }

    fn patch_row(patch: &activity::Patch) -> Value {
        let mut row = Map::new();
        set_field(&mut row, "type_c", &patch.kind);
        set_field(&mut row, "subject_c", &patch.subject);
        set_field(&mut row, "description_c", &patch.description);
        set_field(&mut row, "contact_id_c", &patch.contact_id);
        set_field(&mut row, "deal_id_c", &patch.deal_id);
        set_field(&mut row, "timestamp_c", &patch.occurred_at);
        Value::Object(row)
    }
}

#[derive(Deserialize)]
struct StageRow {
    #[serde(rename = "Id")]
    id: StageId,
    name_c: String,
    color_c: Option<String>,
    order_c: i32,
    is_won_c: Option<bool>,
    is_lost_c: Option<bool>,
}

pub fn stage_from_row(row: Value) -> StoreResult<stage::Model> {
    let row: StageRow = decode("stage", row)?;
    let mut model = stage::Model::new(row.id, row.name_c, row.order_c);
    if let Some(color) = row.color_c {
        model.color = color;
    }
    if let Some(is_won) = row.is_won_c {
        model.is_won = is_won;
    }
    if let Some(is_lost) = row.is_lost_c {
        model.is_lost = is_lost;
    }
    Ok(model)
}
