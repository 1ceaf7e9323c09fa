use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Record, RecordId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Call,
    Email,
    Meeting,
    Note,
    Task,
    Deal,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Call,
        Kind::Email,
        Kind::Meeting,
        Kind::Note,
        Kind::Task,
        Kind::Deal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Call => "call",
            Kind::Email => "email",
            Kind::Meeting => "meeting",
            Kind::Note => "note",
            Kind::Task => "task",
            Kind::Deal => "deal",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown activity kind {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownKind(trimmed.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: RecordId,
    pub kind: Kind,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub kind: Kind,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
    /// Defaults to the creation time.
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub kind: Option<Kind>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub contact_id: Option<Option<RecordId>>,
    pub deal_id: Option<Option<RecordId>>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl Record for Model {
    type Draft = Draft;
    type Patch = Patch;

    const KIND: &'static str = "activity";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: Draft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: draft.kind,
            subject: draft.subject,
            description: draft.description,
            contact_id: draft.contact_id,
            deal_id: draft.deal_id,
            occurred_at: draft.occurred_at.unwrap_or(now),
        }
    }

    // Activities carry no updated-at stamp.
    fn apply_patch(&mut self, patch: Patch, _now: DateTime<Utc>) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(contact_id) = patch.contact_id {
            self.contact_id = contact_id;
        }
        if let Some(deal_id) = patch.deal_id {
            self.deal_id = deal_id;
        }
        if let Some(occurred_at) = patch.occurred_at {
            self.occurred_at = occurred_at;
        }
    }
}
