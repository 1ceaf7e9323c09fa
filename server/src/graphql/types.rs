use async_graphql::{Enum, InputObject, MaybeUndefined, SimpleObject};
use chrono::{DateTime, NaiveDate, Utc};
use entity::{RecordId, StageId, activity, contact, deal, stage};
use products_crm::{
    PipelineBoard, PipelineMetrics, StageAggregate, StageColumn,
    activities::{ActivityDay, ActivityFilter},
    contacts::{self, ContactFilter, ContactSort},
    format,
};

fn tri_state<T>(value: MaybeUndefined<T>) -> Option<Option<T>> {
    match value {
        MaybeUndefined::Undefined => None,
        MaybeUndefined::Null => Some(None),
        MaybeUndefined::Value(value) => Some(Some(value)),
    }
}

/// Out-of-range values become 255 so validation reports them.
fn probability(value: i32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

#[derive(Clone, Debug, SimpleObject)]
pub struct StageNode {
    pub id: String,
    pub name: String,
    pub color: String,
    pub sort_order: i32,
    pub is_won: bool,
    pub is_lost: bool,
}

impl From<stage::Model> for StageNode {
    fn from(stage: stage::Model) -> Self {
        Self {
            id: stage.id.as_str().to_string(),
            name: stage.name,
            color: stage.color,
            sort_order: stage.sort_order,
            is_won: stage.is_won,
            is_lost: stage.is_lost,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ContactNode {
    pub id: RecordId,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: Option<String>,
    pub display_phone: Option<String>,
    pub initials: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<contact::Model> for ContactNode {
    fn from(contact: contact::Model) -> Self {
        Self {
            id: contact.id,
            display_phone: contact.phone.as_deref().map(format::format_phone),
            initials: format::initials(&contact.name),
            name: contact.name,
            company: contact.company,
            email: contact.email,
            phone: contact.phone,
            notes: contact.notes,
            tags: contact.tags,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DealNode {
    pub id: RecordId,
    pub title: String,
    pub value_cents: Option<i64>,
    pub display_value: String,
    pub stage_id: String,
    pub contact_id: Option<RecordId>,
    pub notes: String,
    pub close_date: Option<NaiveDate>,
    pub probability: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<deal::Model> for DealNode {
    fn from(deal: deal::Model) -> Self {
        Self {
            id: deal.id,
            display_value: format::format_currency(deal.value_cents),
            title: deal.title,
            value_cents: deal.value_cents,
            stage_id: deal.stage.as_str().to_string(),
            contact_id: deal.contact_id,
            notes: deal.notes,
            close_date: deal.close_date,
            probability: i32::from(deal.probability),
            created_at: deal.created_at,
            updated_at: deal.updated_at,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum ActivityKind {
    Call,
    Email,
    Meeting,
    Note,
    Task,
    Deal,
}

impl From<activity::Kind> for ActivityKind {
    fn from(kind: activity::Kind) -> Self {
        match kind {
            activity::Kind::Call => ActivityKind::Call,
            activity::Kind::Email => ActivityKind::Email,
            activity::Kind::Meeting => ActivityKind::Meeting,
            activity::Kind::Note => ActivityKind::Note,
            activity::Kind::Task => ActivityKind::Task,
            activity::Kind::Deal => ActivityKind::Deal,
        }
    }
}

impl From<ActivityKind> for activity::Kind {
    fn from(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::Call => activity::Kind::Call,
            ActivityKind::Email => activity::Kind::Email,
            ActivityKind::Meeting => activity::Kind::Meeting,
            ActivityKind::Note => activity::Kind::Note,
            ActivityKind::Task => activity::Kind::Task,
            ActivityKind::Deal => activity::Kind::Deal,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ActivityNode {
    pub id: RecordId,
    pub kind: ActivityKind,
    pub subject: String,
    pub description: String,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
    pub occurred_at: DateTime<Utc>,
}

impl From<activity::Model> for ActivityNode {
    fn from(activity: activity::Model) -> Self {
        Self {
            id: activity.id,
            kind: activity.kind.into(),
            subject: activity.subject,
            description: activity.description,
            contact_id: activity.contact_id,
            deal_id: activity.deal_id,
            occurred_at: activity.occurred_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ActivityDayNode {
    pub date: NaiveDate,
    pub activities: Vec<ActivityNode>,
}

impl From<ActivityDay> for ActivityDayNode {
    fn from(day: ActivityDay) -> Self {
        Self {
            date: day.date,
            activities: day.activities.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ActivityCountNode {
    pub kind: ActivityKind,
    pub count: usize,
}

#[derive(Clone, Copy, Debug, SimpleObject)]
pub struct AggregateNode {
    pub count: usize,
    pub sum_cents: i64,
}

impl From<StageAggregate> for AggregateNode {
    fn from(aggregate: StageAggregate) -> Self {
        Self {
            count: aggregate.count,
            sum_cents: aggregate.sum_cents,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ColumnNode {
    pub stage: StageNode,
    pub deals: Vec<DealNode>,
    pub aggregate: AggregateNode,
    pub display_total: String,
}

impl From<StageColumn> for ColumnNode {
    fn from(column: StageColumn) -> Self {
        Self {
            display_total: format::format_currency(Some(column.aggregate.sum_cents)),
            stage: column.stage.into(),
            deals: column.deals.into_iter().map(Into::into).collect(),
            aggregate: column.aggregate.into(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct BoardNode {
    pub columns: Vec<ColumnNode>,
    /// Deals referencing a stage that no longer exists.
    pub unassigned: Vec<RecordId>,
    pub total: AggregateNode,
}

impl From<PipelineBoard> for BoardNode {
    fn from(board: PipelineBoard) -> Self {
        Self {
            columns: board.columns.into_iter().map(Into::into).collect(),
            unassigned: board.unassigned,
            total: board.total.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, SimpleObject)]
pub struct MetricsNode {
    pub total_deals: usize,
    pub active_deals: usize,
    pub open_value_cents: i64,
    pub average_open_cents: i64,
    pub won_deals: usize,
    pub won_value_cents: i64,
    pub win_rate_percent: u32,
    pub contact_count: usize,
}

impl MetricsNode {
    pub fn new(metrics: PipelineMetrics, contact_count: usize) -> Self {
        Self {
            total_deals: metrics.total_deals,
            active_deals: metrics.active_deals,
            open_value_cents: metrics.open_value_cents,
            average_open_cents: metrics.average_open_cents,
            won_deals: metrics.won_deals,
            won_value_cents: metrics.won_value_cents,
            win_rate_percent: metrics.win_rate_percent,
            contact_count,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct MoveDealPayload {
    /// False when the deal already sat in the target stage.
    pub moved: bool,
    pub deal_id: RecordId,
    pub from_stage: String,
    pub to_stage: String,
    pub entered_won: bool,
    pub board: BoardNode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum ContactSortField {
    Name,
    Company,
    Email,
    UpdatedAt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, Default, InputObject)]
pub struct ContactFilterInput {
    pub search: Option<String>,
    pub company: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<ContactFilterInput> for ContactFilter {
    fn from(input: ContactFilterInput) -> Self {
        Self {
            search: input.search,
            company: input.company,
            tags: input.tags.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Copy, Debug, InputObject)]
pub struct ContactSortInput {
    pub field: ContactSortField,
    #[graphql(default_with = "SortDirection::Asc")]
    pub direction: SortDirection,
}

impl From<ContactSortInput> for ContactSort {
    fn from(input: ContactSortInput) -> Self {
        Self {
            field: match input.field {
                ContactSortField::Name => contacts::ContactSortField::Name,
                ContactSortField::Company => contacts::ContactSortField::Company,
                ContactSortField::Email => contacts::ContactSortField::Email,
                ContactSortField::UpdatedAt => contacts::ContactSortField::UpdatedAt,
            },
            direction: match input.direction {
                SortDirection::Asc => contacts::SortDirection::Asc,
                SortDirection::Desc => contacts::SortDirection::Desc,
            },
        }
    }
}

#[derive(Clone, Debug, Default, InputObject)]
pub struct ActivityFilterInput {
    pub search: Option<String>,
    pub kind: Option<ActivityKind>,
    pub contact: Option<String>,
}

impl From<ActivityFilterInput> for ActivityFilter {
    fn from(input: ActivityFilterInput) -> Self {
        Self {
            search: input.search,
            kind: input.kind.map(Into::into),
            contact: input.contact,
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct ContactInput {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: Option<String>,
    #[graphql(default)]
    pub notes: String,
    /// Comma separated, as typed into the form.
    #[graphql(default)]
    pub tags: String,
}

impl From<ContactInput> for contact::Draft {
    fn from(input: ContactInput) -> Self {
        Self {
            name: input.name.trim().to_string(),
            company: input.company.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.filter(|phone| !phone.trim().is_empty()),
            notes: input.notes,
            tags: contact::parse_tags(&input.tags),
        }
    }
}

#[derive(Clone, Debug, Default, InputObject)]
pub struct ContactPatchInput {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: MaybeUndefined<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
}

impl From<ContactPatchInput> for contact::Patch {
    fn from(input: ContactPatchInput) -> Self {
        Self {
            name: input.name.map(|name| name.trim().to_string()),
            company: input.company.map(|company| company.trim().to_string()),
            email: input.email.map(|email| email.trim().to_string()),
            phone: tri_state(input.phone),
            notes: input.notes,
            tags: input.tags.as_deref().map(contact::parse_tags),
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct DealInput {
    pub title: String,
    pub value_cents: Option<i64>,
    pub stage_id: String,
    pub contact_id: Option<RecordId>,
    #[graphql(default)]
    pub notes: String,
    pub close_date: Option<NaiveDate>,
    #[graphql(default = 50)]
    pub probability: i32,
}

impl From<DealInput> for deal::Draft {
    fn from(input: DealInput) -> Self {
        Self {
            title: input.title.trim().to_string(),
            value_cents: input.value_cents,
            stage: StageId::new(input.stage_id.trim()),
            contact_id: input.contact_id,
            notes: input.notes,
            close_date: input.close_date,
            probability: probability(input.probability),
        }
    }
}

#[derive(Clone, Debug, Default, InputObject)]
pub struct DealPatchInput {
    pub title: Option<String>,
    pub value_cents: MaybeUndefined<i64>,
    pub stage_id: Option<String>,
    pub contact_id: MaybeUndefined<RecordId>,
    pub notes: Option<String>,
    pub close_date: MaybeUndefined<NaiveDate>,
    pub probability: Option<i32>,
}

impl From<DealPatchInput> for deal::Patch {
    fn from(input: DealPatchInput) -> Self {
        Self {
            title: input.title.map(|title| title.trim().to_string()),
            value_cents: tri_state(input.value_cents),
            stage: input.stage_id.map(|id| StageId::new(id.trim())),
            contact_id: tri_state(input.contact_id),
            notes: input.notes,
            close_date: tri_state(input.close_date),
            probability: input.probability.map(probability),
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct ActivityInput {
    pub kind: ActivityKind,
    pub subject: String,
    #[graphql(default)]
    pub description: String,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl From<ActivityInput> for activity::Draft {
    fn from(input: ActivityInput) -> Self {
        Self {
            kind: input.kind.into(),
            subject: input.subject.trim().to_string(),
            description: input.description,
            contact_id: input.contact_id,
            deal_id: input.deal_id,
            occurred_at: input.occurred_at,
        }
    }
}

#[derive(Clone, Debug, Default, InputObject)]
pub struct ActivityPatchInput {
    pub kind: Option<ActivityKind>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub contact_id: MaybeUndefined<RecordId>,
    pub deal_id: MaybeUndefined<RecordId>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl From<ActivityPatchInput> for activity::Patch {
    fn from(input: ActivityPatchInput) -> Self {
        Self {
            kind: input.kind.map(Into::into),
            subject: input.subject.map(|subject| subject.trim().to_string()),
            description: input.description,
            contact_id: tri_state(input.contact_id),
            deal_id: tri_state(input.deal_id),
            occurred_at: input.occurred_at,
        }
    }
}
