use async_graphql::{Context, Object, Result};
use entity::{RecordId, StageId, activity, contact, deal};
use platform_api::ApiError;
use platform_store::{RecordStore, StageStore, StoreError};
use products_crm::{
    MoveOutcome, PipelineSession,
    activities::{ActivityFilter, count_by_kind, filter_activities, group_by_day},
    contacts::{ContactFilter, ContactSort, query_contacts},
    validation,
};
use tracing::{info, instrument};

use super::{
    GraphqlData, api_error, pipeline_error,
    types::{
        ActivityCountNode, ActivityDayNode, ActivityFilterInput, ActivityInput, ActivityNode,
        ActivityPatchInput, BoardNode, ContactFilterInput, ContactInput, ContactNode,
        ContactPatchInput, ContactSortInput, DealInput, DealNode, DealPatchInput, MetricsNode,
        MoveDealPayload, StageNode,
    },
    validation_error,
};

fn data<'a>(ctx: &Context<'a>) -> Result<&'a GraphqlData> {
    ctx.data::<GraphqlData>()
}

/// `get` that maps a missing record to `None`.
fn found<T>(result: Result<T, StoreError>) -> Result<Option<T>> {
    match result {
        Ok(record) => Ok(Some(record)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(api_error(err)),
    }
}

async fn session(data: &GraphqlData) -> Result<PipelineSession> {
    PipelineSession::load(data.stores.deals.clone(), data.stores.stages.clone())
        .await
        .map(|session| session.with_write_timeout(data.write_timeout))
        .map_err(pipeline_error)
}

#[derive(Default)]
pub struct CrmQuery;

#[Object]
impl CrmQuery {
    /// Pipeline stages in column order.
    #[instrument(name = "graphql.crm.stages", skip_all)]
    async fn stages(&self, ctx: &Context<'_>) -> Result<Vec<StageNode>> {
        let stages = data(ctx)?.stores.stages.list_stages().await.map_err(api_error)?;
        Ok(stages.into_iter().map(Into::into).collect())
    }

    #[instrument(name = "graphql.crm.contacts", skip_all)]
    async fn contacts(
        &self,
        ctx: &Context<'_>,
        filter: Option<ContactFilterInput>,
        sort: Option<ContactSortInput>,
    ) -> Result<Vec<ContactNode>> {
        let contacts = data(ctx)?.stores.contacts.list().await.map_err(api_error)?;
        let filter: ContactFilter = filter.unwrap_or_default().into();
        let sort = sort.map(ContactSort::from).unwrap_or_default();
        Ok(query_contacts(&contacts, &filter, sort)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    #[instrument(name = "graphql.crm.contact", skip(self, ctx))]
    async fn contact(&self, ctx: &Context<'_>, id: RecordId) -> Result<Option<ContactNode>> {
        let contact = found(data(ctx)?.stores.contacts.get(id).await)?;
        Ok(contact.map(Into::into))
    }

    #[instrument(name = "graphql.crm.deals", skip_all)]
    async fn deals(&self, ctx: &Context<'_>) -> Result<Vec<DealNode>> {
        let deals = data(ctx)?.stores.deals.list().await.map_err(api_error)?;
        Ok(deals.into_iter().map(Into::into).collect())
    }

    #[instrument(name = "graphql.crm.deal", skip(self, ctx))]
    async fn deal(&self, ctx: &Context<'_>, id: RecordId) -> Result<Option<DealNode>> {
        let deal = found(data(ctx)?.stores.deals.get(id).await)?;
        Ok(deal.map(Into::into))
    }

    /// Deals grouped into stage columns with per-column totals.
    #[instrument(name = "graphql.crm.pipelineBoard", skip_all)]
    async fn pipeline_board(&self, ctx: &Context<'_>) -> Result<BoardNode> {
        Ok(session(data(ctx)?).await?.board().into())
    }

    #[instrument(name = "graphql.crm.pipelineMetrics", skip_all)]
    async fn pipeline_metrics(&self, ctx: &Context<'_>) -> Result<MetricsNode> {
        let data = data(ctx)?;
        let session = session(data).await?;
        let contacts = data.stores.contacts.list().await.map_err(api_error)?;
        Ok(MetricsNode::new(session.metrics(), contacts.len()))
    }

    /// Newest first.
    #[instrument(name = "graphql.crm.activities", skip_all)]
    async fn activities(
        &self,
        ctx: &Context<'_>,
        filter: Option<ActivityFilterInput>,
    ) -> Result<Vec<ActivityNode>> {
        let stores = &data(ctx)?.stores;
        let (activities, contacts) =
            tokio::try_join!(stores.activities.list(), stores.contacts.list())
                .map_err(api_error)?;
        let filter: ActivityFilter = filter.unwrap_or_default().into();
        Ok(filter_activities(&activities, &contacts, &filter)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Filtered activities bucketed by day, newest day first.
    #[instrument(name = "graphql.crm.activityDays", skip_all)]
    async fn activity_days(
        &self,
        ctx: &Context<'_>,
        filter: Option<ActivityFilterInput>,
    ) -> Result<Vec<ActivityDayNode>> {
        let stores = &data(ctx)?.stores;
        let (activities, contacts) =
            tokio::try_join!(stores.activities.list(), stores.contacts.list())
                .map_err(api_error)?;
        let filter: ActivityFilter = filter.unwrap_or_default().into();
        let matched = filter_activities(&activities, &contacts, &filter);
        Ok(group_by_day(&matched).into_iter().map(Into::into).collect())
    }

    /// One entry per activity kind, zero counts included.
    #[instrument(name = "graphql.crm.activityCounts", skip_all)]
    async fn activity_counts(&self, ctx: &Context<'_>) -> Result<Vec<ActivityCountNode>> {
        let activities = data(ctx)?.stores.activities.list().await.map_err(api_error)?;
        let counts = count_by_kind(&activities);
        Ok(activity::Kind::ALL
            .into_iter()
            .map(|kind| ActivityCountNode {
                kind: kind.into(),
                count: counts.get(&kind).copied().unwrap_or(0),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct CrmMutation;

#[Object]
impl CrmMutation {
    #[instrument(name = "graphql.crm.createContact", skip_all)]
    async fn create_contact(&self, ctx: &Context<'_>, input: ContactInput) -> Result<ContactNode> {
        let draft = contact::Draft::from(input);
        validation::validate_contact(&draft).map_err(validation_error)?;
        let created = data(ctx)?.stores.contacts.create(draft).await.map_err(api_error)?;
        info!(contact_id = created.id, "contact created");
        Ok(created.into())
    }

    #[instrument(name = "graphql.crm.updateContact", skip(self, ctx, input))]
    async fn update_contact(
        &self,
        ctx: &Context<'_>,
        id: RecordId,
        input: ContactPatchInput,
    ) -> Result<ContactNode> {
        let contacts = &data(ctx)?.stores.contacts;
        let existing = contacts.get(id).await.map_err(api_error)?;
        let patch = contact::Patch::from(input);
        validation::validate_contact_update(&existing, &patch).map_err(validation_error)?;
        let updated = contacts.update(id, patch).await.map_err(api_error)?;
        Ok(updated.into())
    }

    #[instrument(name = "graphql.crm.deleteContact", skip(self, ctx))]
    async fn delete_contact(&self, ctx: &Context<'_>, id: RecordId) -> Result<bool> {
        data(ctx)?.stores.contacts.delete(id).await.map_err(api_error)?;
        info!(contact_id = id, "contact deleted");
        Ok(true)
    }

    #[instrument(name = "graphql.crm.createDeal", skip_all)]
    async fn create_deal(&self, ctx: &Context<'_>, input: DealInput) -> Result<DealNode> {
        let stores = &data(ctx)?.stores;
        let draft = deal::Draft::from(input);
        let stages = stores.stages.list_stages().await.map_err(api_error)?;
        validation::validate_deal(&draft, &stages).map_err(validation_error)?;
        let created = stores.deals.create(draft).await.map_err(api_error)?;
        info!(deal_id = created.id, stage = %created.stage, "deal created");
        Ok(created.into())
    }

    #[instrument(name = "graphql.crm.updateDeal", skip(self, ctx, input))]
    async fn update_deal(
        &self,
        ctx: &Context<'_>,
        id: RecordId,
        input: DealPatchInput,
    ) -> Result<DealNode> {
        let stores = &data(ctx)?.stores;
        let (existing, stages) = tokio::try_join!(stores.deals.get(id), stores.stages.list_stages())
            .map_err(api_error)?;
        let patch = deal::Patch::from(input);
        validation::validate_deal_update(&existing, &patch, &stages).map_err(validation_error)?;
        let updated = stores.deals.update(id, patch).await.map_err(api_error)?;
        Ok(updated.into())
    }

    #[instrument(name = "graphql.crm.deleteDeal", skip(self, ctx))]
    async fn delete_deal(&self, ctx: &Context<'_>, id: RecordId) -> Result<bool> {
        data(ctx)?.stores.deals.delete(id).await.map_err(api_error)?;
        info!(deal_id = id, "deal deleted");
        Ok(true)
    }

    /// Move a deal to another pipeline stage and return the refreshed board.
    #[instrument(name = "graphql.crm.moveDeal", skip(self, ctx))]
    async fn move_deal(
        &self,
        ctx: &Context<'_>,
        deal_id: RecordId,
        stage_id: String,
    ) -> Result<MoveDealPayload> {
        let target = StageId::new(stage_id.trim());
        if target.is_blank() {
            return Err(api_error(ApiError::invalid("Stage is required")));
        }
        let mut session = session(data(ctx)?).await?;
        let from_stage = session
            .deal(deal_id)
            .map(|deal| deal.stage.as_str().to_string());
        match session.move_deal(deal_id, &target).await.map_err(pipeline_error)? {
            MoveOutcome::Unchanged => Ok(MoveDealPayload {
                moved: false,
                deal_id,
                from_stage: from_stage.unwrap_or_else(|| target.as_str().to_string()),
                to_stage: target.as_str().to_string(),
                entered_won: false,
                board: session.board().into(),
            }),
            MoveOutcome::Moved(moved) => Ok(MoveDealPayload {
                moved: true,
                deal_id: moved.deal_id,
                from_stage: moved.from.as_str().to_string(),
                to_stage: moved.to.as_str().to_string(),
                entered_won: moved.entered_won,
                board: moved.board.into(),
            }),
        }
    }

    #[instrument(name = "graphql.crm.createActivity", skip_all)]
    async fn create_activity(
        &self,
        ctx: &Context<'_>,
        input: ActivityInput,
    ) -> Result<ActivityNode> {
        let draft = activity::Draft::from(input);
        validation::validate_activity(&draft).map_err(validation_error)?;
        let created = data(ctx)?.stores.activities.create(draft).await.map_err(api_error)?;
        info!(activity_id = created.id, kind = %created.kind, "activity logged");
        Ok(created.into())
    }

    #[instrument(name = "graphql.crm.updateActivity", skip(self, ctx, input))]
    async fn update_activity(
        &self,
        ctx: &Context<'_>,
        id: RecordId,
        input: ActivityPatchInput,
    ) -> Result<ActivityNode> {
        let activities = &data(ctx)?.stores.activities;
        let existing = activities.get(id).await.map_err(api_error)?;
        let patch = activity::Patch::from(input);
        validation::validate_activity_update(&existing, &patch).map_err(validation_error)?;
        let updated = activities.update(id, patch).await.map_err(api_error)?;
        Ok(updated.into())
    }

    #[instrument(name = "graphql.crm.deleteActivity", skip(self, ctx))]
    async fn delete_activity(&self, ctx: &Context<'_>, id: RecordId) -> Result<bool> {
        data(ctx)?.stores.activities.delete(id).await.map_err(api_error)?;
        Ok(true)
    }
}
