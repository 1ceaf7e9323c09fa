mod crm;
mod types;

use std::time::Duration;

use async_graphql::{
    EmptySubscription, Error, ErrorExtensions, MergedObject, Object, Schema, SimpleObject,
};
use platform_api::{ApiError, internal_error};
use platform_store::StoreSet;
use products_crm::{PipelineError, ValidationErrors};
use serde::Serialize;
use tracing::instrument;

pub use crm::{CrmMutation, CrmQuery};

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Shared per-schema context.
#[derive(Clone, Debug)]
pub struct GraphqlData {
    pub stores: StoreSet,
    pub write_timeout: Duration,
}

pub fn build_schema(data: GraphqlData) -> SchemaType {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(data)
        .finish()
}

#[derive(MergedObject, Default)]
pub struct QueryRoot(ServiceQuery, CrmQuery);

#[derive(MergedObject, Default)]
pub struct MutationRoot(CrmMutation);

#[derive(Default)]
pub struct ServiceQuery;

#[Object]
impl ServiceQuery {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self) -> HealthPayload {
        HealthPayload { ok: true }
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
}

pub(crate) fn api_error(err: impl Into<ApiError>) -> Error {
    err.into().extend()
}

pub(crate) fn validation_error(err: ValidationErrors) -> Error {
    ApiError::InvalidInput(err.messages).extend()
}

pub(crate) fn pipeline_error(err: PipelineError) -> Error {
    let api = match err {
        PipelineError::TransitionRejected(reason) => {
            ApiError::TransitionRejected(reason.to_string())
        }
        PipelineError::PersistenceFailed(source) => ApiError::PersistenceFailed(source.to_string()),
        PipelineError::Load(source) => source.into(),
        inconsistent @ PipelineError::AggregateInconsistency { .. } => {
            return internal_error(inconsistent);
        }
    };
    api.extend()
}

#[cfg(test)]
mod tests;
