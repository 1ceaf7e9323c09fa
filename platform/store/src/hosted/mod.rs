//! Hosted record API backend.
//!
//! The API speaks in `_c` suffixed field names and wraps every payload in a
//! `{ success, data, message }` envelope. [`adapters`] owns the mapping
//! between those rows and the normalized records.

pub mod adapters;

use std::{marker::PhantomData, sync::Arc, time::Duration};

use async_trait::async_trait;
use entity::{Record, RecordId, StageId, activity, contact, deal, stage};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{DealStore, RecordStore, StageStore, StoreError, StoreResult, StoreSet};

pub use adapters::HostedRecord;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostedConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl HostedConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Value,
    message: Option<String>,
}

/// Thin JSON client shared by every hosted table.
#[derive(Clone, Debug)]
pub struct HostedClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HostedClient {
    pub fn new(config: &HostedConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, table: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/tables/{}/records/{}", self.base_url, table, id),
            None => format!("{}/tables/{}/records", self.base_url, table),
        }
    }

    async fn send(
        &self,
        method: Method,
        table: &'static str,
        id: Option<&str>,
        body: Option<Value>,
    ) -> StoreResult<Value> {
        let url = self.url(table, id);
        debug!(%method, %url, "hosted store request");
        let mut request = self.http.request(method, &url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(table, id.unwrap_or("*")));
        }
        let envelope: Envelope = response
            .json()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))?;
        if !status.is_success() || !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("request failed with status {}", status));
            warn!(%url, %status, %message, "hosted store rejected request");
            return Err(StoreError::Rejected(message));
        }
        Ok(envelope.data)
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Transport(err.to_string())
    }
}

pub struct HostedTable<T> {
    client: HostedClient,
    _record: PhantomData<fn() -> T>,
}

impl<T: HostedRecord> HostedTable<T> {
    pub fn new(client: HostedClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<T: HostedRecord> RecordStore<T> for HostedTable<T> {
    async fn list(&self) -> StoreResult<Vec<T>> {
        let data = self.client.send(Method::GET, T::TABLE, None, None).await?;
        let rows = match data {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => {
                return Err(StoreError::Decode(format!(
                    "expected a list of {} rows, got {}",
                    T::KIND,
                    other
                )));
            }
        };
        rows.into_iter().map(T::from_row).collect()
    }

    async fn get(&self, id: RecordId) -> StoreResult<T> {
        let key = id.to_string();
        let data = self
            .client
            .send(Method::GET, T::TABLE, Some(&key), None)
            .await?;
        if data.is_null() {
            return Err(StoreError::not_found(T::KIND, id));
        }
        T::from_row(data)
    }

    async fn create(&self, draft: T::Draft) -> StoreResult<T> {
        let body = T::draft_row(&draft);
        let data = self
            .client
            .send(Method::POST, T::TABLE, None, Some(body))
            .await?;
        T::from_row(data)
    }

    async fn update(&self, id: RecordId, patch: T::Patch) -> StoreResult<T> {
        let key = id.to_string();
        let body = T::patch_row(&patch);
        let data = self
            .client
            .send(Method::PATCH, T::TABLE, Some(&key), Some(body))
            .await?;
        T::from_row(data)
    }

    async fn delete(&self, id: RecordId) -> StoreResult<()> {
        let key = id.to_string();
        self.client
            .send(Method::DELETE, T::TABLE, Some(&key), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DealStore for HostedTable<deal::Model> {
    async fn set_deal_stage(&self, id: RecordId, stage: StageId) -> StoreResult<deal::Model> {
        self.update(id, deal::Patch::stage_only(stage)).await
    }
}

pub struct HostedStages {
    client: HostedClient,
}

impl HostedStages {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StageStore for HostedStages {
    async fn list_stages(&self) -> StoreResult<Vec<stage::Model>> {
        let data = self
            .client
            .send(Method::GET, adapters::STAGE_TABLE, None, None)
            .await?;
        let rows: Vec<Value> = match data {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => {
                return Err(StoreError::Decode(format!(
                    "expected a list of stage rows, got {}",
                    other
                )));
            }
        };
        let mut stages = rows
            .into_iter()
            .map(adapters::stage_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        stage::sort_for_display(&mut stages);
        Ok(stages)
    }
}

/// Stores backed by the hosted record API.
pub struct HostedBackend;

impl HostedBackend {
    pub fn store_set(config: &HostedConfig) -> StoreResult<StoreSet> {
        let client = HostedClient::new(config)?;
        Ok(StoreSet {
            contacts: Arc::new(HostedTable::<contact::Model>::new(client.clone())),
            deals: Arc::new(HostedTable::<deal::Model>::new(client.clone())),
            stages: Arc::new(HostedStages::new(client.clone())),
            activities: Arc::new(HostedTable::<activity::Model>::new(client)),
        })
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> HostedClient {
        let mut config = HostedConfig::new(server.url());
        config.api_key = Some("secret".into());
        HostedClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn lists_and_normalizes_deal_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tables/deals/records")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "data": [
                        {"Id": 1, "title_c": "Pilot", "value_c": 1500.5, "stage_c": "lead", "contact_id_c": 3},
                        {"Id": 2, "title_c": "Renewal", "value_c": null, "stage_c": 4}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let table = HostedTable::<deal::Model>::new(client_for(&server));
        let deals = table.list().await.unwrap();
        mock.assert_async().await;
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].value_cents, Some(150_050));
        assert_eq!(deals[0].contact_id, Some(3));
        assert_eq!(deals[1].value_cents, None);
        assert_eq!(deals[1].stage, StageId::from(4));
        assert_eq!(deals[1].probability, deal::DEFAULT_PROBABILITY);
    }

    #[tokio::test]
    async fn stage_write_sends_only_the_stage_field() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/tables/deals/records/7")
            .match_body(Matcher::Json(json!({"stage_c": "won"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "data": {"Id": 7, "title_c": "Pilot", "value_c": 10, "stage_c": "won"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let table = HostedTable::<deal::Model>::new(client_for(&server));
        let updated = table.set_deal_stage(7, StageId::from("won")).await.unwrap();
        mock.assert_async().await;
        assert_eq!(updated.stage, StageId::from("won"));
    }

    #[tokio::test]
    async fn unsuccessful_envelopes_are_rejections() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/tables/contacts/records/2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"success": false, "message": "locked"}).to_string())
            .create_async()
            .await;

        let table = HostedTable::<contact::Model>::new(client_for(&server));
        let err = table.delete(2).await.unwrap_err();
        assert_eq!(err, StoreError::Rejected("locked".into()));
    }

    #[tokio::test]
    async fn missing_records_map_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tables/activities/records/9")
            .with_status(404)
            .create_async()
            .await;

        let table = HostedTable::<activity::Model>::new(client_for(&server));
        assert!(table.get(9).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn stages_are_sorted_and_flagged() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tables/stages/records")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "data": [
                        {"Id": "won", "name_c": "Won", "order_c": 2},
                        {"Id": "lead", "name_c": "Lead", "order_c": 1, "color_c": "#999"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let stages = HostedStages::new(client_for(&server));
        let listed = stages.list_stages().await.unwrap();
        assert_eq!(listed[0].id.as_str(), "lead");
        assert_eq!(listed[0].color, "#999");
        assert!(listed[1].is_won);
    }
}
