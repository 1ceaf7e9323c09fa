use std::time::Duration;

use async_graphql::{Request, Response, Value};
use platform_store::memory::MemoryBackend;
use serde_json::{Value as Json, json};

use super::*;

fn schema_for(backend: &MemoryBackend) -> SchemaType {
    build_schema(GraphqlData {
        stores: backend.store_set(),
        write_timeout: Duration::from_secs(2),
    })
}

async fn run(schema: &SchemaType, query: &str) -> Response {
    schema.execute(Request::new(query)).await
}

fn data(response: Response) -> Json {
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data.into_json().unwrap()
}

fn error_code(response: &Response) -> Option<Value> {
    response.errors.first().and_then(|err| {
        err.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned()
    })
}

const MOVE: &str = r#"mutation Move($deal: Int!, $stage: String!) {
    moveDeal(dealId: $deal, stageId: $stage) {
        moved fromStage toStage enteredWon
        board { columns { stage { id } aggregate { count sumCents } } total { count sumCents } }
    }
}"#;

async fn move_deal(schema: &SchemaType, deal: i64, stage: &str) -> Response {
    let vars = async_graphql::Variables::from_json(json!({"deal": deal, "stage": stage}));
    schema.execute(Request::new(MOVE).variables(vars)).await
}

fn column(board: &Json, stage: &str) -> Json {
    board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|column| column["stage"]["id"] == stage)
        .map(|column| column["aggregate"].clone())
        .unwrap()
}

#[tokio::test]
async fn health_query_returns_ok() {
    let schema = schema_for(&MemoryBackend::empty());
    let body = data(run(&schema, "{ health { ok } }").await);
    assert_eq!(body, json!({"health": {"ok": true}}));
}

#[tokio::test]
async fn board_lists_every_stage_in_order() {
    let schema = schema_for(&MemoryBackend::seeded());
    let body = data(
        run(
            &schema,
            "{ pipelineBoard { columns { stage { id } displayTotal } unassigned total { count sumCents } } }",
        )
        .await,
    );
    let board = &body["pipelineBoard"];
    let ids: Vec<_> = board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|column| column["stage"]["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["lead", "qualified", "proposal", "negotiation", "won", "lost"]);
    assert_eq!(board["columns"][2]["displayTotal"], "$45,000");
    assert_eq!(board["unassigned"], json!([]));
    assert_eq!(board["total"], json!({"count": 6, "sumCents": 20_550_000}));
}

#[tokio::test]
async fn move_deal_returns_refreshed_board() {
    let backend = MemoryBackend::seeded();
    let schema = schema_for(&backend);

    let body = data(move_deal(&schema, 2, "won").await);

    let payload = &body["moveDeal"];
    assert_eq!(payload["moved"], true);
    assert_eq!(payload["fromStage"], "lead");
    assert_eq!(payload["toStage"], "won");
    assert_eq!(payload["enteredWon"], true);
    assert_eq!(column(&payload["board"], "lead"), json!({"count": 0, "sumCents": 0}));
    assert_eq!(
        column(&payload["board"], "won"),
        json!({"count": 2, "sumCents": 3_700_000})
    );
    assert_eq!(backend.deals.write_attempts(), 1);
}

#[tokio::test]
async fn move_to_current_stage_is_a_no_op() {
    let backend = MemoryBackend::seeded();
    let schema = schema_for(&backend);

    let body = data(move_deal(&schema, 2, "lead").await);

    assert_eq!(body["moveDeal"]["moved"], false);
    assert_eq!(body["moveDeal"]["enteredWon"], false);
    assert_eq!(backend.deals.write_attempts(), 0);
}

#[tokio::test]
async fn unknown_stage_is_rejected() {
    let backend = MemoryBackend::seeded();
    let schema = schema_for(&backend);

    let response = move_deal(&schema, 2, "archived").await;

    assert_eq!(error_code(&response), Some(Value::from("TRANSITION_REJECTED")));
    let response = move_deal(&schema, 404, "won").await;
    assert_eq!(error_code(&response), Some(Value::from("TRANSITION_REJECTED")));
    assert_eq!(backend.deals.write_attempts(), 0);
}

#[tokio::test]
async fn failed_write_reports_persistence_failure() {
    let backend = MemoryBackend::seeded();
    let schema = schema_for(&backend);
    backend.deals.fail_writes(true);

    let response = move_deal(&schema, 2, "won").await;

    assert_eq!(error_code(&response), Some(Value::from("PERSISTENCE_FAILED")));
    backend.deals.fail_writes(false);
    let body = data(run(&schema, "{ deal(id: 2) { stageId } }").await);
    assert_eq!(body["deal"]["stageId"], "lead");
}

#[tokio::test]
async fn create_contact_reports_every_validation_message() {
    let schema = schema_for(&MemoryBackend::empty());

    let response = run(
        &schema,
        r#"mutation { createContact(input: { name: " ", company: "", email: "nope" }) { id } }"#,
    )
    .await;

    assert_eq!(error_code(&response), Some(Value::from("INVALID_INPUT")));
    let messages = response.errors[0]
        .extensions
        .as_ref()
        .and_then(|ext| ext.get("messages"))
        .cloned()
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(
        messages,
        json!([
            "Name is required",
            "Company is required",
            "Please enter a valid email address"
        ])
    );
}

#[tokio::test]
async fn created_records_are_queryable() {
    let schema = schema_for(&MemoryBackend::seeded());

    let body = data(
        run(
            &schema,
            r#"mutation {
                createContact(input: { name: "Ada Lovelace", company: "Engines", email: "ada@engines.test", phone: "5550001111", tags: "vip, math" }) {
                    id initials displayPhone tags
                }
            }"#,
        )
        .await,
    );
    let contact = &body["createContact"];
    assert_eq!(contact["id"], 5);
    assert_eq!(contact["initials"], "AL");
    assert_eq!(contact["displayPhone"], "(555) 000-1111");
    assert_eq!(contact["tags"], json!(["vip", "math"]));

    let body = data(
        run(
            &schema,
            r#"mutation {
                createDeal(input: { title: "Engine order", valueCents: 150000, stageId: "qualified", contactId: 5 }) {
                    id stageId displayValue probability
                }
            }"#,
        )
        .await,
    );
    assert_eq!(
        body["createDeal"],
        json!({"id": 7, "stageId": "qualified", "displayValue": "$1,500", "probability": 50})
    );

    let body = data(
        run(
            &schema,
            r#"{ contacts(filter: { search: "engines" }) { name } }"#,
        )
        .await,
    );
    assert_eq!(body["contacts"], json!([{"name": "Ada Lovelace"}]));
}

#[tokio::test]
async fn deal_with_unknown_stage_is_invalid() {
    let schema = schema_for(&MemoryBackend::seeded());

    let response = run(
        &schema,
        r#"mutation { createDeal(input: { title: "X", stageId: "limbo", contactId: 1, probability: 140 }) { id } }"#,
    )
    .await;

    assert_eq!(error_code(&response), Some(Value::from("INVALID_INPUT")));
}

#[tokio::test]
async fn missing_records_resolve_to_null_but_deletes_fail() {
    let schema = schema_for(&MemoryBackend::seeded());

    let body = data(run(&schema, "{ contact(id: 99) { id } }").await);
    assert_eq!(body["contact"], Json::Null);

    let response = run(&schema, "mutation { deleteDeal(id: 99) }").await;
    assert_eq!(error_code(&response), Some(Value::from("NOT_FOUND")));
}

#[tokio::test]
async fn activity_counts_cover_every_kind() {
    let schema = schema_for(&MemoryBackend::seeded());

    let body = data(run(&schema, "{ activityCounts { kind count } }").await);

    let counts = body["activityCounts"].as_array().unwrap();
    assert_eq!(counts.len(), 6);
    assert_eq!(counts[0]["kind"], "CALL");
}

#[tokio::test]
async fn metrics_exclude_closed_deals_from_open_value() {
    let schema = schema_for(&MemoryBackend::seeded());

    let body = data(
        run(
            &schema,
            "{ pipelineMetrics { totalDeals activeDeals openValueCents wonDeals winRatePercent contactCount } }",
        )
        .await,
    );

    assert_eq!(
        body["pipelineMetrics"],
        json!({
            "totalDeals": 6,
            "activeDeals": 4,
            "openValueCents": 15_050_000,
            "wonDeals": 1,
            "winRatePercent": 17,
            "contactCount": 4
        })
    );
}

#[test]
fn inconsistent_board_is_reported_as_internal() {
    let err = pipeline_error(PipelineError::AggregateInconsistency {
        stage: entity::StageId::from("won"),
    });
    assert_eq!(err.message, "internal server error");
    assert_eq!(
        err.extensions.as_ref().and_then(|ext| ext.get("code")).cloned(),
        Some(Value::from("INTERNAL"))
    );
}
