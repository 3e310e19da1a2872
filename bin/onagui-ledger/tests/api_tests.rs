mod common;

use axum_test::TestServer;
use common::{create_test_app, create_test_state, create_test_state_with_rate_limit, seed_account};
use http::StatusCode;
use serde_json::{json, Value};
use serial_test::serial;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_server(state: std::sync::Arc<onagui_core::app_state::AppState>) -> TestServer {
    TestServer::new(create_test_app(state)).expect("failed to start test server")
}

#[tokio::test]
#[serial]
async fn health_endpoint_reports_ok() {
    let server = test_server(create_test_state("http://localhost:1"));

    let response = server.get("/api/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["status"].as_str().unwrap().starts_with("200"));
}

#[tokio::test]
#[serial]
async fn account_lifecycle_over_http() {
    let state = create_test_state("http://localhost:1");
    let server = test_server(state);
    let user_id = Uuid::new_v4();

    let response = server
        .post("/api/accounts")
        .json(&json!({ "user_id": user_id }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["balance"].as_i64(), Some(0));
    let account_id = body["account_id"].as_str().unwrap().to_string();

    // Opening again returns the same account.
    let response = server
        .post("/api/accounts")
        .json(&json!({ "user_id": user_id }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["account_id"].as_str().unwrap(), account_id);

    let response = server
        .get(&format!("/api/accounts/{}/balance", user_id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["balance"].as_i64(), Some(0));
}

#[tokio::test]
#[serial]
async fn balance_of_unknown_user_is_404() {
    let server = test_server(create_test_state("http://localhost:1"));

    let response = server
        .get(&format!("/api/accounts/{}/balance", Uuid::new_v4()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"].as_str(), Some("invalid user"));
}

#[tokio::test]
#[serial]
async fn deposits_and_duplicates_over_http() {
    let state = create_test_state("http://localhost:1");
    let server = test_server(state.clone());
    let user_id = Uuid::new_v4();
    seed_account(&state, user_id, 0).await;

    let deposit = json!({
        "user_id": user_id,
        "amount": 1_500,
        "tx_hash": "0xhttpdep",
        "from_address": "chain:sender",
        "to_address": "chain:treasury",
    });

    let response = server.post("/api/deposits").json(&deposit).await;
    response.assert_status_ok();

    let response = server.post("/api/deposits").json(&deposit).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"].as_str(), Some("duplicate deposit"));

    let response = server
        .get(&format!("/api/accounts/{}/balance", user_id))
        .await;
    let body: Value = response.json();
    assert_eq!(body["balance"].as_i64(), Some(1_500));
}

#[tokio::test]
#[serial]
async fn transfer_and_replay_over_http() {
    let state = create_test_state("http://localhost:1");
    let server = test_server(state.clone());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_account(&state, alice, 10_000).await;
    seed_account(&state, bob, 0).await;

    let transfer = json!({
        "from_user_id": alice,
        "to_user_id": bob,
        "amount": 3_000,
        "idempotency_key": "http-transfer-key-1",
    });

    let response = server.post("/api/transfers").json(&transfer).await;
    response.assert_status_ok();
    let first: Value = response.json();
    assert_eq!(first["replayed"].as_bool(), Some(false));
    assert_eq!(first["entries"].as_array().unwrap().len(), 2);

    let response = server.post("/api/transfers").json(&transfer).await;
    response.assert_status_ok();
    let second: Value = response.json();
    assert_eq!(second["replayed"].as_bool(), Some(true));
    assert_eq!(second["reference"], first["reference"]);

    let response = server
        .get(&format!("/api/accounts/{}/balance", alice))
        .await;
    let body: Value = response.json();
    assert_eq!(body["balance"].as_i64(), Some(7_000));
}

#[tokio::test]
#[serial]
async fn transfer_error_statuses() {
    let state = create_test_state("http://localhost:1");
    let server = test_server(state.clone());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_account(&state, alice, 100).await;
    seed_account(&state, bob, 0).await;

    // Overdraw.
    let response = server
        .post("/api/transfers")
        .json(&json!({
            "from_user_id": alice,
            "to_user_id": bob,
            "amount": 500,
            "idempotency_key": "http-overdraw-key",
        }))
        .await;
    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: Value = response.json();
    assert_eq!(body["error"].as_str(), Some("insufficient funds"));

    // Self transfer.
    let response = server
        .post("/api/transfers")
        .json(&json!({
            "from_user_id": alice,
            "to_user_id": alice,
            "amount": 50,
            "idempotency_key": "http-self-key-1",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Key too short for the validator.
    let response = server
        .post("/api/transfers")
        .json(&json!({
            "from_user_id": alice,
            "to_user_id": bob,
            "amount": 50,
            "idempotency_key": "short",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Unknown recipient.
    let response = server
        .post("/api/transfers")
        .json(&json!({
            "from_user_id": alice,
            "to_user_id": Uuid::new_v4(),
            "amount": 50,
            "idempotency_key": "http-ghost-key-1",
        }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn rate_limit_surfaces_as_429() {
    let state =
        create_test_state_with_rate_limit("http://localhost:1", 2, Duration::from_secs(60));
    let server = test_server(state.clone());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_account(&state, alice, 10_000).await;
    seed_account(&state, bob, 0).await;

    for i in 0..2 {
        let response = server
            .post("/api/transfers")
            .json(&json!({
                "from_user_id": alice,
                "to_user_id": bob,
                "amount": 100,
                "idempotency_key": format!("http-limited-key-{}", i),
            }))
            .await;
        response.assert_status_ok();
    }

    let response = server
        .post("/api/transfers")
        .json(&json!({
            "from_user_id": alice,
            "to_user_id": bob,
            "amount": 100,
            "idempotency_key": "http-limited-key-over",
        }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["error"].as_str(), Some("rate limit exceeded"));
}

#[tokio::test]
#[serial]
async fn entries_and_reconciliation_agree() {
    let state = create_test_state("http://localhost:1");
    let server = test_server(state.clone());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_account(&state, alice, 5_000).await;
    seed_account(&state, bob, 0).await;

    server
        .post("/api/transfers")
        .json(&json!({
            "from_user_id": alice,
            "to_user_id": bob,
            "amount": 1_200,
            "idempotency_key": "http-recon-key-1",
        }))
        .await
        .assert_status_ok();

    let response = server
        .get(&format!("/api/accounts/{}/entries", alice))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2); // seed deposit + debit
    let sum: i64 = entries.iter().map(|e| e["delta"].as_i64().unwrap()).sum();
    assert_eq!(sum, 3_800);

    let response = server
        .get(&format!("/api/accounts/{}/reconciliation", alice))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["consistent"].as_bool(), Some(true));
    assert_eq!(body["balance"].as_i64(), Some(3_800));
    assert_eq!(body["entry_sum"].as_i64(), Some(3_800));
}

#[tokio::test]
#[serial]
async fn withdrawal_over_http_settles() {
    let chain = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transfers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tx_hash": "0xhttpw" })))
        .mount(&chain)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/transactions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tx_hash": "0xhttpw", "state": "confirmed", "confirmations": 5,
        })))
        .mount(&chain)
        .await;

    let state = create_test_state(&chain.uri());
    let server = test_server(state.clone());
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 5_000).await;

    let response = server
        .post("/api/withdrawals")
        .json(&json!({
            "user_id": alice,
            "amount": 2_000,
            "to_address": "chain:payout-target",
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"].as_str(), Some("pending"));
    let withdrawal_id = body["id"].as_str().unwrap().to_string();

    // The drive runs in the background; poll until it settles.
    let mut settled = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let response = server
            .get(&format!("/api/withdrawals/{}", withdrawal_id))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        if body["status"].as_str() == Some("completed") {
            settled = Some(body);
            break;
        }
    }

    let settled = settled.expect("withdrawal never settled");
    assert_eq!(settled["tx_hash"].as_str(), Some("0xhttpw"));
    assert!(settled["processed_at"].as_str().is_some());

    let response = server
        .get(&format!("/api/accounts/{}/balance", alice))
        .await;
    let body: Value = response.json();
    assert_eq!(body["balance"].as_i64(), Some(3_000));
}

#[tokio::test]
#[serial]
async fn unknown_withdrawal_is_404() {
    let server = test_server(create_test_state("http://localhost:1"));

    let response = server
        .get(&format!("/api/withdrawals/{}", Uuid::new_v4()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .post(&format!("/api/withdrawals/{}/cancel", Uuid::new_v4()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
