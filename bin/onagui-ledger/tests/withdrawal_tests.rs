mod common;

use common::{create_test_state, seed_account};
use onagui_core::services::WithdrawalService;
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::{EntryKind, WithdrawRequest, WithdrawalStatus};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn withdraw_request(user_id: Uuid, amount: i64) -> WithdrawRequest {
    WithdrawRequest {
        user_id,
        amount,
        to_address: "chain:payout-target".into(),
    }
}

async fn mock_submit(server: &MockServer, tx_hash: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/transfers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tx_hash": tx_hash })))
        .mount(server)
        .await;
}

async fn mock_transaction(server: &MockServer, tx_hash: &str, state: &str, confirmations: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/transactions/{}", tx_hash)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tx_hash": tx_hash,
            "state": state,
            "confirmations": confirmations,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn withdrawal_completes_once_confirmed() {
    let chain = MockServer::start().await;
    mock_submit(&chain, "0xw1").await;
    mock_transaction(&chain, "0xw1", "confirmed", 3).await;

    let state = create_test_state(&chain.uri());
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 5_000).await;

    let withdrawal = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();
    assert_eq!(withdrawal.status, WithdrawalStatus::Pending);

    let settled = WithdrawalService::process(&state, withdrawal.id).await.unwrap();
    assert_eq!(settled.status, WithdrawalStatus::Completed);
    assert_eq!(settled.tx_hash.as_deref(), Some("0xw1"));
    assert!(settled.processed_at.is_some());
    assert_eq!(state.store.balance(alice).unwrap(), 3_000);
}

#[tokio::test]
async fn on_chain_failure_reverses_the_reserve() {
    let chain = MockServer::start().await;
    mock_submit(&chain, "0xfail").await;
    mock_transaction(&chain, "0xfail", "failed", 0).await;

    let state = create_test_state(&chain.uri());
    let alice = Uuid::new_v4();
    let account = seed_account(&state, alice, 5_000).await;

    let withdrawal = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();
    let settled = WithdrawalService::process(&state, withdrawal.id).await.unwrap();

    assert_eq!(settled.status, WithdrawalStatus::Failed);
    // Balance is restored through an explicit reversal entry, not an edit.
    assert_eq!(state.store.balance(alice).unwrap(), 5_000);
    let entries = state.store.entries_for_account(account.id).unwrap();
    let reversal_key = format!("reversal:withdrawal:{}", withdrawal.id);
    assert!(entries
        .iter()
        .any(|e| e.idempotency_key.as_deref() == Some(reversal_key.as_str()) && e.delta == 2_000));
}

#[tokio::test]
async fn unconfirmed_withdrawal_stays_processing_until_redriven() {
    let chain = MockServer::start().await;
    mock_submit(&chain, "0xslow").await;

    // One confirmation now, enough on the next poll.
    Mock::given(method("GET"))
        .and(path("/v1/transactions/0xslow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tx_hash": "0xslow", "state": "confirmed", "confirmations": 1,
        })))
        .up_to_n_times(1)
        .mount(&chain)
        .await;

    let state = create_test_state(&chain.uri());
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 5_000).await;

    let withdrawal = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();

    let in_flight = WithdrawalService::process(&state, withdrawal.id).await.unwrap();
    assert_eq!(in_flight.status, WithdrawalStatus::Processing);
    // The reserve stays held while the payout is in flight.
    assert_eq!(state.store.balance(alice).unwrap(), 3_000);

    mock_transaction(&chain, "0xslow", "confirmed", 4).await;
    let settled = WithdrawalService::process(&state, withdrawal.id).await.unwrap();
    assert_eq!(settled.status, WithdrawalStatus::Completed);
    assert_eq!(state.store.balance(alice).unwrap(), 3_000);
}

#[tokio::test]
async fn rejected_submission_fails_and_refunds() {
    let chain = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transfers"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid address" })),
        )
        .mount(&chain)
        .await;

    let state = create_test_state(&chain.uri());
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 5_000).await;

    let withdrawal = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();
    let settled = WithdrawalService::process(&state, withdrawal.id).await.unwrap();

    assert_eq!(settled.status, WithdrawalStatus::Failed);
    assert!(settled.tx_hash.is_none());
    assert_eq!(state.store.balance(alice).unwrap(), 5_000);
}

#[tokio::test]
async fn unavailable_chain_leaves_the_withdrawal_in_flight() {
    let chain = MockServer::start().await;

    // Gateway down for the first attempt only.
    Mock::given(method("POST"))
        .and(path("/v1/transfers"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&chain)
        .await;

    let state = create_test_state(&chain.uri());
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 5_000).await;

    let withdrawal = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();

    let err = WithdrawalService::process(&state, withdrawal.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::Chain(_)));

    // Not failed: the outcome is unknown, so the reserve is kept and the
    // withdrawal waits for a retry.
    let current = state.store.withdrawal(withdrawal.id).unwrap();
    assert_eq!(current.status, WithdrawalStatus::Processing);
    assert_eq!(state.store.balance(alice).unwrap(), 3_000);

    mock_submit(&chain, "0xretry").await;
    mock_transaction(&chain, "0xretry", "confirmed", 3).await;

    let settled = WithdrawalService::process(&state, withdrawal.id).await.unwrap();
    assert_eq!(settled.status, WithdrawalStatus::Completed);
    // Debited exactly once across both attempts.
    assert_eq!(state.store.balance(alice).unwrap(), 3_000);
}

#[tokio::test]
async fn recorded_hash_is_never_rebroadcast() {
    let chain = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/transfers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tx_hash": "0xonce" })))
        .expect(1)
        .mount(&chain)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/transactions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tx_hash": "0xonce", "state": "pending", "confirmations": 0,
        })))
        .mount(&chain)
        .await;

    let state = create_test_state(&chain.uri());
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 5_000).await;

    let withdrawal = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();

    for _ in 0..3 {
        let current = WithdrawalService::process(&state, withdrawal.id).await.unwrap();
        assert_eq!(current.status, WithdrawalStatus::Processing);
    }

    assert_eq!(
        state.store.withdrawal(withdrawal.id).unwrap().tx_hash.as_deref(),
        Some("0xonce")
    );
    // MockServer verifies the expect(1) on drop.
}

#[tokio::test]
async fn second_reserve_loses_when_the_balance_is_spent() {
    let chain = MockServer::start().await;
    mock_submit(&chain, "0xfirst").await;
    mock_transaction(&chain, "0xfirst", "confirmed", 3).await;

    let state = create_test_state(&chain.uri());
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 2_000).await;

    // Both pass the courtesy check against the same balance.
    let first = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();
    let second = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();

    let settled = WithdrawalService::process(&state, first.id).await.unwrap();
    assert_eq!(settled.status, WithdrawalStatus::Completed);
    assert_eq!(state.store.balance(alice).unwrap(), 0);

    // The authoritative check is the reserve debit, so the loser fails
    // cleanly with nothing to reverse.
    let lost = WithdrawalService::process(&state, second.id).await.unwrap();
    assert_eq!(lost.status, WithdrawalStatus::Failed);
    assert_eq!(state.store.balance(alice).unwrap(), 0);
}

#[tokio::test]
async fn pending_withdrawal_can_be_cancelled() {
    let state = create_test_state("http://localhost:1");
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 5_000).await;

    let withdrawal = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();

    let cancelled = WithdrawalService::cancel(&state, withdrawal.id).await.unwrap();
    assert_eq!(cancelled.status, WithdrawalStatus::Cancelled);
    // Nothing was reserved yet.
    assert_eq!(state.store.balance(alice).unwrap(), 5_000);
}

#[tokio::test]
async fn cancel_after_processing_starts_is_rejected() {
    let chain = MockServer::start().await;
    mock_submit(&chain, "0xbusy").await;
    mock_transaction(&chain, "0xbusy", "pending", 0).await;

    let state = create_test_state(&chain.uri());
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 5_000).await;

    let withdrawal = WithdrawalService::request(&state, withdraw_request(alice, 2_000))
        .await
        .unwrap();
    WithdrawalService::process(&state, withdrawal.id).await.unwrap();

    let err = WithdrawalService::cancel(&state, withdrawal.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
    assert_eq!(
        state.store.withdrawal(withdrawal.id).unwrap().status,
        WithdrawalStatus::Processing
    );
}

#[tokio::test]
async fn request_beyond_balance_is_rejected() {
    let state = create_test_state("http://localhost:1");
    let alice = Uuid::new_v4();
    seed_account(&state, alice, 100).await;

    let err = WithdrawalService::request(&state, withdraw_request(alice, 500))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
}
