mod common;

use common::{create_test_state_with_rate_limit, seed_account};
use onagui_core::services::TransferService;
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::TransferRequest;
use std::time::Duration;
use uuid::Uuid;

fn transfer_request(from: Uuid, to: Uuid, amount: i64, key: String) -> TransferRequest {
    TransferRequest {
        from_user_id: from,
        to_user_id: to,
        amount,
        idempotency_key: key,
        description: None,
    }
}

#[tokio::test]
async fn transfers_beyond_the_limit_are_rejected() {
    let state =
        create_test_state_with_rate_limit("http://localhost:1", 3, Duration::from_secs(60));
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_account(&state, alice, 10_000).await;
    seed_account(&state, bob, 0).await;

    for i in 0..3 {
        TransferService::transfer(
            &state,
            transfer_request(alice, bob, 100, format!("limited-transfer-{}", i)),
        )
        .await
        .unwrap();
    }

    let err = TransferService::transfer(
        &state,
        transfer_request(alice, bob, 100, "limited-transfer-over".into()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::RateLimited));

    // The rejected transfer left no trace.
    assert_eq!(state.store.balance(alice).unwrap(), 9_700);
    assert!(state
        .store
        .entries_by_idempotency_key("limited-transfer-over")
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn limit_recovers_after_the_window_rolls() {
    let state =
        create_test_state_with_rate_limit("http://localhost:1", 1, Duration::from_millis(200));
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_account(&state, alice, 10_000).await;
    seed_account(&state, bob, 0).await;

    TransferService::transfer(
        &state,
        transfer_request(alice, bob, 100, "rolling-transfer-1".into()),
    )
    .await
    .unwrap();

    let err = TransferService::transfer(
        &state,
        transfer_request(alice, bob, 100, "rolling-transfer-2".into()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::RateLimited));

    tokio::time::sleep(Duration::from_millis(250)).await;

    TransferService::transfer(
        &state,
        transfer_request(alice, bob, 100, "rolling-transfer-3".into()),
    )
    .await
    .unwrap();
    assert_eq!(state.store.balance(bob).unwrap(), 200);
}

#[tokio::test]
async fn replays_do_not_consume_the_limit() {
    let state =
        create_test_state_with_rate_limit("http://localhost:1", 1, Duration::from_secs(60));
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_account(&state, alice, 10_000).await;
    seed_account(&state, bob, 0).await;

    let first = TransferService::transfer(
        &state,
        transfer_request(alice, bob, 100, "replay-not-limited".into()),
    )
    .await
    .unwrap();

    // A replay resolves before the limiter and still succeeds.
    let second = TransferService::transfer(
        &state,
        transfer_request(alice, bob, 100, "replay-not-limited".into()),
    )
    .await
    .unwrap();

    assert!(second.replayed);
    assert_eq!(first.reference, second.reference);
    assert_eq!(state.store.balance(bob).unwrap(), 100);
}
