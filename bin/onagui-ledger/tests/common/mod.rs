use axum::Router;
use onagui_core::app_state::AppState;
use onagui_core::services::DepositService;
use onagui_core::store::MemoryLedgerStore;
use onagui_primitives::models::app_config::AppConfig;
use onagui_primitives::models::{Account, DepositRequest};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Test configuration pointed at `chain_url` (usually a wiremock server).
/// The transfer rate limit is generous so only the rate-limit tests hit it.
#[allow(dead_code)]
pub fn test_config(chain_url: &str) -> AppConfig {
    AppConfig {
        chain_api_url: chain_url.to_string(),
        chain_api_key: SecretString::from("test_chain_key"),
        chain_min_confirmations: 3,
        chain_submit_timeout: Duration::from_secs(5),
        transfer_rate_limit: 1000,
        transfer_rate_window: Duration::from_secs(60),
        withdrawal_poll_interval: Duration::from_secs(1),
    }
}

#[allow(dead_code)]
pub fn create_test_state(chain_url: &str) -> Arc<AppState> {
    create_test_state_with_config(test_config(chain_url))
}

#[allow(dead_code)]
pub fn create_test_state_with_rate_limit(
    chain_url: &str,
    limit: u32,
    window: Duration,
) -> Arc<AppState> {
    let mut config = test_config(chain_url);
    config.transfer_rate_limit = limit;
    config.transfer_rate_window = window;
    create_test_state_with_config(config)
}

pub fn create_test_state_with_config(config: AppConfig) -> Arc<AppState> {
    let store = Arc::new(MemoryLedgerStore::new());
    AppState::new(store, config).expect("failed to build test state")
}

/// Build the full router the way production does, minus the IP governor.
#[allow(dead_code)]
pub fn create_test_app(state: Arc<AppState>) -> Router {
    std::env::set_var("APP_ENV", "test");
    onagui_api::app::create_router(state)
}

/// Open an account for `user_id` and fund it through the deposit path, so
/// the seeded balance has a matching ledger entry.
pub async fn seed_account(state: &Arc<AppState>, user_id: Uuid, amount: i64) -> Account {
    let account = state
        .store
        .open_account(user_id)
        .expect("failed to open account");

    if amount > 0 {
        DepositService::process_deposit(
            state,
            DepositRequest {
                user_id,
                amount,
                tx_hash: format!("0xseed{}", Uuid::new_v4().simple()),
                from_address: "chain:faucet".into(),
                to_address: format!("chain:{}", user_id.simple()),
            },
        )
        .await
        .expect("failed to seed deposit");
    }

    state
        .store
        .account(account.id)
        .expect("seeded account missing")
}
