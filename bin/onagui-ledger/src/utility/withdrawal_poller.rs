use onagui_core::app_state::AppState;
use onagui_core::services::withdrawal_service::WithdrawalService;
use onagui_primitives::error::LedgerError;
use onagui_primitives::models::WithdrawalStatus;
use std::sync::Arc;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Re-drives withdrawals that have not reached a terminal state. Every
/// drive step is idempotent, so it is safe for a poll to overlap a crashed
/// or in-flight attempt: pending ones get started, processing ones get
/// their chain status re-checked.
pub fn spawn_withdrawal_poller(state: Arc<AppState>) {
    tokio::spawn(async move {
        info!(
            interval_secs = state.config.withdrawal_poll_interval.as_secs(),
            "Starting withdrawal poller"
        );
        poll_withdrawals(state).await;
    });
}

async fn poll_withdrawals(state: Arc<AppState>) {
    let mut interval = interval(state.config.withdrawal_poll_interval);
    interval.tick().await;

    loop {
        interval.tick().await;

        for status in [WithdrawalStatus::Pending, WithdrawalStatus::Processing] {
            let withdrawals = match state.store.withdrawals_in_status(status) {
                Ok(list) => list,
                Err(e) => {
                    error!("Withdrawal poll query failed: {}", e);
                    continue;
                }
            };

            for withdrawal in withdrawals {
                match WithdrawalService::process(&state, withdrawal.id).await {
                    Ok(_) => {}
                    // Another driver holds it, or the chain gave no answer
                    // yet; the next tick tries again.
                    Err(LedgerError::Conflict(_)) | Err(LedgerError::Chain(_)) => {
                        debug!(withdrawal_id = %withdrawal.id, "Withdrawal drive deferred");
                    }
                    Err(e) => {
                        error!(withdrawal_id = %withdrawal.id, "Withdrawal drive failed: {}", e);
                    }
                }
            }
        }
    }
}
