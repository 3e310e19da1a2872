use crate::handlers::{
    account_entries::__path_get_account_entries, cancel_withdrawal::__path_cancel_withdrawal,
    deposit::__path_process_deposit, get_balance::__path_get_user_balance,
    get_withdrawal::__path_get_withdrawal, health::__path_health_check, health::HealthStatus,
    open_account::__path_open_account, reconciliation::__path_get_reconciliation,
    transfer::__path_transfer_funds, withdraw::__path_request_withdrawal,
};
use onagui_primitives::error::ApiErrorResponse;
use onagui_primitives::models::*;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check, open_account, get_user_balance, get_account_entries,
        get_reconciliation, transfer_funds, process_deposit,
        request_withdrawal, get_withdrawal, cancel_withdrawal
    ),
    components(schemas(
        HealthStatus,
        ApiErrorResponse,
        OpenAccountRequest,
        OpenAccountResponse,
        BalanceResponse,
        LedgerEntryDto,
        EntriesResponse,
        ReconciliationResponse,
        TransferRequest,
        TransferResponse,
        DepositRequest,
        DepositResponse,
        WithdrawRequest,
        WithdrawalResponse
    )),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Accounts", description = "Account balances and entry history"),
        (name = "Transfers", description = "Idempotent account-to-account transfers"),
        (name = "Deposits", description = "On-chain deposit crediting"),
        (name = "Withdrawals", description = "Withdrawal lifecycle")
    )
)]
pub struct ApiDoc;
