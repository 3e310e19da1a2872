use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::r2d2;
use http::StatusCode;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug)]
pub enum LedgerError {
    /// Malformed input: non-positive amount, self-transfer, empty hash.
    InvalidRequest(String),
    Validation(validator::ValidationErrors),
    AccountNotFound(Uuid),
    WithdrawalNotFound(Uuid),
    InsufficientFunds {
        account_id: Uuid,
        requested: i64,
        available: i64,
    },
    RateLimited,
    /// Concurrent-write contention or a lost status CAS. Nothing was
    /// persisted; the whole operation is safe to retry.
    Conflict(String),
    DuplicateDeposit {
        tx_hash: String,
    },
    /// An entry with this (idempotency_key, kind) already exists. Callers
    /// resolve this by reading the recorded entries.
    DuplicateEntry {
        idempotency_key: String,
    },
    Database(diesel::result::Error),
    DatabaseConnection(String),
    Chain(String),
    Internal(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            LedgerError::Validation(e) => write!(f, "Validation error: {}", e),
            LedgerError::AccountNotFound(user_id) => {
                write!(f, "No account for user {}", user_id)
            }
            LedgerError::WithdrawalNotFound(id) => write!(f, "No withdrawal {}", id),
            LedgerError::InsufficientFunds {
                account_id,
                requested,
                available,
            } => write!(
                f,
                "Insufficient funds on account {}: requested {}, available {}",
                account_id, requested, available
            ),
            LedgerError::RateLimited => write!(f, "Transfer rate limit exceeded"),
            LedgerError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            LedgerError::DuplicateDeposit { tx_hash } => {
                write!(f, "Deposit {} already credited", tx_hash)
            }
            LedgerError::DuplicateEntry { idempotency_key } => {
                write!(f, "Ledger entry for key {} already recorded", idempotency_key)
            }
            LedgerError::Database(e) => write!(f, "Database error: {}", e),
            LedgerError::DatabaseConnection(e) => write!(f, "Database connection error: {}", e),
            LedgerError::Chain(e) => write!(f, "Chain provider error: {}", e),
            LedgerError::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Database(e) => Some(e),
            LedgerError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<r2d2::Error> for LedgerError {
    fn from(err: r2d2::Error) -> Self {
        LedgerError::DatabaseConnection(err.to_string())
    }
}

impl From<diesel::result::Error> for LedgerError {
    fn from(err: diesel::result::Error) -> Self {
        LedgerError::Database(err)
    }
}

impl From<validator::ValidationErrors> for LedgerError {
    fn from(err: validator::ValidationErrors) -> Self {
        LedgerError::Validation(err)
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        LedgerError::Chain(err.to_string())
    }
}

impl LedgerError {
    /// Stable machine-readable code surfaced to RPC callers.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidRequest(_) | LedgerError::Validation(_) => "invalid request",
            LedgerError::AccountNotFound(_) => "invalid user",
            LedgerError::WithdrawalNotFound(_) => "invalid withdrawal",
            LedgerError::InsufficientFunds { .. } => "insufficient funds",
            LedgerError::RateLimited => "rate limit exceeded",
            LedgerError::Conflict(_) => "conflict",
            LedgerError::DuplicateDeposit { .. } => "duplicate deposit",
            LedgerError::DuplicateEntry { .. } => "duplicate entry",
            LedgerError::Database(_) | LedgerError::DatabaseConnection(_) => "storage error",
            LedgerError::Chain(_) => "chain provider error",
            LedgerError::Internal(_) => "internal error",
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<LedgerError> for (StatusCode, ApiErrorResponse) {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::InvalidRequest(_) | LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::AccountNotFound(_) | LedgerError::WithdrawalNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LedgerError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            LedgerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            LedgerError::Conflict(_)
            | LedgerError::DuplicateDeposit { .. }
            | LedgerError::DuplicateEntry { .. } => StatusCode::CONFLICT,
            LedgerError::Chain(_) => StatusCode::BAD_GATEWAY,
            LedgerError::Database(_)
            | LedgerError::DatabaseConnection(_)
            | LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ApiErrorResponse {
            error: err.code().to_string(),
            message: err.to_string(),
        };

        (status, body)
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, ApiErrorResponse) = self.into();
        (status, Json(body)).into_response()
    }
}
