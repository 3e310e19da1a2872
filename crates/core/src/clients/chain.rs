use onagui_primitives::error::LedgerError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

/// Outcome classification for a transfer submission. The caller's reaction
/// differs: a rejected submission never reached the chain and may be safely
/// reversed; an unavailable node leaves the outcome unknown, so the caller
/// must keep the withdrawal in flight and re-check later.
#[derive(Debug)]
pub enum ChainSubmitError {
    Rejected(String),
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainTxState {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainTransaction {
    pub tx_hash: String,
    pub state: ChainTxState,
    pub confirmations: u64,
}

#[derive(Debug, Deserialize)]
struct SubmitTransferResponse {
    tx_hash: String,
}

/// HTTP client for the chain gateway that signs and broadcasts transfers on
/// the service's behalf and reports confirmation depth.
#[derive(Clone)]
pub struct ChainClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl ChainClient {
    pub fn new(http: Client, base_url: &str, api_key: SecretString) -> Result<Self, LedgerError> {
        if base_url.trim().is_empty() {
            return Err(LedgerError::Internal("chain gateway URL not set".into()));
        }
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Submit a signed transfer of `amount` minor units to `to_address`.
    /// Returns the broadcast transaction hash.
    pub async fn submit_transfer(
        &self,
        to_address: &str,
        amount: i64,
        reference: &str,
    ) -> Result<String, ChainSubmitError> {
        let resp = self
            .http
            .post(format!("{}/v1/transfers", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "to_address": to_address,
                "amount": amount,
                "reference": reference,
            }))
            .send()
            .await
            .map_err(|e| {
                error!("Chain gateway unreachable: {}", e);
                ChainSubmitError::Unavailable(e.to_string())
            })?;

        let status = resp.status();
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChainSubmitError::Rejected(format!(
                "submission rejected ({}): {}",
                status, body
            )));
        }
        if !status.is_success() {
            return Err(ChainSubmitError::Unavailable(format!(
                "chain gateway returned {}",
                status
            )));
        }

        let body = resp
            .json::<SubmitTransferResponse>()
            .await
            .map_err(|e| ChainSubmitError::Unavailable(format!("malformed response: {}", e)))?;

        Ok(body.tx_hash)
    }

    /// Fetch the current state and confirmation depth of a broadcast
    /// transaction.
    pub async fn transaction(&self, tx_hash: &str) -> Result<ChainTransaction, LedgerError> {
        let resp = self
            .http
            .get(format!("{}/v1/transactions/{}", self.base_url, tx_hash))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LedgerError::Chain(format!(
                "transaction lookup for {} returned {}",
                tx_hash, status
            )));
        }

        resp.json::<ChainTransaction>()
            .await
            .map_err(|e| LedgerError::Chain(format!("malformed transaction response: {}", e)))
    }
}
