use eyre::Report;
use secrecy::SecretString;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chain_api_url: String,
    pub chain_api_key: SecretString,
    /// Confirmation depth a withdrawal needs before it settles.
    pub chain_min_confirmations: u64,
    /// Request timeout for chain submissions. On timeout the withdrawal
    /// stays `processing`; it is never failed without confirming the chain
    /// did not relay it.
    pub chain_submit_timeout: Duration,
    pub transfer_rate_limit: u32,
    pub transfer_rate_window: Duration,
    pub withdrawal_poll_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Report> {
        Ok(Self {
            chain_api_url: env::var("CHAIN_API_URL")
                .unwrap_or_else(|_| "http://localhost:8899".into()),

            chain_api_key: SecretString::from(env::var("CHAIN_API_KEY").unwrap_or_default()),

            chain_min_confirmations: env::var("CHAIN_MIN_CONFIRMATIONS")
                .unwrap_or_else(|_| "3".into())
                .parse()?,

            chain_submit_timeout: Duration::from_secs(
                env::var("CHAIN_SUBMIT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".into())
                    .parse()?,
            ),

            transfer_rate_limit: env::var("TRANSFER_RATE_LIMIT")
                .unwrap_or_else(|_| "10".into())
                .parse()?,

            transfer_rate_window: Duration::from_secs(
                env::var("TRANSFER_RATE_WINDOW_SECS")
                    .unwrap_or_else(|_| "60".into())
                    .parse()?,
            ),

            withdrawal_poll_interval: Duration::from_secs(
                env::var("WITHDRAWAL_POLL_INTERVAL_SECS")
                    .unwrap_or_else(|_| "15".into())
                    .parse()?,
            ),
        })
    }
}
