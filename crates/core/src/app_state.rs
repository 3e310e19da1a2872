use crate::clients::chain::ChainClient;
use crate::services::rate_limiter::TransferRateLimiter;
use crate::services::withdrawal_service::DriveGuard;
use crate::store::LedgerStore;
use eyre::Result;
use reqwest::Client;
use std::sync::Arc;

pub use onagui_primitives::models::app_config::AppConfig;

pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub chain: ChainClient,
    pub limiter: TransferRateLimiter,
    pub withdrawal_guard: DriveGuard,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, config: AppConfig) -> Result<Arc<Self>> {
        let http = Client::builder()
            .timeout(config.chain_submit_timeout)
            .build()?;

        let chain = ChainClient::new(http, &config.chain_api_url, config.chain_api_key.clone())?;

        let limiter =
            TransferRateLimiter::new(config.transfer_rate_limit, config.transfer_rate_window);

        Ok(Arc::new(Self {
            store,
            chain,
            limiter,
            withdrawal_guard: DriveGuard::default(),
            config,
        }))
    }
}
