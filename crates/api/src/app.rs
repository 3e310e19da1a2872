use crate::config::swagger_config::ApiDoc;
use crate::handlers::{
    account_entries::get_account_entries, cancel_withdrawal::cancel_withdrawal,
    deposit::process_deposit, get_balance::get_user_balance, get_withdrawal::get_withdrawal,
    health::health_check, open_account::open_account, reconciliation::get_reconciliation,
    transfer::transfer_funds, withdraw::request_withdrawal,
};
use axum::Router;
use onagui_core::app_state::AppState;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn create_router(state: Arc<AppState>) -> Router {
    // IP-level rate limiting; the per-account transfer limiter lives in the
    // transfer engine.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(20)
            .finish()
            .unwrap(),
    );

    let mut router = Router::new()
        .merge(service_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http()),
        );

    // Disabled in the test environment to avoid "Unable To Extract Key!"
    // errors from the in-process test server.
    if std::env::var("APP_ENV").unwrap_or_default() != "test" {
        router = router.layer(GovernorLayer {
            config: governor_conf,
        });
    }

    router.with_state(state)
}

fn service_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/accounts", axum::routing::post(open_account))
        .route(
            "/api/accounts/{user_id}/balance",
            axum::routing::get(get_user_balance),
        )
        .route(
            "/api/accounts/{user_id}/entries",
            axum::routing::get(get_account_entries),
        )
        .route(
            "/api/accounts/{user_id}/reconciliation",
            axum::routing::get(get_reconciliation),
        )
        .route("/api/transfers", axum::routing::post(transfer_funds))
        .route("/api/deposits", axum::routing::post(process_deposit))
        .route("/api/withdrawals", axum::routing::post(request_withdrawal))
        .route(
            "/api/withdrawals/{withdrawal_id}",
            axum::routing::get(get_withdrawal),
        )
        .route(
            "/api/withdrawals/{withdrawal_id}/cancel",
            axum::routing::post(cancel_withdrawal),
        )
}
