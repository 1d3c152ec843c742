use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod apl;
pub mod config;
pub mod error;
pub mod events;
pub mod graphql;
pub mod handlers;
pub mod manifest;
pub mod webhook;

use apl::Apl;
use config::AppConfig;
use webhook::SaleorWebhook;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub apl: Arc<dyn Apl>,
    pub webhooks: Arc<Vec<SaleorWebhook>>,
}

/// Build the full router: manifest + register install surface, the two sync
/// webhook endpoints behind the delivery-verification middleware, and a
/// health probe.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/manifest", get(manifest::manifest))
        .route("/api/register", post(manifest::register))
        .route(
            "/api/webhooks/payment-gateway-initialize-session",
            post(handlers::payment_gateway_initialize_session),
        )
        .route(
            "/api/webhooks/transaction-initialize-session",
            post(handlers::transaction_initialize_session),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            webhook::verify_delivery,
        ))
        .with_state(state)
}
