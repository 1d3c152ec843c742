//! Install-time surface: the app manifest and the register callback that
//! stores the per-installation token through the APL.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::apl::AuthData;
use crate::error::AppError;
use crate::webhook::{WebhookManifest, SALEOR_API_URL_HEADER};
use crate::AppState;

pub const APP_ID: &str = "saleor.app.cod";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub about: String,
    pub permissions: Vec<String>,
    pub app_url: String,
    pub token_target_url: String,
    pub webhooks: Vec<WebhookManifest>,
}

/// GET /api/manifest — what Saleor reads during installation to learn the
/// register callback and webhook subscriptions.
pub async fn manifest(State(state): State<AppState>) -> Json<AppManifest> {
    let base_url = state.config.app_base_url.trim_end_matches('/');
    let webhooks = state
        .webhooks
        .iter()
        .map(|webhook| webhook.manifest_entry(base_url))
        .collect();
    Json(AppManifest {
        id: APP_ID.to_string(),
        version: APP_VERSION.to_string(),
        name: "Cash on delivery".to_string(),
        about: "Accepts every payment as cash on delivery.".to_string(),
        permissions: vec!["HANDLE_PAYMENTS".to_string()],
        app_url: format!("{base_url}/"),
        token_target_url: format!("{base_url}/api/register"),
        webhooks,
    })
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub auth_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
}

/// POST /api/register — Saleor calls this once after manifest installation
/// with the app token; the pair is persisted keyed by the instance URL.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let saleor_api_url = headers
        .get(SALEOR_API_URL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(AppError::MissingSaleorHeaders)?;

    let auth_data = AuthData {
        saleor_api_url: saleor_api_url.clone(),
        token: req.auth_token,
    };
    state
        .apl
        .set(auth_data)
        .await
        .map_err(|err| AppError::AplUnavailable(err.to_string()))?;

    info!(saleor_api_url = %saleor_api_url, "registered saleor installation");
    Ok(Json(RegisterResponse { success: true }))
}
