//! Webhook registrar and the delivery middleware chain.
//!
//! The registrar declares, per event, the name, callback path, triggering
//! event and subscription query that end up in the install-time manifest.
//! Incoming deliveries pass through an explicit chain before the domain
//! handler runs: verify the delivery headers, resolve auth data from the
//! APL, then parse the raw body into the typed payload.

use axum::body::Body;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::AppError;
use crate::events::{
    WebhookEventType, PAYMENT_GATEWAY_INITIALIZE_SUBSCRIPTION,
    TRANSACTION_INITIALIZE_SUBSCRIPTION,
};
use crate::AppState;

pub const WEBHOOK_PATH_PREFIX: &str = "/api/webhooks/";

/// One registered sync webhook. Constructed once at startup so the manifest
/// handler can publish it; carries no other load-time side effects.
#[derive(Debug, Clone)]
pub struct SaleorWebhook {
    pub name: &'static str,
    pub webhook_path: &'static str,
    pub event: WebhookEventType,
    pub query: &'static str,
}

impl SaleorWebhook {
    pub fn target_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.webhook_path)
    }

    pub fn manifest_entry(&self, base_url: &str) -> WebhookManifest {
        WebhookManifest {
            name: self.name.to_string(),
            target_url: self.target_url(base_url),
            sync_events: vec![self.event.as_str().to_string()],
            query: self.query.to_string(),
        }
    }
}

/// Manifest entry Saleor consumes to register one webhook at install time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookManifest {
    pub name: String,
    pub target_url: String,
    pub sync_events: Vec<String>,
    pub query: String,
}

/// The two subscriptions this app registers.
pub fn registered_webhooks() -> Vec<SaleorWebhook> {
    vec![
        SaleorWebhook {
            name: "payment-gateway-initialize-session",
            webhook_path: "/api/webhooks/payment-gateway-initialize-session",
            event: WebhookEventType::PaymentGatewayInitializeSession,
            query: PAYMENT_GATEWAY_INITIALIZE_SUBSCRIPTION,
        },
        SaleorWebhook {
            name: "transaction-initialize-session",
            webhook_path: "/api/webhooks/transaction-initialize-session",
            event: WebhookEventType::TransactionInitializeSession,
            query: TRANSACTION_INITIALIZE_SUBSCRIPTION,
        },
    ]
}

pub const SALEOR_API_URL_HEADER: &str = "saleor-api-url";
pub const SALEOR_EVENT_HEADER: &str = "saleor-event";
pub const SALEOR_SIGNATURE_HEADER: &str = "saleor-signature";

/// Delivery verification middleware for webhook paths.
///
/// Requires the Saleor delivery headers and an APL entry for the claimed
/// instance, then makes the resolved `AuthData` available to the handler via
/// request extensions. Cryptographic JWS verification of the signature
/// belongs to the platform SDK upstream; the signature header is only
/// required to be present here.
pub async fn verify_delivery(
    State(state): State<AppState>,
    req: axum::http::Request<Body>,
    next: Next,
) -> Response {
    if !req.uri().path().starts_with(WEBHOOK_PATH_PREFIX) {
        return next.run(req).await;
    }

    // Scope the closure so its borrow of the request (whose body is !Sync)
    // ends before the APL await, keeping the middleware future Send.
    let headers = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        (
            header(SALEOR_API_URL_HEADER),
            header(SALEOR_EVENT_HEADER),
            header(SALEOR_SIGNATURE_HEADER),
        )
    };
    let (Some(api_url), Some(_event), Some(_signature)) = headers else {
        return AppError::MissingSaleorHeaders.into_response();
    };

    let auth_data = match state.apl.get(&api_url).await {
        Ok(Some(auth_data)) => auth_data,
        Ok(None) => {
            warn!(saleor_api_url = %api_url, "delivery from unregistered saleor instance");
            return AppError::UnknownSaleorInstance(api_url).into_response();
        }
        Err(err) => {
            warn!(error = %err, "APL lookup failed during delivery verification");
            return AppError::AplUnavailable(err.to_string()).into_response();
        }
    };

    let mut req = req;
    req.extensions_mut().insert(auth_data);
    next.run(req).await
}

/// Parse step of the delivery chain: raw body bytes into the typed event.
/// Body parsing stays disabled at the framework level so the raw bytes stay
/// available for signature verification upstream.
pub fn parse_payload<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| AppError::MalformedPayload(err.to_string()))?;
    serde_json::from_value(unwrap_event_envelope(value))
        .map_err(|err| AppError::MalformedPayload(err.to_string()))
}

/// Saleor wraps sync payloads as `{"event": {...}}` when the subscription
/// selects through `event`; unwrap before typing if so.
fn unwrap_event_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("event") => {
            map.remove("event").unwrap_or(Value::Null)
        }
        other => other,
    }
}
