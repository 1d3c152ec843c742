//! Domain handlers for the two sync webhooks.
//!
//! Both endpoints take the raw body (body parsing is disabled on webhook
//! routes so signature verification upstream sees the exact bytes) plus the
//! auth data the delivery middleware resolved from the APL.

use axum::{extract::State, Extension, Json};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::apl::AuthData;
use crate::error::AppError;
use crate::events::{
    PaymentGatewayInitializeSessionEvent, TransactionInitializeSessionEvent, TransactionResult,
    TransactionResultType,
};
use crate::graphql::GraphqlClient;
use crate::webhook::parse_payload;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct GatewayCheck {
    pub check: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentGatewayResponse {
    pub data: GatewayCheck,
}

/// PAYMENT_GATEWAY_INITIALIZE_SESSION: eligibility stand-in for the COD
/// gateway. Logs the payload and acknowledges unconditionally; no branching
/// on channel, currency or amount.
pub async fn payment_gateway_initialize_session(
    State(_state): State<AppState>,
    Extension(auth): Extension<AuthData>,
    body: Bytes,
) -> Result<Json<PaymentGatewayResponse>, AppError> {
    let event: PaymentGatewayInitializeSessionEvent = parse_payload(&body)?;
    let source = event.source_object.as_ref().map(|s| s.fields());
    info!(
        source_id = source.map(|f| f.id.as_str()),
        channel = source.and_then(|f| f.channel.as_ref()).map(|c| c.slug.as_str()),
        currency = source
            .and_then(|f| f.total.as_ref())
            .map(|t| t.gross.currency.as_str()),
        payload = ?event,
        "cod gateway check requested"
    );

    let _client = saleor_client(&auth);

    Ok(Json(PaymentGatewayResponse {
        data: GatewayCheck {
            check: "ok cod".to_string(),
        },
    }))
}

/// TRANSACTION_INITIALIZE_SESSION: every COD transaction is authorized.
/// No idempotency against previously seen transaction ids and no dispatch on
/// the requested action type; duplicates get a fresh success each time.
pub async fn transaction_initialize_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthData>,
    body: Bytes,
) -> Result<Json<TransactionResult>, AppError> {
    let event: TransactionInitializeSessionEvent = parse_payload(&body)?;
    info!(
        transaction_id = %event.transaction.id,
        amount = event.action.amount,
        currency = %event.action.currency,
        "authorizing cod transaction"
    );

    let _client = saleor_client(&auth);

    let result = authorize_cod(
        &event,
        Utc::now().timestamp(),
        &state.config.app_base_url,
    );
    Ok(Json(result))
}

/// Client for follow-up queries against the installing Saleor instance.
/// The COD flow issues none, but this is where they would start from.
fn saleor_client(auth: &AuthData) -> GraphqlClient {
    let token = auth.token.clone();
    GraphqlClient::new(auth.saleor_api_url.clone(), move || token.clone())
}

/// Shape the unconditional success response: psp reference echoes the
/// platform transaction id, amount echoes the requested action amount.
pub fn authorize_cod(
    event: &TransactionInitializeSessionEvent,
    now_unix: i64,
    external_url: &str,
) -> TransactionResult {
    TransactionResult {
        psp_reference: event.transaction.id.clone(),
        result: TransactionResultType::AuthorizationSuccess,
        amount: event.action.amount,
        time: unix_timestamp_to_iso8601(now_unix),
        external_url: external_url.to_string(),
        message: "Successfull COD".to_string(),
    }
}

/// Unix seconds to ISO-8601 with millisecond precision and a trailing `Z`.
/// Timestamps outside chrono's representable range clamp to the epoch.
pub fn unix_timestamp_to_iso8601(timestamp_in_seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp_in_seconds, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
