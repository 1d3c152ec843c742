use axum::body::{to_bytes, Body};
use axum::http::Request;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use saleor_cod_app::apl::{Apl, AuthData, FileApl};
use saleor_cod_app::config::{AplBackend, AppConfig};
use saleor_cod_app::webhook::registered_webhooks;
use saleor_cod_app::{app_router, AppState};

const SALEOR_URL: &str = "https://demo.saleor.cloud/graphql/";

fn test_config() -> AppConfig {
    AppConfig {
        apl_backend: AplBackend::File,
        apl_file_path: ".auth-data.json".into(),
        upstash: None,
        app_base_url: "http://localhost:3000/".into(),
        host: "127.0.0.1".into(),
        port: 3000,
    }
}

async fn registered_state(dir: &TempDir) -> AppState {
    let apl = FileApl::new(dir.path().join("auth.json"));
    apl.set(AuthData {
        saleor_api_url: SALEOR_URL.into(),
        token: "app-token".into(),
    })
    .await
    .unwrap();
    AppState {
        config: Arc::new(test_config()),
        apl: Arc::new(apl),
        webhooks: Arc::new(registered_webhooks()),
    }
}

fn delivery_request(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header("saleor-api-url", SALEOR_URL)
        .header("saleor-event", "transaction_initialize_session")
        .header("saleor-signature", "eyJ..sig")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn transaction_payload(amount: f64, transaction_id: &str) -> serde_json::Value {
    serde_json::json!({
        "recipient": { "id": "QXBwOjE=", "metadata": [], "privateMetadata": [] },
        "data": null,
        "merchantReference": "order-1001",
        "action": { "amount": amount, "currency": "USD", "actionType": "CHARGE" },
        "issuingPrincipal": { "id": "VXNlcjox" },
        "transaction": { "id": transaction_id, "pspReference": null },
        "sourceObject": {
            "__typename": "Order",
            "id": "T3JkZXI6MTAwMQ==",
            "channel": { "id": "Q2hhbm5lbDox", "slug": "default-channel" },
            "languageCodeEnum": "EN_US",
            "userEmail": "buyer@example.com",
            "billingAddress": { "city": "Wroclaw", "country": { "code": "PL" } },
            "shippingAddress": { "city": "Wroclaw", "country": { "code": "PL" } },
            "total": { "gross": { "amount": amount, "currency": "USD" } },
            "lines": [
                {
                    "id": "T3JkZXJMaW5lOjE=",
                    "quantity": 2,
                    "totalPrice": { "gross": { "amount": amount, "currency": "USD" } },
                    "orderVariant": { "name": "Mug", "sku": "MUG-1", "product": { "name": "Mug" } }
                }
            ]
        }
    })
}

#[tokio::test]
async fn transaction_initialize_authorizes_unconditionally() {
    let dir = TempDir::new().unwrap();
    let app = app_router(registered_state(&dir).await);

    let resp = app
        .oneshot(delivery_request(
            "/api/webhooks/transaction-initialize-session",
            transaction_payload(42.5, "VHJhbnNhY3Rpb246OTk="),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let bytes = to_bytes(resp.into_body(), 1024 * 16).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["pspReference"], "VHJhbnNhY3Rpb246OTk=");
    assert_eq!(json["result"], "AUTHORIZATION_SUCCESS");
    assert_eq!(json["amount"], 42.5);
    assert_eq!(json["externalUrl"], "http://localhost:3000/");
    assert_eq!(json["message"], "Successfull COD");
    let time = json["time"].as_str().unwrap();
    assert!(time.ends_with('Z'), "time not ISO-8601 UTC: {time}");
    assert_eq!(time.len(), "1970-01-01T00:00:00.000Z".len());
}

#[tokio::test]
async fn payment_gateway_initialize_returns_fixed_check() {
    let dir = TempDir::new().unwrap();
    let app = app_router(registered_state(&dir).await);

    let payload = serde_json::json!({
        "recipient": { "id": "QXBwOjE=" },
        "data": null,
        "amount": 99.99,
        "sourceObject": {
            "__typename": "Checkout",
            "id": "Q2hlY2tvdXQ6MQ==",
            "channel": { "id": "Q2hhbm5lbDox", "slug": "default-channel" },
            "total": { "gross": { "amount": 99.99, "currency": "EUR" } }
        }
    });
    let resp = app
        .oneshot(delivery_request(
            "/api/webhooks/payment-gateway-initialize-session",
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let bytes = to_bytes(resp.into_body(), 1024 * 16).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, serde_json::json!({ "data": { "check": "ok cod" } }));
}

#[tokio::test]
async fn delivery_without_saleor_headers_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = app_router(registered_state(&dir).await);

    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/transaction-initialize-session")
        .header("content-type", "application/json")
        .body(Body::from(
            transaction_payload(5.0, "VHJhbnNhY3Rpb246MQ==").to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let code = resp
        .headers()
        .get("X-Error-Code")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert_eq!(code, "missing_saleor_headers");
}

#[tokio::test]
async fn delivery_from_unregistered_instance_is_rejected() {
    let dir = TempDir::new().unwrap();
    // Empty APL: nothing registered for the claimed instance.
    let state = AppState {
        config: Arc::new(test_config()),
        apl: Arc::new(FileApl::new(dir.path().join("auth.json"))),
        webhooks: Arc::new(registered_webhooks()),
    };
    let app = app_router(state);

    let resp = app
        .oneshot(delivery_request(
            "/api/webhooks/transaction-initialize-session",
            transaction_payload(5.0, "VHJhbnNhY3Rpb246MQ=="),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let code = resp
        .headers()
        .get("X-Error-Code")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert_eq!(code, "unknown_saleor_instance");
}

#[tokio::test]
async fn malformed_body_is_a_handled_failure() {
    let dir = TempDir::new().unwrap();
    let app = app_router(registered_state(&dir).await);

    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/transaction-initialize-session")
        .header("content-type", "application/json")
        .header("saleor-api-url", SALEOR_URL)
        .header("saleor-event", "transaction_initialize_session")
        .header("saleor-signature", "eyJ..sig")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let code = resp
        .headers()
        .get("X-Error-Code")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert_eq!(code, "malformed_payload");
}

#[tokio::test]
async fn missing_transaction_id_is_a_handled_failure() {
    let dir = TempDir::new().unwrap();
    let app = app_router(registered_state(&dir).await);

    let mut payload = transaction_payload(5.0, "unused");
    payload.as_object_mut().unwrap().remove("transaction");
    let resp = app
        .oneshot(delivery_request(
            "/api/webhooks/transaction-initialize-session",
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let code = resp
        .headers()
        .get("X-Error-Code")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert_eq!(code, "malformed_payload");
}
