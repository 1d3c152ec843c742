use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Errors surfaced to Saleor on a webhook or register delivery.
///
/// Every variant maps to a stable `X-Error-Code` header so deliveries can be
/// triaged from the platform side without parsing bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("missing saleor delivery headers")]
    MissingSaleorHeaders,
    #[error("no auth data registered for {0}")]
    UnknownSaleorInstance(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("auth store unavailable: {0}")]
    AplUnavailable(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::MissingSaleorHeaders => "missing_saleor_headers",
            AppError::UnknownSaleorInstance(_) => "unknown_saleor_instance",
            AppError::MalformedPayload(_) => "malformed_payload",
            AppError::AplUnavailable(_) => "apl_unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingSaleorHeaders | AppError::UnknownSaleorInstance(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::AplUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let body = ErrorBody {
            code: code.to_string(),
            message: Some(self.to_string()),
        };
        let mut resp = (self.status(), Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}
