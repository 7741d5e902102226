use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use supplynet_core::DomainError;
use supplynet_infra::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", msg)
        }
        StoreError::Domain(DomainError::NotFound) | StoreError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        StoreError::Domain(DomainError::Conflict(msg)) | StoreError::Conflict(msg) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        StoreError::Domain(e) => json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
        StoreError::Backend(msg) => {
            tracing::error!("store backend error: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    store_error_to_response(StoreError::Domain(err))
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
