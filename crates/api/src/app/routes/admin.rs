//! Administrative actions, exposed as plain endpoints under `/admin`.

use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use supplynet_core::NodeId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/networks/clear-debt", post(clear_debt))
}

/// Zero out the debt of the listed nodes. Goes through the persistence
/// layer, so it is exempt from the API's debt-immutability rule; unknown
/// ids are ignored.
pub async fn clear_debt(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ClearDebtRequest>,
) -> axum::response::Response {
    let ids: Vec<NodeId> = match dto::parse_ids(&body.ids, "node") {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    match services.store().clear_debt(&ids).await {
        Ok(cleared) => (
            StatusCode::OK,
            Json(serde_json::json!({ "cleared": cleared })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
