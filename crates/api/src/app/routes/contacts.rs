use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use supplynet_core::ContactId;
use supplynet_infra::Page;
use supplynet_network::ContactRecord;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/:id",
            get(get_contact).patch(update_contact).delete(delete_contact),
        )
}

pub async fn list_contacts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListParams>,
) -> axum::response::Response {
    let page = Page::new(params.limit, params.offset);
    match services.store().list_contacts(page).await {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "items": result.items.iter().map(dto::contact_to_json).collect::<Vec<_>>(),
                "total": result.total,
                "has_more": result.has_more,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateContactRequest>,
) -> axum::response::Response {
    let contact = match ContactRecord::new(
        ContactId::new(),
        body.department,
        body.email,
        body.country,
        body.city,
        body.street,
        body.building,
    ) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store().create_contact(contact).await {
        Ok(c) => (StatusCode::CREATED, Json(dto::contact_to_json(&c))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ContactId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid contact id")
        }
    };

    match services.store().get_contact(id).await {
        Ok(c) => (StatusCode::OK, Json(dto::contact_to_json(&c))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateContactRequest>,
) -> axum::response::Response {
    let id: ContactId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid contact id")
        }
    };

    let existing = match services.store().get_contact(id).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };

    let merged = ContactRecord {
        id: existing.id,
        department: body.department.unwrap_or(existing.department),
        email: body.email.unwrap_or(existing.email),
        country: body.country.unwrap_or(existing.country),
        city: body.city.unwrap_or(existing.city),
        street: body.street.unwrap_or(existing.street),
        building: body.building.unwrap_or(existing.building),
    };
    if let Err(e) = merged.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store().update_contact(merged).await {
        Ok(c) => (StatusCode::OK, Json(dto::contact_to_json(&c))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ContactId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid contact id")
        }
    };

    match services.store().delete_contact(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
