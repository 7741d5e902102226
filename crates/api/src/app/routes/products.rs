use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use supplynet_core::ProductId;
use supplynet_infra::Page;
use supplynet_network::Product;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListParams>,
) -> axum::response::Response {
    let page = Page::new(params.limit, params.offset);
    let result = match services.store().list_products(page).await {
        Ok(r) => r,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut items = Vec::with_capacity(result.items.len());
    for product in &result.items {
        let channels = match services.store().nodes_selling(product.id).await {
            Ok(c) => c,
            Err(e) => return errors::store_error_to_response(e),
        };
        items.push(dto::product_to_json(product, &channels));
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "items": items,
            "total": result.total,
            "has_more": result.has_more,
        })),
    )
        .into_response()
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let product = match Product::new(ProductId::new(), body.name, body.model, body.release_date) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store().create_product(product).await {
        Ok(p) => (StatusCode::CREATED, Json(dto::product_to_json(&p, &[]))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    let product = match services.store().get_product(id).await {
        Ok(p) => p,
        Err(e) => return errors::store_error_to_response(e),
    };
    let channels = match services.store().nodes_selling(product.id).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };

    (StatusCode::OK, Json(dto::product_to_json(&product, &channels))).into_response()
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProductRequest>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    let existing = match services.store().get_product(id).await {
        Ok(p) => p,
        Err(e) => return errors::store_error_to_response(e),
    };

    let merged = Product {
        id: existing.id,
        name: body.name.unwrap_or(existing.name),
        model: body.model.unwrap_or(existing.model),
        release_date: match body.release_date {
            None => existing.release_date,
            Some(date) => date,
        },
    };
    if let Err(e) = merged.validate() {
        return errors::domain_error_to_response(e);
    }

    let updated = match services.store().update_product(merged).await {
        Ok(p) => p,
        Err(e) => return errors::store_error_to_response(e),
    };
    let channels = match services.store().nodes_selling(updated.id).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };

    (StatusCode::OK, Json(dto::product_to_json(&updated, &channels))).into_response()
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    match services.store().delete_product(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
