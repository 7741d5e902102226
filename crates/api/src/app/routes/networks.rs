use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use supplynet_core::NodeId;
use supplynet_infra::{NodeFilter, Page};
use supplynet_network::{NetworkNode, Tier};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_networks).post(create_network))
        .route(
            "/:id",
            get(get_network).patch(update_network).delete(delete_network),
        )
}

pub async fn list_networks(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::NodeListParams>,
) -> axum::response::Response {
    let page = Page::new(params.limit, params.offset);
    let filter = NodeFilter {
        country: params.country,
    };

    let result = match services.store().list_nodes(filter, page).await {
        Ok(r) => r,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut items = Vec::with_capacity(result.items.len());
    for node in &result.items {
        let contacts = match services.store().contacts_by_ids(&node.contacts).await {
            Ok(c) => c,
            Err(e) => return errors::store_error_to_response(e),
        };
        items.push(dto::node_list_json(node, &contacts));
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

pub async fn create_network(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateNodeRequest>,
) -> axum::response::Response {
    let tier = match Tier::try_from(body.level) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let supplier = match &body.supplier {
        None => None,
        Some(raw) => match raw.parse::<NodeId>() {
            Ok(id) => Some(id),
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier id")
            }
        },
    };

    let contacts = match dto::parse_ids(&body.contacts, "contact") {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    let products = match dto::parse_ids(&body.products, "product") {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    // API-boundary validation: the constructor runs the tier/supplier/debt
    // rules before the store is touched.
    let node = match NetworkNode::new(
        NodeId::new(),
        body.name,
        tier,
        supplier,
        body.debt_minor.unwrap_or(0),
        contacts,
        products,
        Utc::now(),
    ) {
        Ok(node) => node,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let node = match services.store().create_node(node).await {
        Ok(node) => node,
        Err(e) => return errors::store_error_to_response(e),
    };

    detail_response(&services, &node, StatusCode::CREATED).await
}

pub async fn get_network(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: NodeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid node id"),
    };

    match services.store().get_node(id).await {
        Ok(node) => detail_response(&services, &node, StatusCode::OK).await,
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_network(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateNodeRequest>,
) -> axum::response::Response {
    let id: NodeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid node id"),
    };

    // Debt is settled through the admin action, never through PATCH.
    if body.debt_minor.is_some() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "debt amount is read-only via the API",
        );
    }

    let existing = match services.store().get_node(id).await {
        Ok(node) => node,
        Err(e) => return errors::store_error_to_response(e),
    };

    let tier = match body.level {
        None => existing.tier,
        Some(level) => match Tier::try_from(level) {
            Ok(t) => t,
            Err(e) => return errors::domain_error_to_response(e),
        },
    };

    let supplier = match &body.supplier {
        None => existing.supplier,
        Some(None) => None,
        Some(Some(raw)) => match raw.parse::<NodeId>() {
            Ok(id) => Some(id),
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier id")
            }
        },
    };

    let contacts = match &body.contacts {
        None => existing.contacts.clone(),
        Some(raw) => match dto::parse_ids(raw, "contact") {
            Ok(ids) => ids,
            Err(resp) => return resp,
        },
    };
    let products = match &body.products {
        None => existing.products.clone(),
        Some(raw) => match dto::parse_ids(raw, "product") {
            Ok(ids) => ids,
            Err(resp) => return resp,
        },
    };

    let merged = NetworkNode {
        id: existing.id,
        name: body.name.unwrap_or(existing.name),
        tier,
        supplier,
        debt_minor: existing.debt_minor,
        contacts,
        products,
        created_at: existing.created_at,
    };

    // API-boundary validation of the merged state before the store write.
    if let Err(e) = merged.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store().update_node(merged).await {
        Ok(node) => detail_response(&services, &node, StatusCode::OK).await,
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_network(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: NodeId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid node id"),
    };

    match services.store().delete_node(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn detail_response(
    services: &AppServices,
    node: &NetworkNode,
    status: StatusCode,
) -> axum::response::Response {
    let contacts = match services.store().contacts_by_ids(&node.contacts).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };
    let products = match services.store().products_by_ids(&node.products).await {
        Ok(p) => p,
        Err(e) => return errors::store_error_to_response(e),
    };
    (status, Json(dto::node_detail_json(node, &contacts, &products))).into_response()
}
