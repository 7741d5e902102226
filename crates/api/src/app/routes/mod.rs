use axum::Router;

pub mod admin;
pub mod contacts;
pub mod networks;
pub mod products;
pub mod system;

/// Router for all entity endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/networks", networks::router())
        .nest("/products", products::router())
        .nest("/contacts", contacts::router())
        .nest("/admin", admin::router())
}
