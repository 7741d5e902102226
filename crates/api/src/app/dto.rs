use core::str::FromStr;

use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use supplynet_core::DomainError;
use supplynet_network::{ContactRecord, NetworkNode, Product};

use crate::app::errors;

/// Distinguish "field absent" (outer `None`) from "field set to null"
/// (`Some(None)`) in PATCH bodies.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct NodeListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Case-insensitive match on attached contacts' country.
    pub country: Option<String>,
}

fn default_level() -> i16 {
    1 // retailer
}

#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    pub name: String,
    /// Tier level; a body without it creates a retailer.
    #[serde(default = "default_level")]
    pub level: i16,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub debt_minor: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNodeRequest {
    pub name: Option<String>,
    pub level: Option<i16>,
    #[serde(default, deserialize_with = "double_option")]
    pub supplier: Option<Option<String>>,
    pub contacts: Option<Vec<String>>,
    pub products: Option<Vec<String>>,
    /// Read-only through the API; any occurrence is rejected.
    #[serde(default, deserialize_with = "double_option")]
    pub debt_minor: Option<Option<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub department: Option<String>,
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: Option<String>,
    pub building: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub department: Option<Option<String>>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub street: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub building: Option<Option<u32>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub model: String,
    pub release_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub model: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub release_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Deserialize)]
pub struct ClearDebtRequest {
    pub ids: Vec<String>,
}

// -------------------------
// Parsing helpers
// -------------------------

/// Parse a list of string ids, answering with a 400 response on the first
/// malformed one.
pub fn parse_ids<T>(raw: &[String], what: &str) -> Result<Vec<T>, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.iter()
        .map(|s| {
            s.parse::<T>().map_err(|_| {
                errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    format!("invalid {what} id '{s}'"),
                )
            })
        })
        .collect()
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn contact_to_json(c: &ContactRecord) -> serde_json::Value {
    serde_json::json!({
        "id": c.id.to_string(),
        "department": c.department,
        "email": c.email,
        "country": c.country,
        "city": c.city,
        "street": c.street,
        "building": c.building,
    })
}

/// Brief contact shape used inside the node listing: the address collapses
/// into a single line.
fn contact_brief_json(c: &ContactRecord) -> serde_json::Value {
    serde_json::json!({
        "department": c.department,
        "email": c.email,
        "address": c.address_line(),
    })
}

/// Contact shape embedded in the node detail (full fields, no id echo).
fn contact_embedded_json(c: &ContactRecord) -> serde_json::Value {
    serde_json::json!({
        "department": c.department,
        "email": c.email,
        "country": c.country,
        "city": c.city,
        "street": c.street,
        "building": c.building,
    })
}

fn product_embedded_json(p: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": p.id.to_string(),
        "name": p.name,
        "model": p.model,
        "release_date": p.release_date,
    })
}

/// Node shape for the listing: brief contacts plus a product count.
pub fn node_list_json(node: &NetworkNode, contacts: &[ContactRecord]) -> serde_json::Value {
    serde_json::json!({
        "id": node.id.to_string(),
        "name": node.name,
        "contacts": contacts.iter().map(contact_brief_json).collect::<Vec<_>>(),
        "items_quantity": node.products.len(),
        "supplier": node.supplier.map(|s| s.to_string()),
        "debt_minor": node.debt_minor,
        "level": node.tier.as_level(),
    })
}

/// Node shape for the detail view: expanded contacts and products.
pub fn node_detail_json(
    node: &NetworkNode,
    contacts: &[ContactRecord],
    products: &[Product],
) -> serde_json::Value {
    serde_json::json!({
        "id": node.id.to_string(),
        "name": node.name,
        "contacts": contacts.iter().map(contact_embedded_json).collect::<Vec<_>>(),
        "products": products.iter().map(product_embedded_json).collect::<Vec<_>>(),
        "supplier": node.supplier.map(|s| s.to_string()),
        "debt_minor": node.debt_minor,
        "created_at": node.created_at.to_rfc3339(),
        "level": node.tier.as_level(),
    })
}

/// Product shape with its sales channels (the nodes selling it).
pub fn product_to_json(product: &Product, channels: &[NetworkNode]) -> serde_json::Value {
    serde_json::json!({
        "id": product.id.to_string(),
        "name": product.name,
        "model": product.model,
        "release_date": product.release_date,
        "number_of_sales_channels": channels.len(),
        "sales_channel": channels
            .iter()
            .map(|n| serde_json::json!({ "name": n.name }))
            .collect::<Vec<_>>(),
    })
}
