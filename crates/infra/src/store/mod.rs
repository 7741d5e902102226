//! Store trait, pagination shapes, and error mapping.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use supplynet_core::{ContactId, DomainError, NodeId, ProductId};
use supplynet_network::{ContactRecord, NetworkNode, Product};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    /// Maximum number of items to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50, // Safe default
            offset: 0,
        }
    }
}

impl Page {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(1000), // Cap at 1000 for safety
            offset: offset.unwrap_or(0),
        }
    }
}

/// Paginated list result.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total number of items matching the query (across all pages).
    pub total: u64,
    /// Whether there are more items past this page.
    pub has_more: bool,
}

/// Filter criteria for the node listing.
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    /// Case-insensitive substring match on the country of any attached
    /// contact record.
    pub country: Option<String>,
}

/// Store-level error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A domain rule rejected the write.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The addressed row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing storage failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// CRUD over the supply network's three entities plus the cross-entity
/// queries the API representations need.
///
/// Writes re-run the pure validation rules and the referential checks
/// (supplier/contact/product references must exist), which is the
/// persistence-layer half of the double enforcement.
#[async_trait]
pub trait SupplyStore: Send + Sync {
    // --- network nodes ---

    async fn create_node(&self, node: NetworkNode) -> Result<NetworkNode, StoreError>;
    async fn get_node(&self, id: NodeId) -> Result<NetworkNode, StoreError>;
    async fn list_nodes(
        &self,
        filter: NodeFilter,
        page: Page,
    ) -> Result<PageResult<NetworkNode>, StoreError>;
    /// Full-row update. The stored `created_at` is preserved.
    async fn update_node(&self, node: NetworkNode) -> Result<NetworkNode, StoreError>;
    /// Delete a node. Nodes that had it as supplier get their supplier link
    /// cleared (SET NULL semantics); validation fires on writes, not on
    /// cascades.
    async fn delete_node(&self, id: NodeId) -> Result<(), StoreError>;
    /// Zero out the debt of the listed nodes. Unknown ids are ignored.
    /// Returns the number of nodes touched.
    async fn clear_debt(&self, ids: &[NodeId]) -> Result<u64, StoreError>;
    /// Nodes that sell the given product (its sales channels), by name.
    async fn nodes_selling(&self, product_id: ProductId) -> Result<Vec<NetworkNode>, StoreError>;

    // --- contact records ---

    async fn create_contact(&self, contact: ContactRecord) -> Result<ContactRecord, StoreError>;
    async fn get_contact(&self, id: ContactId) -> Result<ContactRecord, StoreError>;
    async fn list_contacts(&self, page: Page) -> Result<PageResult<ContactRecord>, StoreError>;
    async fn update_contact(&self, contact: ContactRecord) -> Result<ContactRecord, StoreError>;
    async fn delete_contact(&self, id: ContactId) -> Result<(), StoreError>;
    /// Hydration helper: records in input order, unknown ids skipped.
    async fn contacts_by_ids(&self, ids: &[ContactId]) -> Result<Vec<ContactRecord>, StoreError>;

    // --- products ---

    async fn create_product(&self, product: Product) -> Result<Product, StoreError>;
    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError>;
    async fn list_products(&self, page: Page) -> Result<PageResult<Product>, StoreError>;
    async fn update_product(&self, product: Product) -> Result<Product, StoreError>;
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError>;
    /// Hydration helper: products in input order, unknown ids skipped.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError>;
}

/// Reject duplicate link ids before they hit a backend primary key.
pub(crate) fn ensure_unique_links(node: &NetworkNode) -> Result<(), StoreError> {
    let mut contacts = node.contacts.clone();
    contacts.sort();
    contacts.dedup();
    if contacts.len() != node.contacts.len() {
        return Err(DomainError::validation("duplicate contact reference").into());
    }

    let mut products = node.products.clone();
    products.sort();
    products.dedup();
    if products.len() != node.products.len() {
        return Err(DomainError::validation("duplicate product reference").into());
    }

    Ok(())
}
