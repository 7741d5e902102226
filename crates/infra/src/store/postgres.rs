//! Postgres-backed store implementation.
//!
//! ## Error mapping
//!
//! sqlx errors map to `StoreError` as follows: unique violations (PostgreSQL
//! code `23505`) become `Conflict` (node names are unique), everything else
//! becomes `Backend`. Referential problems that a client can fix (unknown
//! supplier/contact/product ids) are checked explicitly before the insert so
//! they surface as `Domain` validation errors instead of raw FK failures.
//!
//! ## Thread safety
//!
//! Uses the sqlx connection pool, which is `Send + Sync`; every write runs in
//! a transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use supplynet_core::{ContactId, DomainError, NodeId, ProductId};
use supplynet_network::{ContactRecord, NetworkNode, Product, Tier};

use super::{ensure_unique_links, NodeFilter, Page, PageResult, StoreError, SupplyStore};

const SCHEMA: &str = include_str!("../../schema.sql");

/// Postgres-backed `SupplyStore`.
#[derive(Debug, Clone)]
pub struct PostgresSupplyStore {
    pool: PgPool,
}

impl PostgresSupplyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the schema idempotently (all DDL is `IF NOT EXISTS`).
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn load_links(
        &self,
        node_ids: &[NodeId],
    ) -> Result<HashMap<NodeId, (Vec<ContactId>, Vec<ProductId>)>, StoreError> {
        let mut links: HashMap<NodeId, (Vec<ContactId>, Vec<ProductId>)> = node_ids
            .iter()
            .map(|id| (*id, (Vec::new(), Vec::new())))
            .collect();
        if node_ids.is_empty() {
            return Ok(links);
        }
        let uuids = to_uuids(node_ids);

        let contact_rows = sqlx::query(
            "SELECT node_id, contact_id FROM node_contacts \
             WHERE node_id = ANY($1) ORDER BY contact_id",
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_links.contacts", e))?;

        for row in contact_rows {
            let node_id = NodeId::from_uuid(try_get(&row, "node_id")?);
            let contact_id = ContactId::from_uuid(try_get(&row, "contact_id")?);
            if let Some(entry) = links.get_mut(&node_id) {
                entry.0.push(contact_id);
            }
        }

        let product_rows = sqlx::query(
            "SELECT node_id, product_id FROM node_products \
             WHERE node_id = ANY($1) ORDER BY product_id",
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_links.products", e))?;

        for row in product_rows {
            let node_id = NodeId::from_uuid(try_get(&row, "node_id")?);
            let product_id = ProductId::from_uuid(try_get(&row, "product_id")?);
            if let Some(entry) = links.get_mut(&node_id) {
                entry.1.push(product_id);
            }
        }

        Ok(links)
    }

    async fn hydrate_nodes(&self, rows: Vec<PgRow>) -> Result<Vec<NetworkNode>, StoreError> {
        let mut nodes = Vec::with_capacity(rows.len());
        for row in rows {
            nodes.push(node_from_row(&row)?);
        }
        let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        let mut links = self.load_links(&ids).await?;
        for node in &mut nodes {
            if let Some((contacts, products)) = links.remove(&node.id) {
                node.contacts = contacts;
                node.products = products;
            }
        }
        Ok(nodes)
    }
}

fn to_uuids<I: Copy + Into<Uuid>>(ids: &[I]) -> Vec<Uuid> {
    ids.iter().map(|id| (*id).into()).collect()
}

fn try_get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Backend(format!("column '{column}': {e}")))
}

fn node_from_row(row: &PgRow) -> Result<NetworkNode, StoreError> {
    let tier_level: i16 = try_get(row, "tier")?;
    let tier = Tier::try_from(tier_level)
        .map_err(|_| StoreError::Backend(format!("corrupt tier level {tier_level}")))?;

    Ok(NetworkNode {
        id: NodeId::from_uuid(try_get(row, "id")?),
        name: try_get(row, "name")?,
        tier,
        supplier: try_get::<Option<Uuid>>(row, "supplier_id")?.map(NodeId::from_uuid),
        debt_minor: try_get(row, "debt_minor")?,
        contacts: Vec::new(),
        products: Vec::new(),
        created_at: try_get::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn contact_from_row(row: &PgRow) -> Result<ContactRecord, StoreError> {
    Ok(ContactRecord {
        id: ContactId::from_uuid(try_get(row, "id")?),
        department: try_get(row, "department")?,
        email: try_get(row, "email")?,
        country: try_get(row, "country")?,
        city: try_get(row, "city")?,
        street: try_get(row, "street")?,
        building: try_get::<Option<i32>>(row, "building")?.map(|b| b as u32),
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId::from_uuid(try_get(row, "id")?),
        name: try_get(row, "name")?,
        model: try_get(row, "model")?,
        release_date: try_get::<Option<NaiveDate>>(row, "release_date")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::Conflict(format!("{operation}: unique constraint violated"));
    }
    StoreError::Backend(format!("{operation}: {err}"))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Referential checks shared by node create/update. Runs inside the write
/// transaction so the checked rows cannot vanish before the insert.
async fn check_node_references(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    node: &NetworkNode,
) -> Result<(), StoreError> {
    if let Some(supplier) = node.supplier {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM network_nodes WHERE id = $1)",
        )
        .bind(*supplier.as_uuid())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("check_supplier", e))?;
        if !exists {
            return Err(DomainError::validation(format!("unknown supplier {supplier}")).into());
        }
    }

    if !node.contacts.is_empty() {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contact_records WHERE id = ANY($1)",
        )
        .bind(to_uuids(&node.contacts))
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("check_contacts", e))?;
        if found as usize != node.contacts.len() {
            return Err(DomainError::validation("unknown contact reference").into());
        }
    }

    if !node.products.is_empty() {
        let found =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE id = ANY($1)")
                .bind(to_uuids(&node.products))
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("check_products", e))?;
        if found as usize != node.products.len() {
            return Err(DomainError::validation("unknown product reference").into());
        }
    }

    Ok(())
}

async fn insert_links(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    node: &NetworkNode,
) -> Result<(), StoreError> {
    for contact_id in &node.contacts {
        sqlx::query("INSERT INTO node_contacts (node_id, contact_id) VALUES ($1, $2)")
            .bind(*node.id.as_uuid())
            .bind(*contact_id.as_uuid())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_links.contacts", e))?;
    }
    for product_id in &node.products {
        sqlx::query("INSERT INTO node_products (node_id, product_id) VALUES ($1, $2)")
            .bind(*node.id.as_uuid())
            .bind(*product_id.as_uuid())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_links.products", e))?;
    }
    Ok(())
}

const NODE_COLUMNS: &str = "id, name, tier, supplier_id, debt_minor, created_at";

#[async_trait]
impl SupplyStore for PostgresSupplyStore {
    #[instrument(skip_all, fields(node_id = %node.id))]
    async fn create_node(&self, node: NetworkNode) -> Result<NetworkNode, StoreError> {
        node.validate()?;
        ensure_unique_links(&node)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_node.begin", e))?;
        check_node_references(&mut tx, &node).await?;

        sqlx::query(
            "INSERT INTO network_nodes (id, name, tier, supplier_id, debt_minor, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*node.id.as_uuid())
        .bind(&node.name)
        .bind(node.tier.as_level())
        .bind(node.supplier.map(|s| *s.as_uuid()))
        .bind(node.debt_minor)
        .bind(node.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_node", e))?;

        insert_links(&mut tx, &node).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_node.commit", e))?;
        Ok(node)
    }

    async fn get_node(&self, id: NodeId) -> Result<NetworkNode, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {NODE_COLUMNS} FROM network_nodes WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_node", e))?
        .ok_or(StoreError::NotFound)?;

        let mut nodes = self.hydrate_nodes(vec![row]).await?;
        Ok(nodes.remove(0))
    }

    async fn list_nodes(
        &self,
        filter: NodeFilter,
        page: Page,
    ) -> Result<PageResult<NetworkNode>, StoreError> {
        let pattern = filter.country.map(|c| format!("%{c}%"));

        let where_clause = "WHERE $1::text IS NULL OR EXISTS (\
             SELECT 1 FROM node_contacts nc \
             JOIN contact_records c ON c.id = nc.contact_id \
             WHERE nc.node_id = n.id AND c.country ILIKE $1)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM network_nodes n {where_clause}"
        ))
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_nodes.count", e))? as u64;

        let rows = sqlx::query(&format!(
            "SELECT n.id, n.name, n.tier, n.supplier_id, n.debt_minor, n.created_at \
             FROM network_nodes n {where_clause} \
             ORDER BY n.id LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_nodes", e))?;

        let items = self.hydrate_nodes(rows).await?;
        let has_more = (page.offset as u64).saturating_add(items.len() as u64) < total;
        Ok(PageResult {
            items,
            total,
            has_more,
        })
    }

    #[instrument(skip_all, fields(node_id = %node.id))]
    async fn update_node(&self, mut node: NetworkNode) -> Result<NetworkNode, StoreError> {
        node.validate()?;
        ensure_unique_links(&node)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_node.begin", e))?;
        check_node_references(&mut tx, &node).await?;

        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "UPDATE network_nodes \
             SET name = $2, tier = $3, supplier_id = $4, debt_minor = $5 \
             WHERE id = $1 RETURNING created_at",
        )
        .bind(*node.id.as_uuid())
        .bind(&node.name)
        .bind(node.tier.as_level())
        .bind(node.supplier.map(|s| *s.as_uuid()))
        .bind(node.debt_minor)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_node", e))?
        .ok_or(StoreError::NotFound)?;
        node.created_at = created_at;

        sqlx::query("DELETE FROM node_contacts WHERE node_id = $1")
            .bind(*node.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_node.unlink_contacts", e))?;
        sqlx::query("DELETE FROM node_products WHERE node_id = $1")
            .bind(*node.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_node.unlink_products", e))?;
        insert_links(&mut tx, &node).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_node.commit", e))?;
        Ok(node)
    }

    async fn delete_node(&self, id: NodeId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM network_nodes WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_node", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn clear_debt(&self, ids: &[NodeId]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("UPDATE network_nodes SET debt_minor = 0 WHERE id = ANY($1)")
            .bind(to_uuids(ids))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear_debt", e))?;
        Ok(result.rows_affected())
    }

    async fn nodes_selling(&self, product_id: ProductId) -> Result<Vec<NetworkNode>, StoreError> {
        let rows = sqlx::query(
            "SELECT n.id, n.name, n.tier, n.supplier_id, n.debt_minor, n.created_at \
             FROM network_nodes n \
             JOIN node_products np ON np.node_id = n.id \
             WHERE np.product_id = $1 ORDER BY n.name",
        )
        .bind(*product_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("nodes_selling", e))?;

        self.hydrate_nodes(rows).await
    }

    async fn create_contact(&self, contact: ContactRecord) -> Result<ContactRecord, StoreError> {
        contact.validate()?;
        sqlx::query(
            "INSERT INTO contact_records (id, department, email, country, city, street, building) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*contact.id.as_uuid())
        .bind(&contact.department)
        .bind(&contact.email)
        .bind(&contact.country)
        .bind(&contact.city)
        .bind(&contact.street)
        .bind(contact.building.map(|b| b as i32))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_contact", e))?;
        Ok(contact)
    }

    async fn get_contact(&self, id: ContactId) -> Result<ContactRecord, StoreError> {
        let row = sqlx::query("SELECT * FROM contact_records WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_contact", e))?
            .ok_or(StoreError::NotFound)?;
        contact_from_row(&row)
    }

    async fn list_contacts(&self, page: Page) -> Result<PageResult<ContactRecord>, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contact_records")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_contacts.count", e))? as u64;

        let rows = sqlx::query("SELECT * FROM contact_records ORDER BY id LIMIT $1 OFFSET $2")
            .bind(page.limit as i64)
            .bind(page.offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_contacts", e))?;

        let items = rows
            .iter()
            .map(contact_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let has_more = (page.offset as u64).saturating_add(items.len() as u64) < total;
        Ok(PageResult {
            items,
            total,
            has_more,
        })
    }

    async fn update_contact(&self, contact: ContactRecord) -> Result<ContactRecord, StoreError> {
        contact.validate()?;
        let result = sqlx::query(
            "UPDATE contact_records \
             SET department = $2, email = $3, country = $4, city = $5, street = $6, building = $7 \
             WHERE id = $1",
        )
        .bind(*contact.id.as_uuid())
        .bind(&contact.department)
        .bind(&contact.email)
        .bind(&contact.country)
        .bind(&contact.city)
        .bind(&contact.street)
        .bind(contact.building.map(|b| b as i32))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_contact", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(contact)
    }

    async fn delete_contact(&self, id: ContactId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM contact_records WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_contact", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn contacts_by_ids(&self, ids: &[ContactId]) -> Result<Vec<ContactRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query("SELECT * FROM contact_records WHERE id = ANY($1)")
            .bind(to_uuids(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("contacts_by_ids", e))?;

        let mut by_id: HashMap<ContactId, ContactRecord> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let contact = contact_from_row(row)?;
            by_id.insert(contact.id, contact);
        }
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn create_product(&self, product: Product) -> Result<Product, StoreError> {
        product.validate()?;
        sqlx::query("INSERT INTO products (id, name, model, release_date) VALUES ($1, $2, $3, $4)")
            .bind(*product.id.as_uuid())
            .bind(&product.name)
            .bind(&product.model)
            .bind(product.release_date)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_product", e))?;
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?
            .ok_or(StoreError::NotFound)?;
        product_from_row(&row)
    }

    async fn list_products(&self, page: Page) -> Result<PageResult<Product>, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products.count", e))? as u64;

        let rows = sqlx::query("SELECT * FROM products ORDER BY name, id LIMIT $1 OFFSET $2")
            .bind(page.limit as i64)
            .bind(page.offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        let items = rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let has_more = (page.offset as u64).saturating_add(items.len() as u64) < total;
        Ok(PageResult {
            items,
            total,
            has_more,
        })
    }

    async fn update_product(&self, product: Product) -> Result<Product, StoreError> {
        product.validate()?;
        let result = sqlx::query(
            "UPDATE products SET name = $2, model = $3, release_date = $4 WHERE id = $1",
        )
        .bind(*product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.model)
        .bind(product.release_date)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query("SELECT * FROM products WHERE id = ANY($1)")
            .bind(to_uuids(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("products_by_ids", e))?;

        let mut by_id: HashMap<ProductId, Product> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let product = product_from_row(row)?;
            by_id.insert(product.id, product);
        }
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
