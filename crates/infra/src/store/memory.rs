//! In-memory store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use supplynet_core::{ContactId, DomainError, NodeId, ProductId};
use supplynet_network::{ContactRecord, NetworkNode, Product};

use super::{ensure_unique_links, NodeFilter, Page, PageResult, StoreError, SupplyStore};

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<NodeId, NetworkNode>,
    contacts: HashMap<ContactId, ContactRecord>,
    products: HashMap<ProductId, Product>,
}

/// In-memory `SupplyStore` backed by `RwLock<HashMap>` maps.
#[derive(Debug, Default)]
pub struct InMemorySupplyStore {
    inner: RwLock<State>,
}

impl InMemorySupplyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

fn check_node_references(state: &State, node: &NetworkNode) -> Result<(), StoreError> {
    if let Some(supplier) = node.supplier {
        if !state.nodes.contains_key(&supplier) {
            return Err(DomainError::validation(format!("unknown supplier {supplier}")).into());
        }
    }
    for contact_id in &node.contacts {
        if !state.contacts.contains_key(contact_id) {
            return Err(DomainError::validation(format!("unknown contact {contact_id}")).into());
        }
    }
    for product_id in &node.products {
        if !state.products.contains_key(product_id) {
            return Err(DomainError::validation(format!("unknown product {product_id}")).into());
        }
    }
    Ok(())
}

fn check_unique_name(state: &State, node: &NetworkNode) -> Result<(), StoreError> {
    let taken = state
        .nodes
        .values()
        .any(|other| other.id != node.id && other.name == node.name);
    if taken {
        return Err(StoreError::Conflict(format!(
            "node name '{}' already exists",
            node.name
        )));
    }
    Ok(())
}

fn paginate<T>(mut items: Vec<T>, page: Page) -> PageResult<T> {
    let total = items.len() as u64;
    let offset = page.offset as usize;
    let items = if offset >= items.len() {
        Vec::new()
    } else {
        items.drain(offset..).take(page.limit as usize).collect()
    };
    let has_more = (offset as u64).saturating_add(items.len() as u64) < total;
    PageResult {
        items,
        total,
        has_more,
    }
}

#[async_trait]
impl SupplyStore for InMemorySupplyStore {
    async fn create_node(&self, node: NetworkNode) -> Result<NetworkNode, StoreError> {
        node.validate()?;
        ensure_unique_links(&node)?;

        let mut state = self.write()?;
        if state.nodes.contains_key(&node.id) {
            return Err(StoreError::Conflict(format!("node {} already exists", node.id)));
        }
        check_unique_name(&state, &node)?;
        check_node_references(&state, &node)?;
        state.nodes.insert(node.id, node.clone());
        Ok(node)
    }

    async fn get_node(&self, id: NodeId) -> Result<NetworkNode, StoreError> {
        let state = self.read()?;
        state.nodes.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_nodes(
        &self,
        filter: NodeFilter,
        page: Page,
    ) -> Result<PageResult<NetworkNode>, StoreError> {
        let state = self.read()?;
        let needle = filter.country.as_deref().map(str::to_lowercase);

        let mut nodes: Vec<NetworkNode> = state
            .nodes
            .values()
            .filter(|node| match &needle {
                None => true,
                Some(needle) => node.contacts.iter().any(|cid| {
                    state
                        .contacts
                        .get(cid)
                        .is_some_and(|c| c.country.to_lowercase().contains(needle))
                }),
            })
            .cloned()
            .collect();
        nodes.sort_by_key(|n| n.id);

        Ok(paginate(nodes, page))
    }

    async fn update_node(&self, mut node: NetworkNode) -> Result<NetworkNode, StoreError> {
        node.validate()?;
        ensure_unique_links(&node)?;

        let mut state = self.write()?;
        let created_at = match state.nodes.get(&node.id) {
            Some(existing) => existing.created_at,
            None => return Err(StoreError::NotFound),
        };
        node.created_at = created_at;
        check_unique_name(&state, &node)?;
        check_node_references(&state, &node)?;
        state.nodes.insert(node.id, node.clone());
        Ok(node)
    }

    async fn delete_node(&self, id: NodeId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.nodes.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        // SET NULL cascade on dependents.
        for node in state.nodes.values_mut() {
            if node.supplier == Some(id) {
                node.supplier = None;
            }
        }
        Ok(())
    }

    async fn clear_debt(&self, ids: &[NodeId]) -> Result<u64, StoreError> {
        let mut state = self.write()?;
        let mut touched = 0;
        for id in ids {
            if let Some(node) = state.nodes.get_mut(id) {
                node.debt_minor = 0;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn nodes_selling(&self, product_id: ProductId) -> Result<Vec<NetworkNode>, StoreError> {
        let state = self.read()?;
        let mut nodes: Vec<NetworkNode> = state
            .nodes
            .values()
            .filter(|node| node.products.contains(&product_id))
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    async fn create_contact(&self, contact: ContactRecord) -> Result<ContactRecord, StoreError> {
        contact.validate()?;
        let mut state = self.write()?;
        if state.contacts.contains_key(&contact.id) {
            return Err(StoreError::Conflict(format!(
                "contact {} already exists",
                contact.id
            )));
        }
        state.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn get_contact(&self, id: ContactId) -> Result<ContactRecord, StoreError> {
        let state = self.read()?;
        state.contacts.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_contacts(&self, page: Page) -> Result<PageResult<ContactRecord>, StoreError> {
        let state = self.read()?;
        let mut contacts: Vec<ContactRecord> = state.contacts.values().cloned().collect();
        contacts.sort_by_key(|c| c.id);
        Ok(paginate(contacts, page))
    }

    async fn update_contact(&self, contact: ContactRecord) -> Result<ContactRecord, StoreError> {
        contact.validate()?;
        let mut state = self.write()?;
        if !state.contacts.contains_key(&contact.id) {
            return Err(StoreError::NotFound);
        }
        state.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn delete_contact(&self, id: ContactId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.contacts.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        // m2m detach from owning nodes.
        for node in state.nodes.values_mut() {
            node.contacts.retain(|cid| *cid != id);
        }
        Ok(())
    }

    async fn contacts_by_ids(&self, ids: &[ContactId]) -> Result<Vec<ContactRecord>, StoreError> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.contacts.get(id).cloned())
            .collect())
    }

    async fn create_product(&self, product: Product) -> Result<Product, StoreError> {
        product.validate()?;
        let mut state = self.write()?;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        let state = self.read()?;
        state.products.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_products(&self, page: Page) -> Result<PageResult<Product>, StoreError> {
        let state = self.read()?;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(products, page))
    }

    async fn update_product(&self, product: Product) -> Result<Product, StoreError> {
        product.validate()?;
        let mut state = self.write()?;
        if !state.products.contains_key(&product.id) {
            return Err(StoreError::NotFound);
        }
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.products.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        for node in state.nodes.values_mut() {
            node.products.retain(|pid| *pid != id);
        }
        Ok(())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use supplynet_network::Tier;

    fn factory(name: &str) -> NetworkNode {
        NetworkNode::new(
            NodeId::new(),
            name.to_string(),
            Tier::Factory,
            None,
            0,
            vec![],
            vec![],
            Utc::now(),
        )
        .unwrap()
    }

    fn retailer(name: &str, supplier: NodeId, debt_minor: i64) -> NetworkNode {
        NetworkNode::new(
            NodeId::new(),
            name.to_string(),
            Tier::Retailer,
            Some(supplier),
            debt_minor,
            vec![],
            vec![],
            Utc::now(),
        )
        .unwrap()
    }

    fn contact(country: &str) -> ContactRecord {
        ContactRecord::new(
            ContactId::new(),
            None,
            "info@example.com".to_string(),
            country.to_string(),
            "Oslo".to_string(),
            None,
            None,
        )
        .unwrap()
    }

    fn product(name: &str) -> Product {
        Product::new(ProductId::new(), name.to_string(), "M-1".to_string(), None).unwrap()
    }

    #[tokio::test]
    async fn node_crud_lifecycle() {
        let store = InMemorySupplyStore::new();
        let node = store.create_node(factory("Plant")).await.unwrap();

        let fetched = store.get_node(node.id).await.unwrap();
        assert_eq!(fetched.name, "Plant");

        let mut renamed = fetched.clone();
        renamed.name = "Best Plant".to_string();
        let updated = store.update_node(renamed).await.unwrap();
        assert_eq!(updated.name, "Best Plant");
        assert_eq!(updated.created_at, fetched.created_at);

        store.delete_node(node.id).await.unwrap();
        assert!(matches!(
            store.get_node(node.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_node_name_conflicts() {
        let store = InMemorySupplyStore::new();
        store.create_node(factory("Plant")).await.unwrap();
        let err = store.create_node(factory("Plant")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_node_is_rejected_at_the_store() {
        let store = InMemorySupplyStore::new();
        let mut node = factory("Plant");
        node.debt_minor = 10_00; // mutated into an invalid state after construction
        let err = store.create_node(node).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(_)));
    }

    #[tokio::test]
    async fn supplier_must_exist() {
        let store = InMemorySupplyStore::new();
        let err = store
            .create_node(retailer("Shop", NodeId::new(), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn deleting_supplier_nulls_dependents() {
        let store = InMemorySupplyStore::new();
        let plant = store.create_node(factory("Plant")).await.unwrap();
        let shop = store
            .create_node(retailer("Shop", plant.id, 100_00))
            .await
            .unwrap();

        store.delete_node(plant.id).await.unwrap();
        let shop = store.get_node(shop.id).await.unwrap();
        assert_eq!(shop.supplier, None);
    }

    #[tokio::test]
    async fn clear_debt_zeroes_listed_nodes_and_ignores_unknown_ids() {
        let store = InMemorySupplyStore::new();
        let plant = store.create_node(factory("Plant")).await.unwrap();
        let shop = store
            .create_node(retailer("Shop", plant.id, 250_00))
            .await
            .unwrap();

        let touched = store.clear_debt(&[shop.id, NodeId::new()]).await.unwrap();
        assert_eq!(touched, 1);
        assert_eq!(store.get_node(shop.id).await.unwrap().debt_minor, 0);
    }

    #[tokio::test]
    async fn country_filter_matches_attached_contacts() {
        let store = InMemorySupplyStore::new();
        let oslo = store.create_contact(contact("Norway")).await.unwrap();
        let kyoto = store.create_contact(contact("Japan")).await.unwrap();

        let mut plant_no = factory("Plant NO");
        plant_no.contacts = vec![oslo.id];
        let mut plant_jp = factory("Plant JP");
        plant_jp.contacts = vec![kyoto.id];
        store.create_node(plant_no).await.unwrap();
        store.create_node(plant_jp).await.unwrap();

        let page = store
            .list_nodes(
                NodeFilter {
                    country: Some("nor".to_string()),
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Plant NO");
    }

    #[tokio::test]
    async fn pagination_reports_has_more() {
        let store = InMemorySupplyStore::new();
        for i in 0..5 {
            store.create_node(factory(&format!("Plant {i}"))).await.unwrap();
        }

        let page = store
            .list_nodes(NodeFilter::default(), Page::new(Some(2), Some(0)))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert!(page.has_more);

        let last = store
            .list_nodes(NodeFilter::default(), Page::new(Some(2), Some(4)))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);
    }

    #[tokio::test]
    async fn deleting_product_detaches_it_from_sellers() {
        let store = InMemorySupplyStore::new();
        let widget = store.create_product(product("Widget")).await.unwrap();

        let mut plant = factory("Plant");
        plant.products = vec![widget.id];
        let plant = store.create_node(plant).await.unwrap();

        assert_eq!(store.nodes_selling(widget.id).await.unwrap().len(), 1);

        store.delete_product(widget.id).await.unwrap();
        let plant = store.get_node(plant.id).await.unwrap();
        assert!(plant.products.is_empty());
    }

    #[tokio::test]
    async fn duplicate_links_are_rejected() {
        let store = InMemorySupplyStore::new();
        let c = store.create_contact(contact("Norway")).await.unwrap();

        let mut node = factory("Plant");
        node.contacts = vec![c.id, c.id];
        let err = store.create_node(node).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn contacts_by_ids_preserves_order_and_skips_unknown() {
        let store = InMemorySupplyStore::new();
        let a = store.create_contact(contact("Norway")).await.unwrap();
        let b = store.create_contact(contact("Japan")).await.unwrap();

        let got = store
            .contacts_by_ids(&[b.id, ContactId::new(), a.id])
            .await
            .unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].id, b.id);
        assert_eq!(got[1].id, a.id);
    }
}
