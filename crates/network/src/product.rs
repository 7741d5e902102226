use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use supplynet_core::{DomainResult, Entity, ProductId};

use crate::rules;

/// A sellable item. The set of nodes selling it lives on the node side
/// (`NetworkNode::products`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub model: String,
    pub release_date: Option<NaiveDate>,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: String,
        model: String,
        release_date: Option<NaiveDate>,
    ) -> DomainResult<Self> {
        let product = Self {
            id,
            name,
            model,
            release_date,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn validate(&self) -> DomainResult<()> {
        rules::validate_name(&self.name)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_with_name_and_model_validates() {
        let p = Product::new(
            ProductId::new(),
            "Widget".to_string(),
            "M-1000".to_string(),
            NaiveDate::from_ymd_opt(2020, 9, 5),
        )
        .unwrap();
        assert_eq!(p.model, "M-1000");
    }

    #[test]
    fn blank_product_name_is_rejected() {
        assert!(Product::new(ProductId::new(), "  ".to_string(), "M".to_string(), None).is_err());
    }
}
