use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use supplynet_core::{ContactId, DomainError, DomainResult, Entity, NodeId, ProductId};

use crate::rules;

/// Tier of a node in the supply chain.
///
/// Serialized as its integer level (`0` factory, `1` retailer, `2` consumer),
/// which is also the wire format of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Factory,
    Retailer,
    Consumer,
}

impl Tier {
    /// Numeric level of this tier (0 = top of the chain).
    pub fn as_level(self) -> i16 {
        match self {
            Tier::Factory => 0,
            Tier::Retailer => 1,
            Tier::Consumer => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Factory => "factory",
            Tier::Retailer => "retailer",
            Tier::Consumer => "consumer",
        }
    }
}

impl TryFrom<i16> for Tier {
    type Error = DomainError;

    fn try_from(level: i16) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Tier::Factory),
            1 => Ok(Tier::Retailer),
            2 => Ok(Tier::Consumer),
            other => Err(DomainError::validation(format!(
                "level must be 0 (factory), 1 (retailer) or 2 (consumer), got {other}"
            ))),
        }
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.as_level())
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let level = i16::deserialize(deserializer)?;
        Tier::try_from(level).map_err(serde::de::Error::custom)
    }
}

/// One organization in the supply network.
///
/// Links: an optional supplier (another node), the contact records attached
/// to it, and the products it sells. Debt is carried in minor currency units
/// and only on non-factory tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: NodeId,
    pub name: String,
    pub tier: Tier,
    pub supplier: Option<NodeId>,
    pub debt_minor: i64,
    pub contacts: Vec<ContactId>,
    pub products: Vec<ProductId>,
    pub created_at: DateTime<Utc>,
}

impl NetworkNode {
    /// Build a validated node. Invalid tier/supplier/debt combinations
    /// cannot be constructed through this path.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: NodeId,
        name: String,
        tier: Tier,
        supplier: Option<NodeId>,
        debt_minor: i64,
        contacts: Vec<ContactId>,
        products: Vec<ProductId>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let node = Self {
            id,
            name,
            tier,
            supplier,
            debt_minor,
            contacts,
            products,
            created_at,
        };
        node.validate()?;
        Ok(node)
    }

    /// Re-run the full rule set against the current state.
    ///
    /// Stores call this on every write so that mutated copies go through the
    /// same checks as freshly constructed ones.
    pub fn validate(&self) -> DomainResult<()> {
        rules::validate_name(&self.name)?;
        rules::validate_supplier(self.tier, self.supplier, self.id)?;
        rules::validate_debt(self.tier, self.debt_minor)?;
        Ok(())
    }
}

impl Entity for NetworkNode {
    type Id = NodeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn factory_constructs_without_supplier_or_debt() {
        let node = factory("Plant 1");
        assert_eq!(node.tier, Tier::Factory);
        assert_eq!(node.debt_minor, 0);
        assert!(node.supplier.is_none());
    }

    #[test]
    fn retailer_requires_supplier() {
        let err = NetworkNode::new(
            NodeId::new(),
            "Shop".to_string(),
            Tier::Retailer,
            None,
            0,
            vec![],
            vec![],
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn indebted_factory_is_rejected() {
        let err = NetworkNode::new(
            NodeId::new(),
            "Plant 2".to_string(),
            Tier::Factory,
            None,
            50_00,
            vec![],
            vec![],
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn validate_catches_mutation_into_invalid_state() {
        let mut node = factory("Plant 3");
        node.validate().unwrap();

        // Changing the tier invalidates the missing supplier link.
        node.tier = Tier::Consumer;
        assert!(node.validate().is_err());
    }

    #[test]
    fn tier_serializes_as_integer_level() {
        assert_eq!(serde_json::to_string(&Tier::Factory).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Tier::Consumer).unwrap(), "2");

        let tier: Tier = serde_json::from_str("1").unwrap();
        assert_eq!(tier, Tier::Retailer);
        assert!(serde_json::from_str::<Tier>("3").is_err());
    }
}
