//! Hierarchy validation rules, as pure predicates.
//!
//! These are enforced twice on purpose: once at the API boundary (so a bad
//! request fails before any store round-trip) and once inside every store
//! write (so direct persistence cannot bypass them).

use supplynet_core::{DomainError, DomainResult, NodeId};

use crate::node::Tier;

/// Validate the tier/supplier relationship of a node.
///
/// - A factory has no supplier.
/// - A retailer or consumer must have a supplier.
/// - A node may not be its own supplier.
pub fn validate_supplier(tier: Tier, supplier: Option<NodeId>, node_id: NodeId) -> DomainResult<()> {
    if supplier == Some(node_id) {
        return Err(DomainError::invariant("a node cannot be its own supplier"));
    }

    match tier {
        Tier::Factory => {
            if supplier.is_some() {
                return Err(DomainError::invariant("factory cannot have a supplier"));
            }
        }
        Tier::Retailer | Tier::Consumer => {
            if supplier.is_none() {
                return Err(DomainError::invariant(
                    "retailer or consumer must have a supplier",
                ));
            }
        }
    }

    Ok(())
}

/// Validate the tier/debt relationship of a node.
///
/// Debt is tracked in minor currency units and only on non-factory tiers.
pub fn validate_debt(tier: Tier, debt_minor: i64) -> DomainResult<()> {
    if debt_minor < 0 {
        return Err(DomainError::validation("debt cannot be negative"));
    }
    if tier == Tier::Factory && debt_minor != 0 {
        return Err(DomainError::invariant(
            "the factory cannot be in debt as it has no supplier",
        ));
    }
    Ok(())
}

/// Validate a node name.
pub fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_id() -> NodeId {
        NodeId::new()
    }

    #[test]
    fn factory_with_supplier_is_rejected() {
        let err = validate_supplier(Tier::Factory, Some(node_id()), node_id()).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => {
                assert_eq!(msg, "factory cannot have a supplier")
            }
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn factory_without_supplier_is_accepted() {
        validate_supplier(Tier::Factory, None, node_id()).unwrap();
    }

    #[test]
    fn retailer_without_supplier_is_rejected() {
        let err = validate_supplier(Tier::Retailer, None, node_id()).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => {
                assert_eq!(msg, "retailer or consumer must have a supplier")
            }
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn consumer_with_supplier_is_accepted() {
        validate_supplier(Tier::Consumer, Some(node_id()), node_id()).unwrap();
    }

    #[test]
    fn self_supplier_is_rejected_on_every_tier() {
        for tier in [Tier::Factory, Tier::Retailer, Tier::Consumer] {
            let id = node_id();
            let err = validate_supplier(tier, Some(id), id).unwrap_err();
            match err {
                DomainError::InvariantViolation(msg) => {
                    assert_eq!(msg, "a node cannot be its own supplier")
                }
                other => panic!("expected invariant violation, got {other:?}"),
            }
        }
    }

    #[test]
    fn factory_debt_is_rejected() {
        let err = validate_debt(Tier::Factory, 1).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => {
                assert_eq!(msg, "the factory cannot be in debt as it has no supplier")
            }
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn factory_zero_debt_is_accepted() {
        validate_debt(Tier::Factory, 0).unwrap();
    }

    #[test]
    fn negative_debt_is_rejected_on_every_tier() {
        for tier in [Tier::Factory, Tier::Retailer, Tier::Consumer] {
            assert!(validate_debt(tier, -1).is_err());
        }
    }

    #[test]
    fn retailer_debt_is_accepted() {
        validate_debt(Tier::Retailer, 150_00).unwrap();
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name("").is_err());
        validate_name("Factory West").unwrap();
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn tier_strategy() -> impl Strategy<Value = Tier> {
            prop_oneof![
                Just(Tier::Factory),
                Just(Tier::Retailer),
                Just(Tier::Consumer),
            ]
        }

        proptest! {
            /// Property: a non-factory node without a supplier never validates.
            #[test]
            fn supplierless_non_factory_always_rejected(
                tier in tier_strategy().prop_filter("non-factory", |t| *t != Tier::Factory)
            ) {
                prop_assert!(validate_supplier(tier, None, NodeId::new()).is_err());
            }

            /// Property: a factory with any non-zero debt never validates.
            #[test]
            fn indebted_factory_always_rejected(debt in 1i64..=i64::MAX) {
                prop_assert!(validate_debt(Tier::Factory, debt).is_err());
            }

            /// Property: non-negative debt on a non-factory tier always validates.
            #[test]
            fn non_factory_debt_always_accepted(
                tier in tier_strategy().prop_filter("non-factory", |t| *t != Tier::Factory),
                debt in 0i64..=i64::MAX,
            ) {
                prop_assert!(validate_debt(tier, debt).is_ok());
            }

            /// Property: a retailer/consumer pointing at a distinct supplier always validates.
            #[test]
            fn distinct_supplier_always_accepted(
                tier in tier_strategy().prop_filter("non-factory", |t| *t != Tier::Factory)
            ) {
                let node = NodeId::new();
                let supplier = NodeId::new();
                prop_assume!(node != supplier);
                prop_assert!(validate_supplier(tier, Some(supplier), node).is_ok());
            }
        }
    }
}
