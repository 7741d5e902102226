//! `supplynet-network` — supply network domain model.
//!
//! A three-tier commercial chain (Factory → Retailer → Consumer): network
//! nodes with a self-referential supplier link and debt balance, the contact
//! records attached to them, and the products they sell. The tier/supplier
//! and tier/debt rules live in [`rules`] as pure predicates so both the
//! persistence layer and the API boundary can enforce them.

pub mod contact;
pub mod node;
pub mod product;
pub mod rules;

pub use contact::ContactRecord;
pub use node::{NetworkNode, Tier};
pub use product::Product;
