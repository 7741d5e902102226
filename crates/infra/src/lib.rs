//! `supplynet-infra` — persistence behind the [`store::SupplyStore`] trait.
//!
//! Two backends: an in-memory store (dev/test default) and a Postgres store
//! behind the `postgres` cargo feature. Every write re-runs the domain
//! validation rules so direct persistence cannot bypass them.

pub mod store;

pub use store::{NodeFilter, Page, PageResult, StoreError, SupplyStore};
pub use store::memory::InMemorySupplyStore;
#[cfg(feature = "postgres")]
pub use store::postgres::PostgresSupplyStore;
