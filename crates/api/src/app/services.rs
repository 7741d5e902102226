//! Store wiring for the API.
//!
//! In-memory store by default (dev/test); set `USE_PERSISTENT_STORES=true`
//! with the `postgres` feature and a `DATABASE_URL` to run against Postgres.

use std::sync::Arc;

use supplynet_infra::{InMemorySupplyStore, SupplyStore};

/// Services injected into every handler.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn SupplyStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn SupplyStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn SupplyStore {
        &*self.store
    }
}

/// Build the services from environment configuration.
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        #[cfg(feature = "postgres")]
        {
            return build_persistent_services().await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
        }
    }

    AppServices::new(Arc::new(InMemorySupplyStore::new()))
}

#[cfg(feature = "postgres")]
async fn build_persistent_services() -> AppServices {
    use supplynet_infra::PostgresSupplyStore;

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = sqlx::PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to Postgres");

    let store = PostgresSupplyStore::new(pool);
    store
        .ensure_schema()
        .await
        .expect("Failed to apply database schema");

    AppServices::new(Arc::new(store))
}
