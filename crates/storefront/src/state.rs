//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::{CartRegistry, CartStore};
use crate::catalog::Catalog;
use crate::checkout::ShippingPolicy;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// cart registry and the catalog/checkout collaborators.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    carts: CartRegistry,
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn CartStore>,
    shipping: ShippingPolicy,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Durable key-value store for cart snapshots
    /// * `catalog` - Supplier of product and stock data
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        let carts = CartRegistry::new(Arc::clone(&store));
        let shipping = ShippingPolicy::from(config.shipping);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                carts,
                catalog,
                store,
                shipping,
            }),
        }
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The cart session registry.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry {
        &self.inner.carts
    }

    /// The catalog collaborator.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.inner.catalog.as_ref()
    }

    /// The snapshot store, for readiness probing.
    #[must_use]
    pub fn store(&self) -> &dyn CartStore {
        self.inner.store.as_ref()
    }

    /// The shipping step-function policy.
    #[must_use]
    pub fn shipping(&self) -> &ShippingPolicy {
        &self.inner.shipping
    }
}
