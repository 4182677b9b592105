//! All five collections behind one backend.

use std::sync::Arc;

use costeo_core::{CostingSnapshot, IndirectCost, Input, LaborRole, Product, Recipe};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::StoreError;
use crate::backend::Backend;
use crate::collection::{Collection, Entity};

/// The costing data set.
pub struct Store<B> {
    backend: Arc<B>,
    pub products: Collection<Product, B>,
    /// Standalone inputs (legacy model).
    pub inputs: Collection<Input, B>,
    pub recipes: Collection<Recipe, B>,
    pub labor_roles: Collection<LaborRole, B>,
    pub indirect_costs: Collection<IndirectCost, B>,
}

impl<B> Clone for Store<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            products: self.products.clone(),
            inputs: self.inputs.clone(),
            recipes: self.recipes.clone(),
            labor_roles: self.labor_roles.clone(),
            indirect_costs: self.indirect_costs.clone(),
        }
    }
}

impl<B: std::fmt::Debug> std::fmt::Debug for Store<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Store<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        let backend = Arc::new(backend);
        Self {
            products: Collection::new(Arc::clone(&backend)),
            inputs: Collection::new(Arc::clone(&backend)),
            recipes: Collection::new(Arc::clone(&backend)),
            labor_roles: Collection::new(Arc::clone(&backend)),
            indirect_costs: Collection::new(Arc::clone(&backend)),
            backend,
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Wait until the backend can serve requests.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotReady` if the backend does not answer in time.
    pub async fn ready(&self) -> Result<(), StoreError> {
        self.backend.ready().await
    }

    /// Fetch every collection concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or normalization error.
    #[instrument(skip(self))]
    pub async fn load_snapshot(&self) -> Result<CostingSnapshot, StoreError> {
        let (products, inputs, recipes, labor_roles, indirect_costs) = tokio::try_join!(
            self.products.get_all(),
            self.inputs.get_all(),
            self.recipes.get_all(),
            self.labor_roles.get_all(),
            self.indirect_costs.get_all(),
        )?;
        info!(
            products = products.len(),
            inputs = inputs.len(),
            recipes = recipes.len(),
            labor_roles = labor_roles.len(),
            indirect_costs = indirect_costs.len(),
            "Loaded snapshot"
        );
        Ok(CostingSnapshot {
            products,
            inputs,
            recipes,
            labor_roles,
            indirect_costs,
        })
    }

    /// Watch every collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start watching.
    pub async fn watch(&self) -> Result<SnapshotWatcher<B>, StoreError> {
        let (products, inputs, recipes, labor_roles, indirect_costs) = tokio::try_join!(
            self.backend.watch(Product::COLLECTION),
            self.backend.watch(Input::COLLECTION),
            self.backend.watch(Recipe::COLLECTION),
            self.backend.watch(LaborRole::COLLECTION),
            self.backend.watch(IndirectCost::COLLECTION),
        )?;
        Ok(SnapshotWatcher {
            store: self.clone(),
            receivers: [products, inputs, recipes, labor_roles, indirect_costs],
            primed: false,
        })
    }
}

/// Yields a fresh snapshot whenever any collection changes.
///
/// Every update re-fetches all collections; nothing is patched in place.
pub struct SnapshotWatcher<B> {
    store: Store<B>,
    receivers: [watch::Receiver<Value>; 5],
    primed: bool,
}

impl<B: Backend> SnapshotWatcher<B> {
    /// Wait for the next snapshot.
    ///
    /// The first call returns the current snapshot immediately. Changes that
    /// land while a snapshot is being fetched are folded into the next one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Closed` if a collection's publisher went away, or
    /// the error from re-fetching.
    pub async fn next(&mut self) -> Result<CostingSnapshot, StoreError> {
        if self.primed {
            self.changed().await?;
        }
        self.primed = true;
        for receiver in &mut self.receivers {
            receiver.borrow_and_update();
        }
        self.store.load_snapshot().await
    }

    async fn changed(&mut self) -> Result<(), StoreError> {
        let [products, inputs, recipes, labor_roles, indirect_costs] = &mut self.receivers;
        let (result, collection) = tokio::select! {
            r = products.changed() => (r, Product::COLLECTION),
            r = inputs.changed() => (r, Input::COLLECTION),
            r = recipes.changed() => (r, Recipe::COLLECTION),
            r = labor_roles.changed() => (r, LaborRole::COLLECTION),
            r = indirect_costs.changed() => (r, IndirectCost::COLLECTION),
        };
        result.map_err(|_| StoreError::Closed(collection.to_owned()))?;
        debug!(collection, "Collection changed");
        Ok(())
    }
}
