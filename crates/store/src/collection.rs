//! Typed access to one collection.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use costeo_core::snapshot::{Keyed, collections};
use costeo_core::{IndirectCost, Input, LaborRole, Product, Recipe, normalize_collection};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::StoreError;
use crate::backend::Backend;

/// An entity stored in a named collection.
pub trait Entity: Keyed + Serialize + Send + Sync + 'static {
    /// Remote collection name.
    const COLLECTION: &'static str;
    /// Human-readable entity kind, used in errors.
    const KIND: &'static str;

    /// Check the entity before it is written.
    ///
    /// # Errors
    ///
    /// Returns the first validation rule the entity violates.
    fn check(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

macro_rules! impl_entity {
    ($entity:ty, $collection:expr, $kind:literal) => {
        impl Entity for $entity {
            const COLLECTION: &'static str = $collection;
            const KIND: &'static str = $kind;

            fn check(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
                self.validate().map_err(Into::into)
            }
        }
    };
}

impl_entity!(Product, collections::PRODUCTS, "product");
impl_entity!(Input, collections::INPUTS, "input");
impl_entity!(Recipe, collections::RECIPES, "recipe");
impl_entity!(LaborRole, collections::LABOR_ROLES, "labor role");
impl_entity!(IndirectCost, collections::INDIRECT_COSTS, "indirect cost");

/// ID-keyed map of a whole collection.
pub type EntityMap<E> = BTreeMap<<E as Keyed>::Id, E>;

fn normalize<E: Entity>(value: Value) -> Result<EntityMap<E>, StoreError> {
    normalize_collection(value).map_err(|source| StoreError::Malformed {
        collection: E::COLLECTION,
        source,
    })
}

/// Typed view of one collection on a [`Backend`].
pub struct Collection<E, B> {
    backend: Arc<B>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, B> Clone for Collection<E, B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _entity: PhantomData,
        }
    }
}

impl<E, B> std::fmt::Debug for Collection<E, B>
where
    E: Entity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("path", &E::COLLECTION)
            .finish_non_exhaustive()
    }
}

impl<E: Entity, B: Backend> Collection<E, B> {
    #[must_use]
    pub const fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            _entity: PhantomData,
        }
    }

    /// Every entity, keyed by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the collection is malformed.
    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    pub async fn get_all(&self) -> Result<EntityMap<E>, StoreError> {
        let entities = normalize::<E>(self.backend.fetch(E::COLLECTION).await?)?;
        debug!(count = entities.len(), "Loaded collection");
        Ok(entities)
    }

    /// One entity, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the entity is malformed.
    pub async fn get_by_id(&self, id: &E::Id) -> Result<Option<E>, StoreError>
    where
        E::Id: AsRef<str>,
    {
        let mut value = self.backend.fetch_one(E::COLLECTION, id.as_ref()).await?;
        match &mut value {
            Value::Null => return Ok(None),
            Value::Object(fields) => {
                fields.insert("id".to_owned(), Value::String(id.as_ref().to_owned()));
            }
            _ => {}
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Watch the collection.
    ///
    /// The first [`CollectionWatch::next`] yields the current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start watching.
    pub async fn watch(&self) -> Result<CollectionWatch<E>, StoreError> {
        let receiver = self.backend.watch(E::COLLECTION).await?;
        Ok(CollectionWatch {
            receiver,
            primed: false,
            _entity: PhantomData,
        })
    }

    /// Call `callback` with the current contents and again on every change.
    ///
    /// Dropping the returned [`Subscription`] (or calling
    /// [`Subscription::unsubscribe`]) stops the callbacks.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start watching.
    pub async fn on_value<F>(&self, mut callback: F) -> Result<Subscription, StoreError>
    where
        F: FnMut(Result<EntityMap<E>, StoreError>) + Send + 'static,
    {
        let mut watch = self.watch().await?;
        let task = tokio::spawn(async move {
            while let Some(update) = watch.next().await {
                callback(update);
            }
            debug!(collection = E::COLLECTION, "Subscription ended");
        });
        Ok(Subscription { task })
    }

    /// Validate and store a new entity. Any `id` on it is ignored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the entity is invalid, or an error
    /// if the write fails.
    #[instrument(skip(self, entity), fields(collection = E::COLLECTION))]
    pub async fn create(&self, entity: &E) -> Result<String, StoreError> {
        let body = Self::body(entity)?;
        self.backend.push(E::COLLECTION, body).await
    }

    /// Validate and overwrite the stored fields of an entity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the entity is invalid, or an error
    /// if the write fails.
    #[instrument(skip(self, entity), fields(collection = E::COLLECTION))]
    pub async fn update(&self, id: &str, entity: &E) -> Result<(), StoreError> {
        let body = Self::body(entity)?;
        self.backend.patch(E::COLLECTION, id, body).await
    }

    /// Delete an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.backend.remove(E::COLLECTION, id).await
    }

    /// Validated wire body without the `id` field.
    fn body(entity: &E) -> Result<Value, StoreError> {
        entity.check().map_err(|source| StoreError::Validation {
            entity: E::KIND,
            source,
        })?;
        let mut body = serde_json::to_value(entity)?;
        if let Value::Object(fields) = &mut body {
            fields.remove("id");
        }
        Ok(body)
    }
}

/// Stream of normalized collection contents.
pub struct CollectionWatch<E> {
    receiver: watch::Receiver<Value>,
    primed: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> CollectionWatch<E> {
    /// Wait for the next contents of the collection.
    ///
    /// The first call returns immediately with the current contents.
    /// Returns `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<Result<EntityMap<E>, StoreError>> {
        if self.primed {
            self.receiver.changed().await.ok()?;
        }
        self.primed = true;
        let value = self.receiver.borrow_and_update().clone();
        let update = normalize::<E>(value);
        if let Err(e) = &update {
            warn!(collection = E::COLLECTION, error = %e, "Received malformed collection");
        }
        Some(update)
    }
}

/// Handle to an [`Collection::on_value`] callback.
///
/// The callback stops when this handle is dropped.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stop the callback.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
