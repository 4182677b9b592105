//! In-process backend.
//!
//! Holds the whole database in memory. Used by the CLI when it runs against
//! a snapshot file, and by tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{Mutex, watch};
use tracing::{debug, instrument};

use crate::StoreError;
use crate::backend::{Backend, merge_patch};

type Entries = Map<String, Value>;

/// A [`Backend`] backed by in-memory JSON objects, one per collection.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    collections: BTreeMap<String, Entries>,
    watchers: HashMap<String, watch::Sender<Value>>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend").finish_non_exhaustive()
    }
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend seeded with a database document: an object keyed by
    /// collection name.
    ///
    /// Each collection may be an object keyed by ID or an array of entities
    /// carrying their own `id`; array elements without one are dropped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidDocument` if the document or one of its
    /// collections has any other shape.
    pub fn from_document(document: Value) -> Result<Self, StoreError> {
        let tree = match document {
            Value::Null => Map::new(),
            Value::Object(tree) => tree,
            _ => {
                return Err(StoreError::InvalidDocument(
                    "expected an object keyed by collection name".to_string(),
                ));
            }
        };

        let mut collections = BTreeMap::new();
        for (name, value) in tree {
            let entries = match value {
                Value::Null => Entries::new(),
                Value::Object(entries) => entries,
                Value::Array(items) => keyed_by_id(items),
                _ => {
                    return Err(StoreError::InvalidDocument(format!(
                        "collection {name} must be an object or an array"
                    )));
                }
            };
            collections.insert(name, entries);
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                collections,
                watchers: HashMap::new(),
            })),
        })
    }

    /// The whole database as one document.
    pub async fn document(&self) -> Value {
        let inner = self.inner.lock().await;
        inner
            .collections
            .iter()
            .map(|(name, entries)| (name.clone(), Value::Object(entries.clone())))
            .collect::<Entries>()
            .into()
    }
}

fn keyed_by_id(items: Vec<Value>) -> Entries {
    let mut entries = Entries::new();
    for item in items {
        let id = item.get("id").and_then(Value::as_str).map(str::to_owned);
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            entries.insert(id, item);
        }
    }
    entries
}

impl MemoryInner {
    fn collection(&self, path: &str) -> Value {
        self.collections
            .get(path)
            .map_or(Value::Null, |entries| Value::Object(entries.clone()))
    }

    fn collection_mut(&mut self, path: &str) -> &mut Entries {
        self.collections.entry(path.to_owned()).or_default()
    }

    fn publish(&mut self, path: &str) {
        let value = self.collection(path);
        if let Some(sender) = self.watchers.get(path) {
            if sender.is_closed() {
                self.watchers.remove(path);
            } else {
                sender.send_replace(value);
            }
        }
    }
}

impl Backend for MemoryBackend {
    async fn ready(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn fetch(&self, path: &str) -> Result<Value, StoreError> {
        Ok(self.inner.lock().await.collection(path))
    }

    async fn fetch_one(&self, path: &str, id: &str) -> Result<Value, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .collections
            .get(path)
            .and_then(|entries| entries.get(id))
            .cloned()
            .unwrap_or(Value::Null))
    }

    #[instrument(skip(self, value))]
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut inner = self.inner.lock().await;
        inner.collection_mut(path).insert(id.clone(), value);
        inner.publish(path);
        debug!(id = %id, "Entity created");
        Ok(id)
    }

    #[instrument(skip(self, value))]
    async fn patch(&self, path: &str, id: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let entity = inner
            .collection_mut(path)
            .entry(id.to_owned())
            .or_insert(Value::Null);
        merge_patch(entity, value);
        inner.publish(path);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.collection_mut(path).remove(id).is_some() {
            inner.publish(path);
        }
        Ok(())
    }

    async fn watch(&self, path: &str) -> Result<watch::Receiver<Value>, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(sender) = inner.watchers.get(path)
            && !sender.is_closed()
        {
            return Ok(sender.subscribe());
        }
        let (sender, receiver) = watch::channel(inner.collection(path));
        inner.watchers.insert(path.to_owned(), sender);
        Ok(receiver)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_push_patch_remove() {
        let backend = MemoryBackend::new();
        let id = backend
            .push("products", json!({"name": "Pan", "price": 2}))
            .await
            .unwrap();
        assert_eq!(backend.fetch_one("products", &id).await.unwrap()["name"], json!("Pan"));

        backend.patch("products", &id, json!({"price": 3})).await.unwrap();
        assert_eq!(backend.fetch_one("products", &id).await.unwrap()["price"], json!(3));

        backend.remove("products", &id).await.unwrap();
        assert_eq!(backend.fetch_one("products", &id).await.unwrap(), Value::Null);
        assert_eq!(backend.fetch("products").await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_missing_collection_is_null() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.fetch("recipes").await.unwrap(), Value::Null);
        assert_eq!(backend.fetch_one("recipes", "r1").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_array_seed_is_keyed_by_id() {
        let backend = MemoryBackend::from_document(json!({
            "laborRoles": [{"id": "l1", "name": "Panadero", "hourlyCost": 20}, null]
        }))
        .unwrap();
        assert_eq!(
            backend.fetch_one("laborRoles", "l1").await.unwrap()["hourlyCost"],
            json!(20)
        );

        backend
            .patch("laborRoles", "l1", json!({"hourlyCost": 22}))
            .await
            .unwrap();
        let document = backend.document().await;
        assert_eq!(document["laborRoles"]["l1"]["hourlyCost"], json!(22));
    }

    #[tokio::test]
    async fn test_watch_sees_mutations() {
        let backend = MemoryBackend::new();
        let mut receiver = backend.watch("indirectCosts").await.unwrap();
        assert_eq!(*receiver.borrow(), Value::Null);

        backend
            .push("indirectCosts", json!({"name": "Luz", "monthlyAmount": 50}))
            .await
            .unwrap();
        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow_and_update().as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_malformed_documents() {
        assert!(MemoryBackend::from_document(json!([1, 2])).is_err());
        assert!(MemoryBackend::from_document(json!({"products": 3})).is_err());
    }
}
