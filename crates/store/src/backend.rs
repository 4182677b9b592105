//! The storage seam every collection talks through.

use std::future::Future;

use serde_json::Value;
use tokio::sync::watch;

use crate::StoreError;

/// A JSON tree addressed by collection path and entity ID.
///
/// Paths are collection names relative to the backend's root. A missing
/// collection or entity reads as `Value::Null`.
pub trait Backend: Send + Sync + 'static {
    /// Resolve once the backend can serve requests.
    fn ready(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read a whole collection.
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Value, StoreError>> + Send;

    /// Read one entity.
    fn fetch_one(&self, path: &str, id: &str) -> impl Future<Output = Result<Value, StoreError>> + Send;

    /// Append an entity under a generated key and return the key.
    fn push(&self, path: &str, value: Value) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Shallow-merge `value` into an entity. `null` fields are removed.
    fn patch(&self, path: &str, id: &str, value: Value) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete an entity. Deleting a missing entity succeeds.
    fn remove(&self, path: &str, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Subscribe to a collection.
    ///
    /// The receiver starts at the current value and sees every later change.
    /// Publication stops once every receiver for the path is dropped.
    fn watch(&self, path: &str) -> impl Future<Output = Result<watch::Receiver<Value>, StoreError>> + Send;
}

/// Merge `patch` into `target` the way the realtime database does: top-level
/// keys are replaced, `null` removes the key.
pub(crate) fn merge_patch(target: &mut Value, patch: Value) {
    let Value::Object(fields) = patch else {
        *target = patch;
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(existing) = target {
        for (key, value) in fields {
            if value.is_null() {
                existing.remove(&key);
            } else {
                existing.insert(key, value);
            }
        }
    }
}
