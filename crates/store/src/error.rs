//! Store errors.

use costeo_core::NormalizeError;
use thiserror::Error;

/// Errors that can occur when reading from or writing to the data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("Database request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The database answered with a non-success status.
    #[error("Database returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A body could not be encoded or decoded.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The database URL cannot be used to build request URLs.
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    /// A database document used to seed a backend has the wrong shape.
    #[error("Invalid database document: {0}")]
    InvalidDocument(String),

    /// A collection came back in a shape that cannot be normalized.
    #[error("Malformed {collection} collection: {source}")]
    Malformed {
        collection: &'static str,
        #[source]
        source: NormalizeError,
    },

    /// An entity failed validation before being written.
    #[error("Invalid {entity}: {source}")]
    Validation {
        entity: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The database did not answer the readiness probe in time.
    #[error("Data store not ready: {0}")]
    NotReady(String),

    /// A push did not return the generated key.
    #[error("Push to {0} returned no key")]
    MissingKey(String),

    /// The publisher behind a subscription went away.
    #[error("Subscription to {0} closed")]
    Closed(String),
}
