//! Costeo Store - Data access for the costing engine.
//!
//! Every entity lives in a remote realtime database; this crate reads and
//! writes it and turns raw collections into the typed, ID-keyed maps the
//! engine consumes.
//!
//! # Architecture
//!
//! - [`Backend`] is the storage seam: [`RealtimeDb`] talks to the remote
//!   database over REST, [`MemoryBackend`] keeps everything in process.
//! - [`Collection`] is a typed view of one collection (read, subscribe,
//!   create, update, delete).
//! - [`Store`] bundles the five collections, loads whole
//!   [`CostingSnapshot`](costeo_core::CostingSnapshot)s, and watches for
//!   changes.
//!
//! # Example
//!
//! ```no_run
//! use costeo_store::{RealtimeDb, Store, StoreConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::from_env()?;
//! let store = Store::new(RealtimeDb::new(&config)?);
//! store.ready().await?;
//! let snapshot = store.load_snapshot().await?;
//! # let _ = snapshot;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod collection;
pub mod config;
mod error;
pub mod memory;
pub mod realtime;
mod store;

pub use backend::Backend;
pub use collection::{Collection, CollectionWatch, Entity, EntityMap, Subscription};
pub use config::{ConfigError, StoreConfig};
pub use error::StoreError;
pub use memory::MemoryBackend;
pub use realtime::RealtimeDb;
pub use store::{SnapshotWatcher, Store};
