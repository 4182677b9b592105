//! Costeo Core - Costing and pricing engine.
//!
//! This crate computes what a recipe-made product costs and what it should
//! sell for, for the other Costeo components:
//! - `costeo-store` - Data-access layer over the remote realtime database
//! - `costeo` (cli) - Reports, simulations and snapshot validation
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Every engine function takes a snapshot
//! by reference and returns a fresh value; none of them fail. Dangling
//! references contribute zero cost and non-positive yields or prices
//! short-circuit to zero.
//!
//! # Modules
//!
//! - [`types`] - Entities, type-safe IDs, and classification enums
//! - [`snapshot`] - Normalization of raw collections into ID-keyed maps
//! - [`engine`] - Cost calculator, overhead allocator, impact ranker, issue
//!   detector, and the derived reports built on them

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod engine;
pub mod snapshot;
pub mod types;

pub use engine::PriceBook;
pub use snapshot::{CostingSnapshot, Keyed, NormalizeError, normalize_collection};
pub use types::*;
