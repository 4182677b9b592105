//! Entity types for Costeo.
//!
//! All entities are owned by the remote data store; the engine only reads
//! snapshots of them.

pub mod id;
pub mod indirect;
pub mod input;
pub mod labor;
pub mod product;
pub mod recipe;
pub mod status;

pub use id::*;
pub use indirect::{IndirectCost, IndirectCostError, ProrationMethod};
pub use input::{Input, InputError};
pub use labor::{LaborRole, LaborRoleError};
pub use product::{Product, ProductError, Variant, variant_sku};
pub use recipe::{InputSource, Recipe, RecipeError, RecipeInput, RecipeLabor};
pub use status::*;
