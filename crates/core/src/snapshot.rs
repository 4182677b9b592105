//! Read-only snapshots of the remote collections.
//!
//! The data store hands collections back either as arrays of entities or as
//! objects keyed by ID. [`normalize_collection`] turns both into a `BTreeMap`
//! keyed by the typed ID, so every lookup and every "first match" the engine
//! performs iterates in ascending ID order no matter how the snapshot arrived.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::types::{
    IndirectCost, IndirectCostId, Input, InputId, LaborRole, LaborRoleId, Product, ProductId,
    Recipe, RecipeId,
};

pub type Products = BTreeMap<ProductId, Product>;
pub type Inputs = BTreeMap<InputId, Input>;
pub type Recipes = BTreeMap<RecipeId, Recipe>;
pub type LaborRoles = BTreeMap<LaborRoleId, LaborRole>;
pub type IndirectCosts = BTreeMap<IndirectCostId, IndirectCost>;

/// An entity that lives in an ID-keyed collection.
pub trait Keyed: DeserializeOwned {
    /// The typed identifier.
    type Id: Ord + Clone + From<String> + Send + Sync + 'static;

    /// Returns the entity's ID.
    fn key(&self) -> &Self::Id;
}

macro_rules! impl_keyed {
    ($entity:ty, $id:ty) => {
        impl Keyed for $entity {
            type Id = $id;

            fn key(&self) -> &Self::Id {
                &self.id
            }
        }
    };
}

impl_keyed!(Product, ProductId);
impl_keyed!(Input, InputId);
impl_keyed!(Recipe, RecipeId);
impl_keyed!(LaborRole, LaborRoleId);
impl_keyed!(IndirectCost, IndirectCostId);

/// Errors that can occur when normalizing a raw collection.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The collection is neither null, an array, nor an object.
    #[error("collection must be an array or an object, got {0}")]
    UnexpectedShape(&'static str),
    /// An entry keyed by ID is not an object.
    #[error("entry {key} is not an object")]
    NotAnObject {
        /// Key (or array index) of the offending entry.
        key: String,
    },
    /// An entry could not be decoded into the entity type.
    #[error("entry {key} is malformed: {source}")]
    Malformed {
        /// Key (or array index) of the offending entry.
        key: String,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
}

const fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize a raw collection into an ID-keyed map.
///
/// - `null` yields an empty map.
/// - Arrays: `null` elements and elements without a non-empty `id` are skipped.
/// - Objects: each key is the entity ID and overrides any embedded `id`;
///   `null` values are skipped.
///
/// # Errors
///
/// Returns an error if the collection has an unexpected shape or an entry
/// cannot be decoded.
pub fn normalize_collection<E: Keyed>(value: Value) -> Result<BTreeMap<E::Id, E>, NormalizeError> {
    let mut entities = BTreeMap::new();

    match value {
        Value::Null => {}
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                let has_id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| !id.is_empty());
                if !has_id {
                    continue;
                }
                let entity: E = serde_json::from_value(item).map_err(|source| {
                    NormalizeError::Malformed {
                        key: index.to_string(),
                        source,
                    }
                })?;
                entities.insert(entity.key().clone(), entity);
            }
        }
        Value::Object(entries) => {
            for (key, mut item) in entries {
                match &mut item {
                    Value::Null => continue,
                    Value::Object(fields) => {
                        fields.insert("id".to_owned(), Value::String(key.clone()));
                    }
                    _ => return Err(NormalizeError::NotAnObject { key }),
                }
                let entity: E = serde_json::from_value(item)
                    .map_err(|source| NormalizeError::Malformed { key, source })?;
                entities.insert(entity.key().clone(), entity);
            }
        }
        other => return Err(NormalizeError::UnexpectedShape(shape_name(&other))),
    }

    Ok(entities)
}

/// Collection names as stored remotely.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const INPUTS: &str = "inputs";
    pub const RECIPES: &str = "recipes";
    pub const LABOR_ROLES: &str = "laborRoles";
    pub const INDIRECT_COSTS: &str = "indirectCosts";
}

/// Everything the engine needs, captured at one point in time.
///
/// Serializes to the same document shape [`CostingSnapshot::from_document`]
/// reads, with every collection keyed by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingSnapshot {
    pub products: Products,
    /// Standalone inputs (legacy model). Often empty.
    pub inputs: Inputs,
    pub recipes: Recipes,
    pub labor_roles: LaborRoles,
    pub indirect_costs: IndirectCosts,
}

impl CostingSnapshot {
    /// Build a snapshot from a document holding every collection under its
    /// remote name (`products`, `inputs`, `recipes`, `laborRoles`,
    /// `indirectCosts`). Missing collections are empty.
    ///
    /// # Errors
    ///
    /// Returns an error if any collection fails to normalize.
    pub fn from_document(document: &Value) -> Result<Self, NormalizeError> {
        let take = |name: &str| document.get(name).cloned().unwrap_or(Value::Null);
        Ok(Self {
            products: normalize_collection(take(collections::PRODUCTS))?,
            inputs: normalize_collection(take(collections::INPUTS))?,
            recipes: normalize_collection(take(collections::RECIPES))?,
            labor_roles: normalize_collection(take(collections::LABOR_ROLES))?,
            indirect_costs: normalize_collection(take(collections::INDIRECT_COSTS))?,
        })
    }

    /// Recipes that participate in costing.
    pub fn active_recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values().filter(|r| r.active)
    }

    /// Products that are currently sold.
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.values().filter(|p| p.active)
    }

    /// Products flagged as usable recipe inputs.
    pub fn input_products(&self) -> impl Iterator<Item = &Product> {
        self.products.values().filter(|p| p.es_insumo)
    }

    /// The active recipe used to cost `product_id`: the first active recipe
    /// in ascending recipe-ID order.
    #[must_use]
    pub fn active_recipe_for(&self, product_id: &ProductId) -> Option<&Recipe> {
        self.active_recipes().find(|r| &r.product_id == product_id)
    }

    /// Price lookup over this snapshot's products and inputs.
    #[must_use]
    pub const fn price_book(&self) -> crate::PriceBook<'_> {
        crate::PriceBook::new(&self.products, &self.inputs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_null_is_empty() {
        let products: Products = normalize_collection(Value::Null).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn test_object_keys_become_ids() {
        let products: Products = normalize_collection(json!({
            "-b": {"name": "Pan", "price": 2},
            "-a": {"id": "stale", "name": "Torta", "price": 10},
            "-c": null
        }))
        .unwrap();
        let ids: Vec<&str> = products.keys().map(ProductId::as_str).collect();
        assert_eq!(ids, vec!["-a", "-b"]);
        assert_eq!(products[&ProductId::new("-a")].id.as_str(), "-a");
        assert_eq!(products[&ProductId::new("-b")].price, dec!(2));
    }

    #[test]
    fn test_array_skips_entries_without_id() {
        let roles: LaborRoles = normalize_collection(json!([
            null,
            {"name": "Sin id", "hourlyCost": 5},
            {"id": "", "name": "Vacío", "hourlyCost": 5},
            {"id": "r1", "name": "Panadero", "hourlyCost": 20}
        ]))
        .unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[&LaborRoleId::new("r1")].hourly_cost, dec!(20));
    }

    #[test]
    fn test_malformed_entry_names_key() {
        let result: Result<Products, _> =
            normalize_collection(json!({"p1": {"name": "Pan", "price": "not a number"}}));
        match result {
            Err(NormalizeError::Malformed { key, .. }) => assert_eq!(key, "p1"),
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_entry_is_rejected() {
        let result: Result<Products, _> = normalize_collection(json!({"p1": 3}));
        assert!(matches!(result, Err(NormalizeError::NotAnObject { .. })));

        let result: Result<Products, _> = normalize_collection(json!("nope"));
        assert!(matches!(result, Err(NormalizeError::UnexpectedShape(_))));
    }

    #[test]
    fn test_active_recipe_for_takes_lowest_id() {
        let snapshot = CostingSnapshot::from_document(&json!({
            "recipes": {
                "r2": {"productId": "p1", "batchYield": 5},
                "r1": {"productId": "p1", "batchYield": 10},
                "r0": {"productId": "p1", "batchYield": 1, "active": false}
            }
        }))
        .unwrap();
        let recipe = snapshot.active_recipe_for(&ProductId::new("p1")).unwrap();
        assert_eq!(recipe.id.as_str(), "r1");
        assert!(snapshot.active_recipe_for(&ProductId::new("p2")).is_none());
    }

    #[test]
    fn test_serialized_snapshot_reads_back() {
        let document = json!({
            "products": {"p1": {"name": "Pan", "price": 4.5, "targetMargin": 30}},
            "laborRoles": [{"id": "l1", "name": "Panadero", "hourlyCost": 20}]
        });
        let snapshot = CostingSnapshot::from_document(&document).unwrap();
        let written = serde_json::to_value(&snapshot).unwrap();

        assert!(written["laborRoles"]["l1"].is_object());
        assert_eq!(CostingSnapshot::from_document(&written).unwrap(), snapshot);
    }

    #[test]
    fn test_input_products_filter() {
        let snapshot = CostingSnapshot::from_document(&json!({
            "products": {
                "p1": {"name": "Harina", "price": 0, "cost": 1.2, "esInsumo": true},
                "p2": {"name": "Pan", "price": 3}
            }
        }))
        .unwrap();
        let names: Vec<&str> = snapshot.input_products().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Harina"]);
    }
}
