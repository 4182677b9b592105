//! Snapshot integrity checks.
//!
//! The engine tolerates every problem listed here (a dangling reference just
//! costs 0), so these are reported for the operator rather than enforced.

use thiserror::Error;

use crate::snapshot::CostingSnapshot;
use crate::types::{
    IndirectCostError, IndirectCostId, InputError, InputId, InputSource, LaborRoleError,
    LaborRoleId, ProductError, ProductId, RecipeError, RecipeId,
};

/// Something in a snapshot that will silently skew the figures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Problem {
    #[error("product {id}: {source}")]
    InvalidProduct { id: ProductId, source: ProductError },
    #[error("input {id}: {source}")]
    InvalidInput { id: InputId, source: InputError },
    #[error("labor role {id}: {source}")]
    InvalidLaborRole { id: LaborRoleId, source: LaborRoleError },
    #[error("indirect cost {id}: {source}")]
    InvalidIndirectCost { id: IndirectCostId, source: IndirectCostError },
    #[error("recipe {id}: {source}")]
    InvalidRecipe { id: RecipeId, source: RecipeError },
    #[error("recipe {recipe} produces unknown product {product}")]
    UnknownProduct { recipe: RecipeId, product: ProductId },
    #[error("recipe {recipe} uses unknown input {}", input.id_str())]
    UnknownInput { recipe: RecipeId, input: InputSource },
    #[error("recipe {recipe} uses unknown labor role {role}")]
    UnknownLaborRole { recipe: RecipeId, role: LaborRoleId },
    #[error("product {product} has {count} active recipes; costing uses {used}")]
    SeveralActiveRecipes {
        product: ProductId,
        count: usize,
        used: RecipeId,
    },
}

/// List every integrity problem in `snapshot`, entity by entity.
#[must_use]
pub fn check_snapshot(snapshot: &CostingSnapshot) -> Vec<Problem> {
    let mut problems = Vec::new();

    for (id, product) in &snapshot.products {
        if let Err(source) = product.validate() {
            problems.push(Problem::InvalidProduct { id: id.clone(), source });
        }
    }
    for (id, input) in &snapshot.inputs {
        if let Err(source) = input.validate() {
            problems.push(Problem::InvalidInput { id: id.clone(), source });
        }
    }
    for (id, role) in &snapshot.labor_roles {
        if let Err(source) = role.validate() {
            problems.push(Problem::InvalidLaborRole { id: id.clone(), source });
        }
    }
    for (id, cost) in &snapshot.indirect_costs {
        if let Err(source) = cost.validate() {
            problems.push(Problem::InvalidIndirectCost { id: id.clone(), source });
        }
    }

    let prices = snapshot.price_book();
    for (id, recipe) in &snapshot.recipes {
        if let Err(source) = recipe.validate() {
            problems.push(Problem::InvalidRecipe { id: id.clone(), source });
        }
        if !recipe.product_id.is_empty() && !snapshot.products.contains_key(&recipe.product_id) {
            problems.push(Problem::UnknownProduct {
                recipe: id.clone(),
                product: recipe.product_id.clone(),
            });
        }
        for line in &recipe.inputs {
            if prices.lookup(&line.source).is_none() {
                problems.push(Problem::UnknownInput {
                    recipe: id.clone(),
                    input: line.source.clone(),
                });
            }
        }
        for line in &recipe.labor {
            if !snapshot.labor_roles.contains_key(&line.role_id) {
                problems.push(Problem::UnknownLaborRole {
                    recipe: id.clone(),
                    role: line.role_id.clone(),
                });
            }
        }
    }

    for product_id in snapshot.products.keys() {
        let count = snapshot
            .active_recipes()
            .filter(|r| &r.product_id == product_id)
            .count();
        if count > 1
            && let Some(used) = snapshot.active_recipe_for(product_id)
        {
            problems.push(Problem::SeveralActiveRecipes {
                product: product_id.clone(),
                count,
                used: used.id.clone(),
            });
        }
    }

    problems
}
