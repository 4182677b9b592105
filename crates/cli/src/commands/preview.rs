//! Line-by-line direct cost of one recipe.
//!
//! Works for inactive recipes too, which is how a draft is checked before
//! it replaces the active one.
//!
//! # Usage
//!
//! ```bash
//! costeo preview r1
//!
//! # Generated IDs start with a dash
//! costeo preview -- -Nx3kQ
//! ```

use std::io::Write;

use costeo_core::engine::analysis::preview_recipe;
use costeo_core::{CostingSnapshot, RecipeId};

use super::render::{money, or_dash, percent};
use super::{CommandError, Format, write_json};

/// Write the cost preview of `recipe_id`.
///
/// # Errors
///
/// Returns an error if the recipe does not exist or the report cannot be
/// written.
pub fn run(
    out: &mut impl Write,
    snapshot: &CostingSnapshot,
    recipe_id: &RecipeId,
    format: Format,
) -> Result<(), CommandError> {
    let recipe = snapshot
        .recipes
        .get(recipe_id)
        .ok_or_else(|| CommandError::RecipeNotFound(recipe_id.to_string()))?;
    let preview = preview_recipe(recipe, snapshot);
    if format == Format::Json {
        return write_json(out, &preview);
    }

    let product_name = snapshot
        .products
        .get(&recipe.product_id)
        .map_or_else(|| recipe.product_id.as_str(), |p| p.name.as_str());
    writeln!(
        out,
        "Recipe {} for {} ({} units per batch{})",
        recipe.id,
        product_name,
        recipe.batch_yield,
        if recipe.active { "" } else { ", inactive" },
    )?;

    let prices = snapshot.price_book();
    for line in &preview.breakdown.inputs {
        let name = prices.name(&line.source).unwrap_or_else(|| line.source.id_str());
        if line.resolved {
            writeln!(
                out,
                "  {name}: {} {} x {} = {}",
                line.quantity,
                prices.unit(&line.source).unwrap_or_default(),
                money(line.unit_price),
                money(line.cost),
            )?;
        } else {
            writeln!(out, "  {name}: {} (not found, costed at $0.00)", line.quantity)?;
        }
    }
    for line in &preview.breakdown.labor {
        let name = snapshot
            .labor_roles
            .get(&line.role_id)
            .map_or_else(|| line.role_id.as_str(), |r| r.name.as_str());
        if line.resolved {
            writeln!(
                out,
                "  {name}: {} h x {} = {}",
                line.hours,
                money(line.hourly_cost),
                money(line.cost),
            )?;
        } else {
            writeln!(out, "  {name}: {} h (not found, costed at $0.00)", line.hours)?;
        }
    }

    writeln!(
        out,
        "Direct cost: {} per batch, {} per unit",
        money(preview.direct_cost),
        money(preview.direct_unit_cost),
    )?;
    writeln!(
        out,
        "Suggested price: {} | current price: {} | margin on direct cost: {}",
        or_dash(preview.suggested_price.map(money)),
        or_dash(preview.current_price.map(money)),
        or_dash(preview.real_margin.map(percent)),
    )?;
    Ok(())
}
