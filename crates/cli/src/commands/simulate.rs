//! Try a candidate selling price for a product.
//!
//! # Usage
//!
//! ```bash
//! costeo simulate --product p1 --price 5.20
//! ```

use std::io::Write;

use costeo_core::engine::Allocation;
use costeo_core::engine::analysis::{PriceSimulation, analyze_product, simulate_price};
use costeo_core::{CostingSnapshot, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;

use super::render::{money, percent, points};
use super::{CommandError, Format, write_json};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationReport<'a> {
    product_id: &'a ProductId,
    product_name: &'a str,
    total_unit_cost: Decimal,
    current_price: Decimal,
    current_margin: Decimal,
    #[serde(flatten)]
    simulation: PriceSimulation,
}

/// Evaluate `new_price` for `product_id` against its current costing.
///
/// # Errors
///
/// Returns an error if the product does not exist or has no active recipe,
/// if `new_price` is not positive, or if the report cannot be written.
pub fn run(
    out: &mut impl Write,
    snapshot: &CostingSnapshot,
    product_id: &ProductId,
    new_price: Decimal,
    format: Format,
) -> Result<(), CommandError> {
    let product = snapshot
        .products
        .get(product_id)
        .ok_or_else(|| CommandError::ProductNotFound(product_id.to_string()))?;
    let allocation = Allocation::from_snapshot(snapshot);
    let analysis = analyze_product(product, snapshot, allocation.per_product);
    let costing = analysis
        .costing()
        .ok_or_else(|| CommandError::NoActiveRecipe(product_id.to_string()))?;
    let simulation = simulate_price(
        costing.total_unit_cost,
        costing.current_price,
        costing.target_margin,
        new_price,
    )
    .ok_or(CommandError::InvalidPrice(new_price))?;

    if format == Format::Json {
        return write_json(
            out,
            &SimulationReport {
                product_id,
                product_name: &product.name,
                total_unit_cost: costing.total_unit_cost,
                current_price: costing.current_price,
                current_margin: costing.real_margin,
                simulation,
            },
        );
    }

    writeln!(
        out,
        "{} [{}]: unit cost {}",
        product.name,
        product.id,
        money(costing.total_unit_cost)
    )?;
    writeln!(
        out,
        "Current: {} at {} margin",
        money(costing.current_price),
        percent(costing.real_margin)
    )?;
    write!(
        out,
        "New: {} ({}) at {} margin ({})",
        money(simulation.new_price),
        money(simulation.price_change),
        percent(simulation.new_margin),
        points(simulation.margin_change),
    )?;
    if let Some(status) = simulation.status {
        write!(out, " | {}", status.label())?;
    }
    writeln!(out)?;
    Ok(())
}
