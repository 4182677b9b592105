//! Per-product cost analysis, the price simulator, and the recipe editor's
//! live cost preview.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculator::{
    CostBreakdown, cost_breakdown, profitability_status, real_margin, suggested_price, unit_cost,
    unit_costs,
};
use crate::snapshot::CostingSnapshot;
use crate::types::{Product, ProductId, ProfitabilityStatus, Recipe, RecipeId};

/// Costing of one product through its active recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostAnalysis {
    pub recipe_id: RecipeId,
    pub batch_yield: Decimal,
    pub direct_cost: Decimal,
    pub direct_unit_cost: Decimal,
    pub indirect_unit_cost: Decimal,
    pub total_unit_cost: Decimal,
    pub suggested_price: Decimal,
    pub current_price: Decimal,
    pub real_margin: Decimal,
    pub target_margin: Option<Decimal>,
    pub status: ProfitabilityStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnalysisOutcome {
    /// The product has no active recipe and cannot be costed.
    WithoutRecipe,
    Costed(CostAnalysis),
}

/// One row of the analysis table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAnalysis {
    pub product_id: ProductId,
    pub product_name: String,
    pub outcome: AnalysisOutcome,
}

impl ProductAnalysis {
    #[must_use]
    pub const fn costing(&self) -> Option<&CostAnalysis> {
        match &self.outcome {
            AnalysisOutcome::Costed(analysis) => Some(analysis),
            AnalysisOutcome::WithoutRecipe => None,
        }
    }

    /// Table rank: losses, low margins, profitable, then uncosted products.
    fn rank(&self) -> u8 {
        match self.costing().map(|a| a.status) {
            Some(ProfitabilityStatus::Loss) => 0,
            Some(ProfitabilityStatus::LowMargin) => 1,
            Some(ProfitabilityStatus::Profitable) => 2,
            None => 3,
        }
    }
}

#[must_use]
pub fn analyze_product(
    product: &Product,
    snapshot: &CostingSnapshot,
    indirect_cost_per_product: Decimal,
) -> ProductAnalysis {
    let outcome = match snapshot.active_recipe_for(&product.id) {
        None => AnalysisOutcome::WithoutRecipe,
        Some(recipe) => {
            let costs = unit_costs(
                recipe,
                &snapshot.price_book(),
                &snapshot.labor_roles,
                indirect_cost_per_product,
            );
            let margin = real_margin(product.price, costs.total_unit_cost);
            AnalysisOutcome::Costed(CostAnalysis {
                recipe_id: recipe.id.clone(),
                batch_yield: recipe.batch_yield,
                direct_cost: costs.direct_cost,
                direct_unit_cost: costs.direct_unit_cost,
                indirect_unit_cost: costs.indirect_unit_cost,
                total_unit_cost: costs.total_unit_cost,
                suggested_price: suggested_price(costs.total_unit_cost, product.target_margin),
                current_price: product.price,
                real_margin: margin,
                target_margin: product.target_margin,
                status: profitability_status(margin, product.target_margin),
            })
        }
    };

    ProductAnalysis {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        outcome,
    }
}

/// Analyze every active product, in table order.
#[must_use]
pub fn analyze_products(snapshot: &CostingSnapshot, indirect_cost_per_product: Decimal) -> Vec<ProductAnalysis> {
    let mut rows: Vec<ProductAnalysis> = snapshot
        .active_products()
        .map(|product| analyze_product(product, snapshot, indirect_cost_per_product))
        .collect();

    rows.sort_by(|a, b| {
        a.rank().cmp(&b.rank()).then_with(|| match (a.costing(), b.costing()) {
            (Some(left), Some(right)) => left.real_margin.cmp(&right.real_margin),
            _ => Ordering::Equal,
        })
    });
    rows
}

/// Outcome of trying a candidate price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSimulation {
    pub new_price: Decimal,
    pub new_margin: Decimal,
    /// New margin minus the margin at the current price.
    pub margin_change: Decimal,
    pub price_change: Decimal,
    /// Only present when the product has a target margin.
    pub status: Option<ProfitabilityStatus>,
}

/// Evaluate `new_price` against the product's current costing.
///
/// Returns `None` for a non-positive candidate price.
#[must_use]
pub fn simulate_price(
    total_unit_cost: Decimal,
    current_price: Decimal,
    target_margin: Option<Decimal>,
    new_price: Decimal,
) -> Option<PriceSimulation> {
    if new_price <= Decimal::ZERO {
        return None;
    }
    let new_margin = real_margin(new_price, total_unit_cost);
    let current_margin = real_margin(current_price, total_unit_cost);
    let status = super::calculator::effective_target(target_margin)
        .map(|_| profitability_status(new_margin, target_margin));

    Some(PriceSimulation {
        new_price,
        new_margin,
        margin_change: new_margin.saturating_sub(current_margin),
        price_change: new_price.saturating_sub(current_price),
        status,
    })
}

/// Live figures shown while a recipe is edited.
///
/// Overhead is not included; these are direct costs only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCostPreview {
    pub breakdown: CostBreakdown,
    pub direct_cost: Decimal,
    pub direct_unit_cost: Decimal,
    /// Present when the output product has a positive target margin.
    pub suggested_price: Option<Decimal>,
    /// Present when the output product has a positive price.
    pub current_price: Option<Decimal>,
    pub real_margin: Option<Decimal>,
}

/// Preview the cost of a recipe, which need not be saved yet.
#[must_use]
pub fn preview_recipe(recipe: &Recipe, snapshot: &CostingSnapshot) -> RecipeCostPreview {
    let breakdown = cost_breakdown(recipe, &snapshot.price_book(), &snapshot.labor_roles);
    let direct_cost = breakdown.direct_cost();
    let direct_unit_cost = unit_cost(direct_cost, recipe.batch_yield);
    let product = snapshot.products.get(&recipe.product_id);

    let suggested = product
        .and_then(|p| p.target_margin)
        .filter(|margin| *margin > Decimal::ZERO)
        .map(|margin| suggested_price(direct_unit_cost, Some(margin)));
    let current_price = product.map(|p| p.price).filter(|price| *price > Decimal::ZERO);

    RecipeCostPreview {
        breakdown,
        direct_cost,
        direct_unit_cost,
        suggested_price: suggested,
        current_price,
        real_margin: current_price.map(|price| real_margin(price, direct_unit_cost)),
    }
}
