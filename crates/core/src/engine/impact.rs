//! Which inputs, labor roles and overheads drive cost the most.
//!
//! Impacts are priced at current prices, so rankings move as prices move.

use rust_decimal::Decimal;
use serde::Serialize;

use super::PriceBook;
use super::calculator::{saturating_div, saturating_sum};
use crate::snapshot::{CostingSnapshot, LaborRoles};
use crate::types::{IndirectCost, InputSource, LaborRoleId, Recipe};

/// Default length of a top-N list.
pub const DEFAULT_TOP_N: usize = 10;

/// Anything that can be ranked by its currency impact.
pub trait Impact {
    fn total_impact(&self) -> Decimal;
}

/// Cost contribution of one input across all active recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputImpact {
    pub source: InputSource,
    pub unit_price: Decimal,
    pub total_impact: Decimal,
    /// Recipes referencing the input at least once.
    pub recipe_count: usize,
}

impl Impact for InputImpact {
    fn total_impact(&self) -> Decimal {
        self.total_impact
    }
}

/// Cost contribution of one labor role across all active recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaborRoleImpact {
    pub role_id: LaborRoleId,
    pub hourly_cost: Decimal,
    pub total_impact: Decimal,
    pub total_hours: Decimal,
    pub recipe_count: usize,
}

impl Impact for LaborRoleImpact {
    fn total_impact(&self) -> Decimal {
        self.total_impact
    }
}

/// An overhead line and its share of the monthly total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndirectCostShare<'a> {
    pub cost: &'a IndirectCost,
    pub percentage: Decimal,
}

impl Impact for IndirectCostShare<'_> {
    fn total_impact(&self) -> Decimal {
        self.cost.monthly_amount
    }
}

#[must_use]
pub fn input_impact<'a>(
    source: &InputSource,
    recipes: impl IntoIterator<Item = &'a Recipe>,
    prices: &PriceBook<'_>,
) -> InputImpact {
    let unit_price = prices.unit_price(source);
    let mut impact = InputImpact {
        source: source.clone(),
        unit_price,
        total_impact: Decimal::ZERO,
        recipe_count: 0,
    };

    for recipe in recipes.into_iter().filter(|r| r.active) {
        let mut used = false;
        for line in recipe.inputs.iter().filter(|l| &l.source == source) {
            impact.total_impact = impact
                .total_impact
                .saturating_add(line.quantity.saturating_mul(unit_price));
            used = true;
        }
        if used {
            impact.recipe_count += 1;
        }
    }

    impact
}

#[must_use]
pub fn labor_role_impact<'a>(
    role_id: &LaborRoleId,
    recipes: impl IntoIterator<Item = &'a Recipe>,
    labor_roles: &LaborRoles,
) -> LaborRoleImpact {
    let hourly_cost = labor_roles
        .get(role_id)
        .map(|role| role.hourly_cost)
        .unwrap_or_default();
    let mut impact = LaborRoleImpact {
        role_id: role_id.clone(),
        hourly_cost,
        total_impact: Decimal::ZERO,
        total_hours: Decimal::ZERO,
        recipe_count: 0,
    };

    for recipe in recipes.into_iter().filter(|r| r.active) {
        let mut used = false;
        for line in recipe.labor.iter().filter(|l| &l.role_id == role_id) {
            impact.total_hours = impact.total_hours.saturating_add(line.hours);
            impact.total_impact = impact
                .total_impact
                .saturating_add(line.hours.saturating_mul(hourly_cost));
            used = true;
        }
        if used {
            impact.recipe_count += 1;
        }
    }

    impact
}

/// Sort by impact, largest first, and keep the first `n`.
///
/// The sort is stable: equal impacts keep their input order.
#[must_use]
pub fn top_n<T: Impact>(mut impacts: Vec<T>, n: usize) -> Vec<T> {
    impacts.sort_by(|a, b| b.total_impact().cmp(&a.total_impact()));
    impacts.truncate(n);
    impacts
}

/// Candidate inputs: products flagged as inputs, then standalone inputs.
fn input_candidates(snapshot: &CostingSnapshot) -> impl Iterator<Item = InputSource> + '_ {
    let products = snapshot
        .input_products()
        .map(|product| InputSource::Product(product.id.clone()));
    let inputs = snapshot
        .inputs
        .keys()
        .map(|id| InputSource::RawInput(id.clone()));
    products.chain(inputs)
}

/// The `n` inputs with the largest impact across active recipes.
#[must_use]
pub fn top_inputs(snapshot: &CostingSnapshot, n: usize) -> Vec<InputImpact> {
    let prices = snapshot.price_book();
    let impacts = input_candidates(snapshot)
        .map(|source| input_impact(&source, snapshot.recipes.values(), &prices))
        .collect();
    top_n(impacts, n)
}

/// The `n` labor roles with the largest impact across active recipes.
#[must_use]
pub fn top_labor_roles(snapshot: &CostingSnapshot, n: usize) -> Vec<LaborRoleImpact> {
    let impacts = snapshot
        .labor_roles
        .keys()
        .map(|role_id| labor_role_impact(role_id, snapshot.recipes.values(), &snapshot.labor_roles))
        .collect();
    top_n(impacts, n)
}

/// The `n` largest overheads, each with its percentage of the monthly total.
#[must_use]
pub fn top_indirect_costs<'a>(
    indirect_costs: impl IntoIterator<Item = &'a IndirectCost>,
    n: usize,
) -> Vec<IndirectCostShare<'a>> {
    let costs: Vec<&IndirectCost> = indirect_costs.into_iter().collect();
    let total = saturating_sum(costs.iter().map(|cost| cost.monthly_amount));

    let shares = costs
        .into_iter()
        .map(|cost| IndirectCostShare {
            cost,
            percentage: saturating_div(cost.monthly_amount, total).saturating_mul(Decimal::ONE_HUNDRED),
        })
        .collect();
    top_n(shares, n)
}
