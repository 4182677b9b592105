//! Monthly overhead allocation.
//!
//! All indirect costs are pooled and split equally across the products that
//! have at least one active recipe. The per-record proration method is kept
//! for display only and does not weight the split.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculator::saturating_sum;
use crate::snapshot::CostingSnapshot;
use crate::types::{IndirectCost, Recipe};

/// Number of distinct products with at least one active recipe.
#[must_use]
pub fn products_with_recipes_count<'a>(recipes: impl IntoIterator<Item = &'a Recipe>) -> usize {
    recipes
        .into_iter()
        .filter(|recipe| recipe.active)
        .map(|recipe| &recipe.product_id)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Sum of every indirect cost's monthly amount.
#[must_use]
pub fn total_monthly_overhead<'a>(indirect_costs: impl IntoIterator<Item = &'a IndirectCost>) -> Decimal {
    saturating_sum(indirect_costs.into_iter().map(|cost| cost.monthly_amount))
}

/// Equal share of the total overhead per product with recipes.
#[must_use]
pub fn indirect_cost_per_product<'a>(
    indirect_costs: impl IntoIterator<Item = &'a IndirectCost>,
    products_with_recipes: usize,
) -> Decimal {
    if products_with_recipes == 0 {
        return Decimal::ZERO;
    }
    total_monthly_overhead(indirect_costs) / Decimal::from(products_with_recipes)
}

/// Overhead allocation for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub products_with_recipes: usize,
    pub total_overhead: Decimal,
    pub per_product: Decimal,
}

impl Allocation {
    #[must_use]
    pub fn from_snapshot(snapshot: &CostingSnapshot) -> Self {
        let products_with_recipes = products_with_recipes_count(snapshot.recipes.values());
        Self {
            products_with_recipes,
            total_overhead: total_monthly_overhead(snapshot.indirect_costs.values()),
            per_product: indirect_cost_per_product(
                snapshot.indirect_costs.values(),
                products_with_recipes,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::types::ProrationMethod;

    fn overhead() -> Vec<IndirectCost> {
        let mut gas = IndirectCost::new("c2", "Gas", dec!(90));
        gas.proration_method = ProrationMethod::Hours;
        vec![IndirectCost::new("c1", "Alquiler", dec!(300)), gas]
    }

    #[test]
    fn test_count_is_distinct_and_active_only() {
        let mut retired = Recipe::new("r4", "p3", dec!(1));
        retired.active = false;
        let recipes = [
            Recipe::new("r1", "p1", dec!(10)),
            Recipe::new("r2", "p1", dec!(5)),
            Recipe::new("r3", "p2", dec!(1)),
            retired,
        ];
        assert_eq!(products_with_recipes_count(&recipes), 2);
    }

    #[test]
    fn test_equal_split_ignores_proration_method() {
        let costs = overhead();
        assert_eq!(total_monthly_overhead(&costs), dec!(390));
        assert_eq!(indirect_cost_per_product(&costs, 3), dec!(130));
    }

    #[test]
    fn test_no_products_means_no_allocation() {
        assert_eq!(indirect_cost_per_product(&overhead(), 0), dec!(0));
        assert_eq!(indirect_cost_per_product(&Vec::<IndirectCost>::new(), 4), dec!(0));
    }

    #[test]
    fn test_overhead_total_saturates() {
        let mut costs = overhead();
        costs.push(IndirectCost::new("c3", "Maquinaria", Decimal::MAX));
        assert_eq!(total_monthly_overhead(&costs), Decimal::MAX);
        assert_eq!(indirect_cost_per_product(&costs, 1), Decimal::MAX);
    }

    #[test]
    fn test_from_snapshot() {
        let mut snapshot = CostingSnapshot::default();
        for cost in overhead() {
            snapshot.indirect_costs.insert(cost.id.clone(), cost);
        }
        let recipe = Recipe::new("r1", "p1", dec!(10));
        snapshot.recipes.insert(recipe.id.clone(), recipe);

        let allocation = Allocation::from_snapshot(&snapshot);
        assert_eq!(allocation.products_with_recipes, 1);
        assert_eq!(allocation.total_overhead, dec!(390));
        assert_eq!(allocation.per_product, dec!(390));
    }
}
