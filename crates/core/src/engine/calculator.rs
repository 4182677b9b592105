//! Per-recipe cost and per-product margin arithmetic.
//!
//! Every function here is total: dangling references cost 0, a non-positive
//! batch yield divides to 0, and a non-positive price has a 0 margin.
//! Results that overflow the `Decimal` range clamp to `Decimal::MAX` or
//! `Decimal::MIN`.

use rust_decimal::Decimal;
use serde::Serialize;

use super::PriceBook;
use crate::snapshot::LaborRoles;
use crate::types::{InputSource, LaborRoleId, ProfitabilityStatus, Recipe};

/// Cost of one input line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputLineCost {
    pub source: InputSource,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// False when the referenced input or product does not exist.
    pub resolved: bool,
    pub cost: Decimal,
}

/// Cost of one labor line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaborLineCost {
    pub role_id: LaborRoleId,
    pub hours: Decimal,
    pub hourly_cost: Decimal,
    pub resolved: bool,
    pub cost: Decimal,
}

/// Line-by-line direct cost of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub inputs: Vec<InputLineCost>,
    pub labor: Vec<LaborLineCost>,
}

impl CostBreakdown {
    #[must_use]
    pub fn input_cost(&self) -> Decimal {
        saturating_sum(self.inputs.iter().map(|line| line.cost))
    }

    #[must_use]
    pub fn labor_cost(&self) -> Decimal {
        saturating_sum(self.labor.iter().map(|line| line.cost))
    }

    /// Input plus labor cost for the batch.
    #[must_use]
    pub fn direct_cost(&self) -> Decimal {
        self.input_cost().saturating_add(self.labor_cost())
    }

    /// Number of lines whose reference did not resolve.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        let inputs = self.inputs.iter().filter(|line| !line.resolved).count();
        let labor = self.labor.iter().filter(|line| !line.resolved).count();
        inputs + labor
    }
}

/// Price every line of `recipe` at current prices.
#[must_use]
pub fn cost_breakdown(recipe: &Recipe, prices: &PriceBook<'_>, labor_roles: &LaborRoles) -> CostBreakdown {
    let inputs = recipe
        .inputs
        .iter()
        .map(|line| {
            let unit_price = prices.lookup(&line.source);
            InputLineCost {
                source: line.source.clone(),
                quantity: line.quantity,
                unit_price: unit_price.unwrap_or_default(),
                resolved: unit_price.is_some(),
                cost: line.quantity.saturating_mul(unit_price.unwrap_or_default()),
            }
        })
        .collect();

    let labor = recipe
        .labor
        .iter()
        .map(|line| {
            let hourly_cost = labor_roles.get(&line.role_id).map(|role| role.hourly_cost);
            LaborLineCost {
                role_id: line.role_id.clone(),
                hours: line.hours,
                hourly_cost: hourly_cost.unwrap_or_default(),
                resolved: hourly_cost.is_some(),
                cost: line.hours.saturating_mul(hourly_cost.unwrap_or_default()),
            }
        })
        .collect();

    CostBreakdown { inputs, labor }
}

/// Direct cost of one batch: inputs plus labor at current prices.
#[must_use]
pub fn direct_cost(recipe: &Recipe, prices: &PriceBook<'_>, labor_roles: &LaborRoles) -> Decimal {
    cost_breakdown(recipe, prices, labor_roles).direct_cost()
}

/// Spread a batch cost over the units it yields.
#[must_use]
pub fn unit_cost(total_batch_cost: Decimal, batch_yield: Decimal) -> Decimal {
    if batch_yield <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    saturating_div(total_batch_cost, batch_yield)
}

/// Per-unit share of the product's overhead allocation.
#[must_use]
pub fn indirect_unit_cost(indirect_cost_per_product: Decimal, batch_yield: Decimal) -> Decimal {
    unit_cost(indirect_cost_per_product, batch_yield)
}

#[must_use]
pub fn total_unit_cost(direct_unit_cost: Decimal, indirect_unit_cost: Decimal) -> Decimal {
    direct_unit_cost.saturating_add(indirect_unit_cost)
}

/// A target margin counts only when it is set and non-zero.
pub(crate) fn effective_target(target_margin: Option<Decimal>) -> Option<Decimal> {
    target_margin.filter(|margin| !margin.is_zero())
}

/// Price at which the real margin equals `target_margin` percent.
///
/// Without a usable target (unset, `<= 0`, or `>= 100`) the cost is
/// returned unchanged.
///
/// ```
/// use costeo_core::engine::calculator::suggested_price;
/// use rust_decimal::Decimal;
///
/// let price = suggested_price(Decimal::new(360, 2), Some(Decimal::from(25)));
/// assert_eq!(price, Decimal::new(480, 2));
/// ```
#[must_use]
pub fn suggested_price(total_unit_cost: Decimal, target_margin: Option<Decimal>) -> Decimal {
    match target_margin {
        Some(margin) if margin > Decimal::ZERO && margin < Decimal::ONE_HUNDRED => {
            saturating_div(total_unit_cost, Decimal::ONE - margin / Decimal::ONE_HUNDRED)
        }
        _ => total_unit_cost,
    }
}

/// Profit as a percentage of the selling price. 0 when there is no price.
#[must_use]
pub fn real_margin(selling_price: Decimal, total_unit_cost: Decimal) -> Decimal {
    if selling_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    saturating_div(selling_price.saturating_sub(total_unit_cost), selling_price)
        .saturating_mul(Decimal::ONE_HUNDRED)
}

/// Classify a real margin against the target.
///
/// A product without a target margin is never `Profitable`.
#[must_use]
pub fn profitability_status(real_margin: Decimal, target_margin: Option<Decimal>) -> ProfitabilityStatus {
    if real_margin < Decimal::ZERO {
        return ProfitabilityStatus::Loss;
    }
    match effective_target(target_margin) {
        Some(target) if real_margin >= target => ProfitabilityStatus::Profitable,
        _ => ProfitabilityStatus::LowMargin,
    }
}

/// Division clamped to the `Decimal` range. Dividing by zero gives 0.
pub(crate) fn saturating_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(
        if numerator.is_sign_negative() == denominator.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        },
    )
}

pub(crate) fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Per-unit costs of a recipe under a given overhead allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitCosts {
    /// Direct cost of the whole batch.
    pub direct_cost: Decimal,
    pub direct_unit_cost: Decimal,
    pub indirect_unit_cost: Decimal,
    pub total_unit_cost: Decimal,
}

#[must_use]
pub fn unit_costs(
    recipe: &Recipe,
    prices: &PriceBook<'_>,
    labor_roles: &LaborRoles,
    indirect_cost_per_product: Decimal,
) -> UnitCosts {
    let direct_cost = direct_cost(recipe, prices, labor_roles);
    let direct_unit_cost = unit_cost(direct_cost, recipe.batch_yield);
    let indirect_unit_cost = indirect_unit_cost(indirect_cost_per_product, recipe.batch_yield);
    UnitCosts {
        direct_cost,
        direct_unit_cost,
        indirect_unit_cost,
        total_unit_cost: total_unit_cost(direct_unit_cost, indirect_unit_cost),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::snapshot::{Inputs, Products};
    use crate::types::{Input, InputId, LaborRole, Product, ProductId, RecipeInput};

    fn fixtures() -> (Products, Inputs, LaborRoles) {
        let inputs = Inputs::from([(InputId::new("i1"), Input::new("i1", "Harina", "kg", dec!(3.00)))]);
        let roles = LaborRoles::from([(
            LaborRoleId::new("r1"),
            LaborRole::new("r1", "Panadero", dec!(20.00)),
        )]);
        (Products::new(), inputs, roles)
    }

    fn bread_recipe() -> Recipe {
        Recipe::new("rc1", "p1", dec!(10))
            .with_input(RecipeInput::raw(InputId::new("i1"), dec!(2)))
            .with_labor("r1", dec!(1))
    }

    #[test]
    fn test_bread_scenario() {
        let (products, inputs, roles) = fixtures();
        let prices = PriceBook::new(&products, &inputs);
        let costs = unit_costs(&bread_recipe(), &prices, &roles, dec!(10.00));

        assert_eq!(costs.direct_cost, dec!(26.00));
        assert_eq!(costs.direct_unit_cost, dec!(2.60));
        assert_eq!(costs.indirect_unit_cost, dec!(1.00));
        assert_eq!(costs.total_unit_cost, dec!(3.60));

        let target = Some(dec!(25));
        assert_eq!(suggested_price(costs.total_unit_cost, target), dec!(4.80));

        let margin = real_margin(dec!(4.00), costs.total_unit_cost);
        assert_eq!(margin, dec!(10));
        assert_eq!(profitability_status(margin, target), ProfitabilityStatus::LowMargin);

        let margin = real_margin(dec!(3.00), costs.total_unit_cost);
        assert_eq!(margin, dec!(-20));
        assert_eq!(profitability_status(margin, target), ProfitabilityStatus::Loss);
    }

    #[test]
    fn test_breakdown_marks_unresolved_lines() {
        let (products, inputs, roles) = fixtures();
        let prices = PriceBook::new(&products, &inputs);
        let recipe = bread_recipe()
            .with_input(RecipeInput::product(ProductId::new("missing"), dec!(5)))
            .with_labor("ghost", dec!(3));
        let breakdown = cost_breakdown(&recipe, &prices, &roles);

        assert_eq!(breakdown.unresolved_count(), 2);
        assert!(!breakdown.inputs[1].resolved);
        assert_eq!(breakdown.inputs[1].cost, dec!(0));
        assert_eq!(breakdown.input_cost(), dec!(6.00));
        assert_eq!(breakdown.labor_cost(), dec!(20.00));
        assert_eq!(breakdown.direct_cost(), dec!(26.00));
    }

    #[test]
    fn test_product_inputs_priced_by_cost() {
        let (_, inputs, roles) = fixtures();
        let mut dough = Product::new("p9", "Masa", dec!(0));
        dough.cost = Some(dec!(1.5));
        let products = Products::from([(dough.id.clone(), dough)]);
        let prices = PriceBook::new(&products, &inputs);
        let recipe = Recipe::new("rc2", "p1", dec!(1))
            .with_input(RecipeInput::product(ProductId::new("p9"), dec!(4)));

        assert_eq!(direct_cost(&recipe, &prices, &roles), dec!(6.0));
    }

    #[test]
    fn test_direct_cost_is_idempotent() {
        let (products, inputs, roles) = fixtures();
        let prices = PriceBook::new(&products, &inputs);
        let recipe = bread_recipe();
        assert_eq!(
            direct_cost(&recipe, &prices, &roles),
            direct_cost(&recipe, &prices, &roles)
        );
    }

    #[test]
    fn test_zero_yield_guard() {
        for batch_yield in [dec!(0), dec!(-1), dec!(-0.5)] {
            assert_eq!(unit_cost(dec!(26), batch_yield), dec!(0));
            assert_eq!(indirect_unit_cost(dec!(10), batch_yield), dec!(0));
        }
    }

    #[test]
    fn test_suggested_price_without_usable_target() {
        for target in [None, Some(dec!(0)), Some(dec!(-5)), Some(dec!(100)), Some(dec!(150))] {
            assert_eq!(suggested_price(dec!(3.60), target), dec!(3.60));
        }
    }

    #[test]
    fn test_real_margin_without_price() {
        assert_eq!(real_margin(dec!(0), dec!(3.60)), dec!(0));
        assert_eq!(real_margin(dec!(-2), dec!(3.60)), dec!(0));
    }

    #[test]
    fn test_tiny_yield_clamps_instead_of_overflowing() {
        let tiny = dec!(0.0000000000000000000001);
        assert_eq!(unit_cost(dec!(10000000), tiny), Decimal::MAX);
        assert_eq!(unit_cost(dec!(-10000000), tiny), Decimal::MIN);
        assert_eq!(indirect_unit_cost(dec!(10000000), tiny), Decimal::MAX);
    }

    #[test]
    fn test_tiny_price_margin_clamps() {
        let tiny = dec!(0.0000000000000000000001);
        assert_eq!(real_margin(tiny, dec!(10000000)), Decimal::MIN);
        assert_eq!(real_margin(dec!(1), Decimal::MIN), Decimal::MAX);
    }

    #[test]
    fn test_suggested_price_clamps() {
        assert_eq!(suggested_price(Decimal::MAX, Some(dec!(50))), Decimal::MAX);
    }

    #[test]
    fn test_huge_lines_saturate() {
        let (products, inputs, mut roles) = fixtures();
        roles.insert(
            LaborRoleId::new("r2"),
            LaborRole::new("r2", "Maestro", Decimal::MAX),
        );
        let prices = PriceBook::new(&products, &inputs);
        let recipe = Recipe::new("rc3", "p1", dec!(0.0000000000000000000001))
            .with_labor("r1", dec!(1))
            .with_labor("r2", dec!(2))
            .with_labor("r2", dec!(3));
        let costs = unit_costs(&recipe, &prices, &roles, dec!(1));

        assert_eq!(costs.direct_cost, Decimal::MAX);
        assert_eq!(costs.direct_unit_cost, Decimal::MAX);
        assert_eq!(costs.total_unit_cost, Decimal::MAX);
    }

    #[test]
    fn test_margin_round_trip() {
        let tolerance = dec!(0.000001);
        for cost in [dec!(0.37), dec!(3.60), dec!(129.99)] {
            for target in [dec!(1), dec!(25), dec!(33.3), dec!(99)] {
                let price = suggested_price(cost, Some(target));
                let margin = real_margin(price, cost);
                assert!((margin - target).abs() < tolerance, "{cost} @ {target}% -> {margin}");
            }
        }
    }

    #[test]
    fn test_status_without_target_is_low_margin() {
        assert_eq!(profitability_status(dec!(80), None), ProfitabilityStatus::LowMargin);
        assert_eq!(profitability_status(dec!(80), Some(dec!(0))), ProfitabilityStatus::LowMargin);
        assert_eq!(profitability_status(dec!(25), Some(dec!(25))), ProfitabilityStatus::Profitable);
        assert_eq!(profitability_status(dec!(0), Some(dec!(25))), ProfitabilityStatus::LowMargin);
    }
}
