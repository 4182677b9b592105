//! Profitability monitor: finds products that lose money, miss their target
//! margin, or cannot be costed at all.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculator::{effective_target, real_margin, suggested_price, unit_costs};
use crate::snapshot::CostingSnapshot;
use crate::types::{IssueKind, Product, ProductId, RecipeId, Severity};

/// Shown for products that have no active recipe.
pub const NO_RECIPE_MESSAGE: &str = "Sin receta definida";

/// One problem found for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIssue {
    pub product_id: ProductId,
    pub product_name: String,
    pub issue: IssueKind,
    pub severity: Severity,
    /// Recipe the figures were computed from. `None` for `no-recipe`.
    pub recipe_id: Option<RecipeId>,
    pub price: Option<Decimal>,
    pub total_unit_cost: Option<Decimal>,
    pub real_margin: Option<Decimal>,
    pub target_margin: Option<Decimal>,
    /// Target minus real margin. Only for `low-margin`.
    pub margin_diff: Option<Decimal>,
    pub suggested_price: Option<Decimal>,
}

impl ProductIssue {
    fn without_recipe(product: &Product) -> Self {
        let issue = IssueKind::NoRecipe;
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            issue,
            severity: issue.severity(),
            recipe_id: None,
            price: None,
            total_unit_cost: None,
            real_margin: None,
            target_margin: product.target_margin,
            margin_diff: None,
            suggested_price: None,
        }
    }

    /// Operator-facing description of the issue.
    #[must_use]
    pub fn message(&self) -> String {
        match (self.issue, self.real_margin, self.margin_diff) {
            (IssueKind::NoRecipe, _, _) => NO_RECIPE_MESSAGE.to_owned(),
            (IssueKind::LowMargin, Some(margin), Some(diff)) => format!(
                "Margen {}% ({}% bajo el objetivo)",
                margin.round_dp(1),
                diff.round_dp(1)
            ),
            (_, Some(margin), _) => format!("Margen {}%", margin.round_dp(1)),
            (kind, None, _) => kind.label().to_owned(),
        }
    }
}

/// Check every active product against its active recipe.
///
/// Profitable products are left out. The result is unsorted; see
/// [`sort_issues`].
#[must_use]
pub fn detect_issues(snapshot: &CostingSnapshot, indirect_cost_per_product: Decimal) -> Vec<ProductIssue> {
    let prices = snapshot.price_book();
    let mut issues = Vec::new();

    for product in snapshot.active_products() {
        let Some(recipe) = snapshot.active_recipe_for(&product.id) else {
            issues.push(ProductIssue::without_recipe(product));
            continue;
        };

        let costs = unit_costs(recipe, &prices, &snapshot.labor_roles, indirect_cost_per_product);
        let margin = real_margin(product.price, costs.total_unit_cost);
        let target = effective_target(product.target_margin);

        let (issue, margin_diff) = if margin < Decimal::ZERO {
            (IssueKind::Loss, None)
        } else if let Some(target) = target
            && margin < target
        {
            (IssueKind::LowMargin, Some(target.saturating_sub(margin)))
        } else {
            continue;
        };

        issues.push(ProductIssue {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            issue,
            severity: issue.severity(),
            recipe_id: Some(recipe.id.clone()),
            price: Some(product.price),
            total_unit_cost: Some(costs.total_unit_cost),
            real_margin: Some(margin),
            target_margin: product.target_margin,
            margin_diff,
            suggested_price: Some(suggested_price(costs.total_unit_cost, product.target_margin)),
        });
    }

    issues
}

/// Most severe first; within a severity, worst real margin first.
///
/// Entries without a margin keep their relative order.
pub fn sort_issues(issues: &mut [ProductIssue]) {
    issues.sort_by(|a, b| {
        a.severity.cmp(&b.severity).then_with(|| match (a.real_margin, b.real_margin) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => std::cmp::Ordering::Equal,
        })
    });
}

/// Issue counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    #[must_use]
    pub fn tally(issues: &[ProductIssue]) -> Self {
        issues.iter().fold(Self::default(), |mut counts, issue| {
            match issue.severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
            counts
        })
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::types::{Input, InputId, Recipe, RecipeInput};

    fn product(id: &str, price: Decimal, target: Option<Decimal>) -> Product {
        let mut product = Product::new(id, id.to_uppercase(), price);
        product.target_margin = target;
        product
    }

    fn snapshot(products: Vec<Product>, with_recipe: &[&str]) -> CostingSnapshot {
        let mut snapshot = CostingSnapshot::default();
        let input = Input::new("i1", "Insumo", "u", dec!(1));
        snapshot.inputs.insert(input.id.clone(), input);
        for product in products {
            snapshot.products.insert(product.id.clone(), product);
        }
        for id in with_recipe {
            let recipe = Recipe::new(format!("r-{id}"), *id, dec!(1))
                .with_input(RecipeInput::raw(InputId::new("i1"), dec!(1)));
            snapshot.recipes.insert(recipe.id.clone(), recipe);
        }
        snapshot
    }

    #[test]
    fn test_issue_ordering() {
        // Unit cost is 1.00: p1 loses about 5%, p2 earns 10% against a 20% target.
        let p1 = product("p1", dec!(0.95), None);
        let p2 = product("p2", dec!(1.1111111111), Some(dec!(20)));
        let p3 = product("p3", dec!(5), Some(dec!(20)));
        let snapshot = snapshot(vec![p3, p2, p1], &["p1", "p2"]);

        let mut issues = detect_issues(&snapshot, dec!(0));
        sort_issues(&mut issues);

        let ids: Vec<&str> = issues.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert_eq!(issues[0].issue, IssueKind::Loss);
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[1].issue, IssueKind::LowMargin);
        assert!(issues[1].margin_diff.unwrap() > dec!(9.99));
        assert_eq!(issues[2].issue, IssueKind::NoRecipe);
        assert_eq!(issues[2].message(), NO_RECIPE_MESSAGE);
    }

    #[test]
    fn test_profitable_and_inactive_products_are_excluded() {
        let good = product("good", dec!(2), Some(dec!(25)));
        let mut hidden = product("hidden", dec!(1), None);
        hidden.active = false;
        let snapshot = snapshot(vec![good, hidden], &["good"]);

        assert!(detect_issues(&snapshot, dec!(0)).is_empty());
    }

    #[test]
    fn test_no_target_is_not_an_issue() {
        let plain = product("plain", dec!(1.05), None);
        let zero = product("zero", dec!(1.05), Some(dec!(0)));
        let snapshot = snapshot(vec![plain, zero], &["plain", "zero"]);

        assert!(detect_issues(&snapshot, dec!(0)).is_empty());
    }

    #[test]
    fn test_overhead_can_push_into_loss() {
        let snapshot = snapshot(vec![product("p1", dec!(1.50), Some(dec!(10)))], &["p1"]);
        let issues = detect_issues(&snapshot, dec!(1));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue, IssueKind::Loss);
        assert_eq!(issues[0].total_unit_cost, Some(dec!(2)));
        assert_eq!(issues[0].recipe_id.as_ref().unwrap().as_str(), "r-p1");
    }

    #[test]
    fn test_suggested_price_is_attached() {
        let snapshot = snapshot(vec![product("p1", dec!(1.10), Some(dec!(50)))], &["p1"]);
        let issues = detect_issues(&snapshot, dec!(0));
        assert_eq!(issues[0].suggested_price, Some(dec!(2)));
    }

    #[test]
    fn test_no_recipe_entries_keep_insertion_order() {
        let snapshot = snapshot(
            vec![product("a", dec!(1), None), product("b", dec!(1), None)],
            &[],
        );
        let mut issues = detect_issues(&snapshot, dec!(0));
        sort_issues(&mut issues);
        let ids: Vec<&str> = issues.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_severity_counts() {
        let snapshot = snapshot(
            vec![product("a", dec!(0.5), None), product("b", dec!(1), None)],
            &["a"],
        );
        let counts = SeverityCounts::tally(&detect_issues(&snapshot, dec!(0)));
        assert_eq!(counts, SeverityCounts { high: 1, medium: 0, low: 1 });
        assert_eq!(counts.total(), 2);
    }
}
