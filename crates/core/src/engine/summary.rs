//! Dashboard headline figures.

use rust_decimal::Decimal;
use serde::Serialize;

use super::allocation::Allocation;
use super::issues::{ProductIssue, SeverityCounts};
use crate::snapshot::CostingSnapshot;

/// Number of issues the dashboard lists.
pub const DASHBOARD_ISSUE_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_products: usize,
    pub products_with_recipes: usize,
    pub products_without_recipes: usize,
    pub active_recipes: usize,
    pub input_products: usize,
    pub labor_roles: usize,
    pub indirect_costs: usize,
    pub total_monthly_overhead: Decimal,
    pub overhead_per_product: Decimal,
    pub issues: SeverityCounts,
}

impl DashboardSummary {
    #[must_use]
    pub fn new(snapshot: &CostingSnapshot, allocation: &Allocation, issues: &[ProductIssue]) -> Self {
        let active_products = snapshot.active_products().count();
        Self {
            active_products,
            products_with_recipes: allocation.products_with_recipes,
            products_without_recipes: active_products.saturating_sub(allocation.products_with_recipes),
            active_recipes: snapshot.active_recipes().count(),
            input_products: snapshot.input_products().count(),
            labor_roles: snapshot.labor_roles.len(),
            indirect_costs: snapshot.indirect_costs.len(),
            total_monthly_overhead: allocation.total_overhead,
            overhead_per_product: allocation.per_product,
            issues: SeverityCounts::tally(issues),
        }
    }
}
