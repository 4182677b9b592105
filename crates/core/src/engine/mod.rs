//! The costing engine.
//!
//! Pure functions over a [`CostingSnapshot`]. [`CostingReport::derive`]
//! runs the whole derivation at once; callers recompute it from scratch
//! whenever any collection changes.

pub mod allocation;
pub mod analysis;
pub mod calculator;
pub mod impact;
pub mod integrity;
pub mod issues;
mod price_book;
pub mod summary;

use serde::Serialize;

pub use allocation::Allocation;
pub use analysis::{ProductAnalysis, analyze_products};
pub use impact::{DEFAULT_TOP_N, IndirectCostShare, InputImpact, LaborRoleImpact};
pub use integrity::{Problem, check_snapshot};
pub use issues::{ProductIssue, detect_issues, sort_issues};
pub use price_book::PriceBook;
pub use summary::DashboardSummary;

use crate::snapshot::CostingSnapshot;

/// Everything derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingReport<'a> {
    pub allocation: Allocation,
    pub analyses: Vec<ProductAnalysis>,
    /// Sorted, most severe first.
    pub issues: Vec<ProductIssue>,
    pub top_inputs: Vec<InputImpact>,
    pub top_labor_roles: Vec<LaborRoleImpact>,
    pub top_indirect_costs: Vec<IndirectCostShare<'a>>,
    pub summary: DashboardSummary,
}

impl<'a> CostingReport<'a> {
    /// Run the full derivation with top-N lists of length `top_n`.
    #[must_use]
    pub fn derive(snapshot: &'a CostingSnapshot, top_n: usize) -> Self {
        let allocation = Allocation::from_snapshot(snapshot);
        let mut issues = detect_issues(snapshot, allocation.per_product);
        sort_issues(&mut issues);
        let summary = DashboardSummary::new(snapshot, &allocation, &issues);

        Self {
            allocation,
            analyses: analyze_products(snapshot, allocation.per_product),
            issues,
            top_inputs: impact::top_inputs(snapshot, top_n),
            top_labor_roles: impact::top_labor_roles(snapshot, top_n),
            top_indirect_costs: impact::top_indirect_costs(snapshot.indirect_costs.values(), top_n),
            summary,
        }
    }
}
