//! Read-only reports over one snapshot.
//!
//! # Usage
//!
//! ```bash
//! # Cost analysis for every active product
//! costeo analyze
//!
//! # Products with pricing issues, most severe first
//! costeo issues -n 5
//!
//! # Highest-impact cost drivers
//! costeo top inputs -n 3
//!
//! # Dashboard counters, from an exported file
//! costeo --snapshot export.json dashboard
//! ```

use std::io::Write;

use clap::ValueEnum;
use costeo_core::engine::analysis::AnalysisOutcome;
use costeo_core::engine::issues::{NO_RECIPE_MESSAGE, SeverityCounts};
use costeo_core::engine::summary::DASHBOARD_ISSUE_LIMIT;
use costeo_core::engine::{
    Allocation, CostingReport, DEFAULT_TOP_N, ProductIssue, analyze_products, detect_issues,
    impact, sort_issues,
};
use costeo_core::CostingSnapshot;

use super::render::{money, or_dash, percent, severity};
use super::{CommandError, Format, write_json};

/// Which cost driver to rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TopKind {
    /// Inputs and input products, by money spent per batch
    Inputs,
    /// Labor roles, by money spent per batch
    Labor,
    /// Monthly overheads, by amount
    Indirect,
}

/// Cost analysis for every active product.
///
/// # Errors
///
/// Returns an error if the report cannot be written.
pub fn analyze(
    out: &mut impl Write,
    snapshot: &CostingSnapshot,
    format: Format,
) -> Result<(), CommandError> {
    let allocation = Allocation::from_snapshot(snapshot);
    let analyses = analyze_products(snapshot, allocation.per_product);
    if format == Format::Json {
        return write_json(out, &analyses);
    }

    writeln!(
        out,
        "Overhead: {} per month over {} products with recipes = {} per product",
        money(allocation.total_overhead),
        allocation.products_with_recipes,
        money(allocation.per_product),
    )?;
    for row in &analyses {
        match &row.outcome {
            AnalysisOutcome::WithoutRecipe => {
                writeln!(out, "{} [{}]: {NO_RECIPE_MESSAGE}", row.product_name, row.product_id)?;
            }
            AnalysisOutcome::Costed(analysis) => {
                writeln!(
                    out,
                    "{} [{}]: {} | unit cost {} (direct {} + indirect {}) | price {} | margin {} | target {} | suggested {}",
                    row.product_name,
                    row.product_id,
                    analysis.status.label(),
                    money(analysis.total_unit_cost),
                    money(analysis.direct_unit_cost),
                    money(analysis.indirect_unit_cost),
                    money(analysis.current_price),
                    percent(analysis.real_margin),
                    or_dash(analysis.target_margin.map(percent)),
                    money(analysis.suggested_price),
                )?;
            }
        }
    }
    Ok(())
}

/// Products with pricing issues, most severe first.
///
/// `limit` caps the listed issues; the counts always cover all of them.
///
/// # Errors
///
/// Returns an error if the report cannot be written.
pub fn issues(
    out: &mut impl Write,
    snapshot: &CostingSnapshot,
    limit: Option<usize>,
    format: Format,
) -> Result<(), CommandError> {
    let allocation = Allocation::from_snapshot(snapshot);
    let mut issues = detect_issues(snapshot, allocation.per_product);
    sort_issues(&mut issues);
    let counts = SeverityCounts::tally(&issues);
    if let Some(limit) = limit {
        issues.truncate(limit);
    }

    if format == Format::Json {
        return write_json(out, &issues);
    }
    write_counts(out, counts)?;
    write_issues(out, &issues)
}

fn write_counts(out: &mut impl Write, counts: SeverityCounts) -> Result<(), CommandError> {
    writeln!(
        out,
        "{} issues: {} high, {} medium, {} low",
        counts.total(),
        counts.high,
        counts.medium,
        counts.low,
    )?;
    Ok(())
}

fn write_issues(out: &mut impl Write, issues: &[ProductIssue]) -> Result<(), CommandError> {
    for issue in issues {
        write!(
            out,
            "[{}] {} [{}]: {}",
            severity(issue.severity),
            issue.product_name,
            issue.product_id,
            issue.message(),
        )?;
        if let Some(price) = issue.suggested_price {
            write!(out, " | suggested {}", money(price))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// The `n` highest-impact cost drivers of one kind.
///
/// # Errors
///
/// Returns an error if the report cannot be written.
pub fn top(
    out: &mut impl Write,
    snapshot: &CostingSnapshot,
    kind: TopKind,
    n: usize,
    format: Format,
) -> Result<(), CommandError> {
    match kind {
        TopKind::Inputs => {
            let ranked = impact::top_inputs(snapshot, n);
            if format == Format::Json {
                return write_json(out, &ranked);
            }
            let prices = snapshot.price_book();
            for (rank, input) in ranked.iter().enumerate() {
                writeln!(
                    out,
                    "{}. {} ({} per {}): {} across {} recipes",
                    rank + 1,
                    prices.name(&input.source).unwrap_or_else(|| input.source.id_str()),
                    money(input.unit_price),
                    prices.unit(&input.source).unwrap_or("unit"),
                    money(input.total_impact),
                    input.recipe_count,
                )?;
            }
        }
        TopKind::Labor => {
            let ranked = impact::top_labor_roles(snapshot, n);
            if format == Format::Json {
                return write_json(out, &ranked);
            }
            for (rank, role) in ranked.iter().enumerate() {
                let name = snapshot
                    .labor_roles
                    .get(&role.role_id)
                    .map_or_else(|| role.role_id.as_str(), |r| r.name.as_str());
                writeln!(
                    out,
                    "{}. {} ({}/h): {} over {} h across {} recipes",
                    rank + 1,
                    name,
                    money(role.hourly_cost),
                    money(role.total_impact),
                    role.total_hours,
                    role.recipe_count,
                )?;
            }
        }
        TopKind::Indirect => {
            let ranked = impact::top_indirect_costs(snapshot.indirect_costs.values(), n);
            if format == Format::Json {
                return write_json(out, &ranked);
            }
            for (rank, share) in ranked.iter().enumerate() {
                writeln!(
                    out,
                    "{}. {} ({}): {} per month, {} of overhead",
                    rank + 1,
                    share.cost.name,
                    share.cost.proration_method.label(),
                    money(share.cost.monthly_amount),
                    percent(share.percentage),
                )?;
            }
        }
    }
    Ok(())
}

/// Dashboard counters plus the most severe issues.
///
/// The JSON form is the full derivation for the snapshot.
///
/// # Errors
///
/// Returns an error if the report cannot be written.
pub fn dashboard(
    out: &mut impl Write,
    snapshot: &CostingSnapshot,
    format: Format,
) -> Result<(), CommandError> {
    let report = CostingReport::derive(snapshot, DEFAULT_TOP_N);
    if format == Format::Json {
        return write_json(out, &report);
    }

    let summary = &report.summary;
    writeln!(
        out,
        "Products: {} active, {} with recipes, {} without",
        summary.active_products, summary.products_with_recipes, summary.products_without_recipes,
    )?;
    writeln!(
        out,
        "Recipes: {} active | input products: {} | labor roles: {} | indirect costs: {}",
        summary.active_recipes, summary.input_products, summary.labor_roles, summary.indirect_costs,
    )?;
    writeln!(
        out,
        "Overhead: {} per month, {} per product",
        money(summary.total_monthly_overhead),
        money(summary.overhead_per_product),
    )?;
    write_counts(out, summary.issues)?;
    let shown = report.issues.len().min(DASHBOARD_ISSUE_LIMIT);
    write_issues(out, report.issues.get(..shown).unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn bakery() -> CostingSnapshot {
        CostingSnapshot::from_document(&json!({
            "products": {
                "p1": {"name": "Pan", "price": 4, "targetMargin": 30},
                "p2": {"name": "Torta", "price": 2, "targetMargin": 30},
                "p3": {"name": "Galleta", "price": 1},
                "p4": {"name": "Harina", "price": 0, "cost": 1.5, "esInsumo": true}
            },
            "recipes": {
                "r1": {"productId": "p1", "batchYield": 10,
                       "inputs": [{"productId": "p4", "quantity": 4}],
                       "labor": [{"roleId": "l1", "hours": 1}]},
                "r2": {"productId": "p2", "batchYield": 2,
                       "inputs": [{"productId": "p4", "quantity": 2}],
                       "labor": [{"roleId": "l1", "hours": 0.5}]}
            },
            "laborRoles": {"l1": {"name": "Panadero", "hourlyCost": 20}},
            "indirectCosts": {"c1": {"name": "Alquiler", "monthlyAmount": 20}}
        }))
        .unwrap()
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), CommandError>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_analyze_text_lists_losses_first() {
        let text = render(|out| analyze(out, &bakery(), Format::Text));
        let lines: Vec<&str> = text.lines().collect();

        // 20 overhead / 2 products with recipes = 10 per product
        assert_eq!(
            lines.first().copied(),
            Some("Overhead: $20.00 per month over 2 products with recipes = $10.00 per product")
        );
        // Torta: (3 + 10) / 2 + 10 / 2 = 11.50 unit cost at a price of 2
        assert!(lines.get(1).unwrap().starts_with("Torta [p2]: Pérdida | unit cost $11.50"));
        assert!(lines.iter().any(|l| l.starts_with("Galleta [p3]: Sin receta definida")));
    }

    #[test]
    fn test_analyze_json_is_an_array_of_rows() {
        let text = render(|out| analyze(out, &bakery(), Format::Json));
        let rows: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_issues_limit_keeps_full_counts() {
        let text = render(|out| issues(out, &bakery(), Some(1), Format::Text));
        let lines: Vec<&str> = text.lines().collect();

        // Torta loses money, Pan sits under target, Galleta and Harina lack recipes
        assert_eq!(lines.first().copied(), Some("4 issues: 1 high, 1 medium, 2 low"));
        assert_eq!(lines.len(), 2);
        assert!(lines.get(1).unwrap().starts_with("[HIGH] "));
    }

    #[test]
    fn test_top_inputs_uses_names() {
        let text = render(|out| top(out, &bakery(), TopKind::Inputs, 5, Format::Text));
        assert_eq!(text.lines().next(), Some("1. Harina ($1.50 per unidad): $9.00 across 2 recipes"));
    }

    #[test]
    fn test_top_indirect_share() {
        let text = render(|out| top(out, &bakery(), TopKind::Indirect, 5, Format::Text));
        assert!(text.contains("Alquiler"));
        assert!(text.contains("$20.00 per month, 100.0% of overhead"));
    }

    #[test]
    fn test_dashboard_json_has_every_section() {
        let text = render(|out| dashboard(out, &bakery(), Format::Json));
        let report: Value = serde_json::from_str(&text).unwrap();
        for key in ["allocation", "analyses", "issues", "topInputs", "topLaborRoles", "topIndirectCosts", "summary"] {
            assert!(report.get(key).is_some(), "missing {key}");
        }
        assert_eq!(report["summary"]["productsWithoutRecipes"], 2);
    }
}
