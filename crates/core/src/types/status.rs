//! Classification enums produced by the costing engine.

use serde::{Deserialize, Serialize};

/// Profitability of a product at its current price.
///
/// Variant order is the analysis table order: losses first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProfitabilityStatus {
    /// Real margin below zero.
    Loss,
    /// Non-negative margin below target, or no target set.
    LowMargin,
    /// Margin at or above target.
    Profitable,
}

impl ProfitabilityStatus {
    /// Operator-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Loss => "Pérdida",
            Self::LowMargin => "Margen Bajo",
            Self::Profitable => "Rentable",
        }
    }
}

/// The kind of problem the issue monitor found for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    NoRecipe,
    Loss,
    LowMargin,
}

impl IssueKind {
    /// Severity attached to this kind of issue.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Loss => Severity::High,
            Self::LowMargin => Severity::Medium,
            Self::NoRecipe => Severity::Low,
        }
    }

    /// Operator-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Loss => "Pérdida",
            Self::LowMargin => "Margen Bajo",
            Self::NoRecipe => "Sin Receta",
        }
    }
}

/// Issue severity. Orders `High < Medium < Low` so ascending sorts put the
/// most severe issues first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}
