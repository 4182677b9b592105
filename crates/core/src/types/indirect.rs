//! Monthly overhead (rent, utilities, ...).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::IndirectCostId;

/// Errors that can occur when validating an [`IndirectCost`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IndirectCostError {
    #[error("indirect cost name cannot be empty")]
    EmptyName,
    #[error("monthly amount must be greater than 0")]
    NonPositiveAmount,
}

/// How an indirect cost is meant to be prorated.
///
/// Stored and displayed only: allocation always splits the pooled overhead
/// equally across products with an active recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProrationMethod {
    #[default]
    Units,
    Hours,
}

impl ProrationMethod {
    /// Operator-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Units => "Por Unidades",
            Self::Hours => "Por Horas",
        }
    }
}

/// A recurring monthly overhead line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndirectCost {
    #[serde(default)]
    pub id: IndirectCostId,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub monthly_amount: Decimal,
    #[serde(default)]
    pub proration_method: ProrationMethod,
}

impl IndirectCost {
    #[must_use]
    pub fn new(
        id: impl Into<IndirectCostId>,
        name: impl Into<String>,
        monthly_amount: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            monthly_amount,
            proration_method: ProrationMethod::default(),
        }
    }

    /// Validate the overhead line before it is written to the store.
    ///
    /// # Errors
    ///
    /// Returns the first rule the record violates.
    pub fn validate(&self) -> Result<(), IndirectCostError> {
        if self.name.trim().is_empty() {
            return Err(IndirectCostError::EmptyName);
        }
        if self.monthly_amount <= Decimal::ZERO {
            return Err(IndirectCostError::NonPositiveAmount);
        }
        Ok(())
    }
}
