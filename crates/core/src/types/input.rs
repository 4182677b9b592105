//! Standalone raw-material inputs (legacy model).
//!
//! The current model flags products with `esInsumo` instead; both are priced
//! through [`crate::PriceBook`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::InputId;

/// Errors that can occur when validating an [`Input`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The input name is empty.
    #[error("input name cannot be empty")]
    EmptyName,
    /// The unit price is negative.
    #[error("unit price must be greater than or equal to 0")]
    NegativeUnitPrice,
}

/// A raw material bought from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default)]
    pub id: InputId,
    #[serde(default)]
    pub name: String,
    /// Unit of measure label ("kg", "l", "unidad").
    #[serde(default)]
    pub unit: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    /// When `unit_price` last changed.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Input {
    /// Create an input priced at `unit_price` per `unit`.
    #[must_use]
    pub fn new(
        id: impl Into<InputId>,
        name: impl Into<String>,
        unit: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit: unit.into(),
            unit_price,
            supplier: None,
            last_updated: None,
        }
    }

    /// Change the unit price, stamping `last_updated` only when it differs.
    pub fn set_unit_price(&mut self, unit_price: Decimal, at: DateTime<Utc>) {
        if self.unit_price != unit_price {
            self.unit_price = unit_price;
            self.last_updated = Some(at);
        }
    }

    /// Validate the input before it is written to the store.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input violates.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.name.trim().is_empty() {
            return Err(InputError::EmptyName);
        }
        if self.unit_price < Decimal::ZERO {
            return Err(InputError::NegativeUnitPrice);
        }
        Ok(())
    }
}
