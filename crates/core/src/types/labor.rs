//! Labor roles priced by the hour.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::LaborRoleId;

/// Errors that can occur when validating a [`LaborRole`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LaborRoleError {
    #[error("labor role name cannot be empty")]
    EmptyName,
    #[error("hourly cost must be greater than or equal to 0")]
    NegativeHourlyCost,
}

/// A labor role (baker, packer, ...) with its cost per hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaborRole {
    #[serde(default)]
    pub id: LaborRoleId,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub hourly_cost: Decimal,
}

impl LaborRole {
    #[must_use]
    pub fn new(id: impl Into<LaborRoleId>, name: impl Into<String>, hourly_cost: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hourly_cost,
        }
    }

    /// Validate the role before it is written to the store.
    ///
    /// # Errors
    ///
    /// Returns the first rule the role violates.
    pub fn validate(&self) -> Result<(), LaborRoleError> {
        if self.name.trim().is_empty() {
            return Err(LaborRoleError::EmptyName);
        }
        if self.hourly_cost < Decimal::ZERO {
            return Err(LaborRoleError::NegativeHourlyCost);
        }
        Ok(())
    }
}
