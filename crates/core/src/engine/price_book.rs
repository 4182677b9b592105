//! Unit-price lookup for recipe input lines.

use rust_decimal::Decimal;

use crate::snapshot::{Inputs, Products};
use crate::types::InputSource;

/// Resolves the current unit price of any [`InputSource`].
///
/// Products used as inputs are priced by their `cost`, standalone inputs by
/// their `unitPrice`. Both models go through [`PriceBook::unit_price`].
#[derive(Debug, Clone, Copy)]
pub struct PriceBook<'a> {
    products: &'a Products,
    inputs: &'a Inputs,
}

impl<'a> PriceBook<'a> {
    #[must_use]
    pub const fn new(products: &'a Products, inputs: &'a Inputs) -> Self {
        Self { products, inputs }
    }

    /// Current unit price, or `None` if the reference does not resolve.
    #[must_use]
    pub fn lookup(&self, source: &InputSource) -> Option<Decimal> {
        match source {
            InputSource::Product(id) => self.products.get(id).map(crate::Product::unit_cost),
            InputSource::RawInput(id) => self.inputs.get(id).map(|input| input.unit_price),
        }
    }

    /// Current unit price; unresolved references price at 0.
    #[must_use]
    pub fn unit_price(&self, source: &InputSource) -> Decimal {
        self.lookup(source).unwrap_or_default()
    }

    /// Display name of the referenced entity.
    #[must_use]
    pub fn name(&self, source: &InputSource) -> Option<&'a str> {
        match source {
            InputSource::Product(id) => self.products.get(id).map(|p| p.name.as_str()),
            InputSource::RawInput(id) => self.inputs.get(id).map(|i| i.name.as_str()),
        }
    }

    /// Unit-of-measure label of the referenced entity.
    #[must_use]
    pub fn unit(&self, source: &InputSource) -> Option<&'a str> {
        match source {
            InputSource::Product(id) => self.products.get(id).map(crate::Product::unit_label),
            InputSource::RawInput(id) => self.inputs.get(id).map(|i| i.unit.as_str()),
        }
    }
}
