//! Products, their variants, and catalog-level validation.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariantId};

/// Errors that can occur when validating a [`Product`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// The product name is empty.
    #[error("product name cannot be empty")]
    EmptyName,
    /// The selling price is negative.
    #[error("price must be greater than or equal to 0")]
    NegativePrice,
    /// The precomputed unit cost is negative.
    #[error("cost must be greater than or equal to 0")]
    NegativeCost,
    /// The target margin is outside `[0, 100)`.
    #[error("target margin must be between 0 and 100 (got {0})")]
    TargetMarginOutOfRange(Decimal),
    /// Two variants share a name (case-insensitive).
    #[error("variant names must be unique (duplicate: {0})")]
    DuplicateVariantName(String),
    /// Two variants share a SKU suffix (case-insensitive).
    #[error("variant SKU suffixes must be unique (duplicate: {0})")]
    DuplicateSkuSuffix(String),
    /// Two variants produce the same full SKU.
    #[error("variant SKUs must be unique (duplicate: {0})")]
    DuplicateVariantSku(String),
}

/// A sellable product, optionally usable as a recipe input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identifier.
    #[serde(default)]
    pub id: ProductId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Stock keeping unit. Uniqueness is not enforced here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Selling price.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Precomputed unit cost, used when the product is a recipe input.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub cost: Option<Decimal>,
    /// Desired margin as a percentage of the selling price.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub target_margin: Option<Decimal>,
    /// Inactive products are ignored by the issue monitor and analysis.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Marks the product as usable as a recipe input.
    #[serde(default)]
    pub es_insumo: bool,
    /// Unit the product is sold in (e.g. "kg").
    #[serde(default, rename = "unidadVenta", skip_serializing_if = "Option::is_none")]
    pub sale_unit: Option<String>,
    /// Unit the product is produced in.
    #[serde(
        default,
        rename = "unidadProduccion",
        skip_serializing_if = "Option::is_none"
    )]
    pub production_unit: Option<String>,
    /// Ordered variants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
}

/// A product variant (size, flavour, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(default)]
    pub id: VariantId,
    #[serde(default)]
    pub name: String,
    /// Appended to the parent SKU as `parentSku_suffix`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku_suffix: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub cost: Option<Decimal>,
    #[serde(default = "default_active")]
    pub active: bool,
}

pub(crate) const fn default_active() -> bool {
    true
}

/// Build a variant SKU from the parent SKU and the variant suffix.
///
/// Returns `None` when either part is missing or blank.
///
/// ```
/// use costeo_core::variant_sku;
///
/// assert_eq!(variant_sku(Some("ALF"), Some("XL")).as_deref(), Some("ALF_XL"));
/// assert_eq!(variant_sku(None, Some("XL")), None);
/// ```
#[must_use]
pub fn variant_sku(parent_sku: Option<&str>, suffix: Option<&str>) -> Option<String> {
    let parent = parent_sku.map(str::trim).filter(|s| !s.is_empty())?;
    let suffix = suffix.map(str::trim).filter(|s| !s.is_empty())?;
    Some(format!("{parent}_{suffix}"))
}

impl Product {
    /// Create an active product with the given name and price.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sku: None,
            price,
            cost: None,
            target_margin: None,
            active: true,
            es_insumo: false,
            sale_unit: None,
            production_unit: None,
            variants: Vec::new(),
        }
    }

    /// Unit cost when used as a recipe input (0 if absent).
    #[must_use]
    pub fn unit_cost(&self) -> Decimal {
        self.cost.unwrap_or_default()
    }

    /// Label for the unit the product is measured in.
    #[must_use]
    pub fn unit_label(&self) -> &str {
        self.sale_unit
            .as_deref()
            .or(self.production_unit.as_deref())
            .unwrap_or("unidad")
    }

    /// Full SKU of one of this product's variants.
    #[must_use]
    pub fn variant_sku(&self, variant: &Variant) -> Option<String> {
        variant_sku(self.sku.as_deref(), variant.sku_suffix.as_deref())
    }

    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Validate the product before it is written to the store.
    ///
    /// # Errors
    ///
    /// Returns the first rule the product violates.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.price < Decimal::ZERO {
            return Err(ProductError::NegativePrice);
        }
        if self.cost.is_some_and(|c| c < Decimal::ZERO) {
            return Err(ProductError::NegativeCost);
        }
        if let Some(margin) = self.target_margin
            && (margin < Decimal::ZERO || margin >= Decimal::ONE_HUNDRED)
        {
            return Err(ProductError::TargetMarginOutOfRange(margin));
        }
        self.validate_variants()
    }

    /// Check that variant names, SKU suffixes and full SKUs are unique.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate found.
    pub fn validate_variants(&self) -> Result<(), ProductError> {
        let mut names = HashSet::new();
        for variant in &self.variants {
            let key = variant.name.trim().to_lowercase();
            if !names.insert(key) {
                return Err(ProductError::DuplicateVariantName(variant.name.clone()));
            }
        }

        let mut suffixes = HashSet::new();
        for suffix in self.variants.iter().filter_map(|v| v.sku_suffix.as_deref()) {
            if !suffixes.insert(suffix.trim().to_uppercase()) {
                return Err(ProductError::DuplicateSkuSuffix(suffix.to_owned()));
            }
        }

        let mut full_skus = HashSet::new();
        for sku in self.variants.iter().filter_map(|v| self.variant_sku(v)) {
            if !full_skus.insert(sku.clone()) {
                return Err(ProductError::DuplicateVariantSku(sku));
            }
        }

        Ok(())
    }
}
