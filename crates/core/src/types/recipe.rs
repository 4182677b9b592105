//! Recipes (bills of materials plus labor) and their input lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{InputId, LaborRoleId, ProductId, RecipeId};
use super::product::default_active;

/// Errors that can occur when validating a [`Recipe`] or decoding its lines.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipeError {
    /// The recipe does not name an output product.
    #[error("recipe must reference a product")]
    MissingProduct,
    /// The batch yield is zero or negative.
    #[error("batch yield must be greater than 0")]
    NonPositiveBatchYield,
    /// An input line has a zero or negative quantity.
    #[error("input line {line} must have a quantity greater than 0")]
    NonPositiveQuantity { line: usize },
    /// A labor line has zero or negative hours.
    #[error("labor line {line} must have hours greater than 0")]
    NonPositiveHours { line: usize },
    /// An input line carries neither `inputId` nor `productId`.
    #[error("recipe input line references neither an input nor a product")]
    MissingReference,
}

/// Where a recipe input line gets its unit price from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum InputSource {
    /// A standalone input, priced by its `unitPrice`.
    RawInput(InputId),
    /// A product used as an input, priced by its `cost`.
    Product(ProductId),
}

impl InputSource {
    /// The referenced entity ID as a plain string.
    #[must_use]
    pub fn id_str(&self) -> &str {
        match self {
            Self::RawInput(id) => id.as_str(),
            Self::Product(id) => id.as_str(),
        }
    }
}

/// One material line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecipeInputWire", into = "RecipeInputWire")]
pub struct RecipeInput {
    pub source: InputSource,
    pub quantity: Decimal,
}

impl RecipeInput {
    #[must_use]
    pub const fn raw(input_id: InputId, quantity: Decimal) -> Self {
        Self {
            source: InputSource::RawInput(input_id),
            quantity,
        }
    }

    #[must_use]
    pub const fn product(product_id: ProductId, quantity: Decimal) -> Self {
        Self {
            source: InputSource::Product(product_id),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum InputKind {
    Input,
    Product,
}

/// Stored shape of a recipe input line.
///
/// Older records use `{inputId, inputType}`; newer ones reference the
/// product directly with `{productId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeInputWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_type: Option<InputKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    product_id: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float")]
    quantity: Decimal,
}

impl TryFrom<RecipeInputWire> for RecipeInput {
    type Error = RecipeError;

    fn try_from(wire: RecipeInputWire) -> Result<Self, Self::Error> {
        let source = match (wire.product_id, wire.input_id, wire.input_type) {
            (Some(product_id), _, _) => InputSource::Product(product_id.into()),
            (None, Some(input_id), Some(InputKind::Product)) => {
                InputSource::Product(input_id.into())
            }
            (None, Some(input_id), _) => InputSource::RawInput(input_id.into()),
            (None, None, _) => return Err(RecipeError::MissingReference),
        };
        Ok(Self {
            source,
            quantity: wire.quantity,
        })
    }
}

impl From<RecipeInput> for RecipeInputWire {
    fn from(line: RecipeInput) -> Self {
        let (input_id, input_type) = match line.source {
            InputSource::RawInput(id) => (id.into_inner(), InputKind::Input),
            InputSource::Product(id) => (id.into_inner(), InputKind::Product),
        };
        Self {
            input_id: Some(input_id),
            input_type: Some(input_type),
            product_id: None,
            quantity: line.quantity,
        }
    }
}

/// One labor line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeLabor {
    pub role_id: LaborRoleId,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub hours: Decimal,
}

impl RecipeLabor {
    #[must_use]
    pub const fn new(role_id: LaborRoleId, hours: Decimal) -> Self {
        Self { role_id, hours }
    }
}

/// A bill of materials and labor producing `batch_yield` units of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default)]
    pub id: RecipeId,
    /// The product this recipe produces.
    #[serde(default)]
    pub product_id: ProductId,
    /// Units produced per batch.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub batch_yield: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub inputs: Vec<RecipeInput>,
    #[serde(default)]
    pub labor: Vec<RecipeLabor>,
}

impl Recipe {
    /// Create an active, empty recipe for `product_id`.
    #[must_use]
    pub fn new(id: impl Into<RecipeId>, product_id: impl Into<ProductId>, batch_yield: Decimal) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            batch_yield,
            active: true,
            created_at: None,
            inputs: Vec::new(),
            labor: Vec::new(),
        }
    }

    /// Add an input line (builder style).
    #[must_use]
    pub fn with_input(mut self, line: RecipeInput) -> Self {
        self.inputs.push(line);
        self
    }

    /// Add a labor line (builder style).
    #[must_use]
    pub fn with_labor(mut self, role_id: impl Into<LaborRoleId>, hours: Decimal) -> Self {
        self.labor.push(RecipeLabor::new(role_id.into(), hours));
        self
    }

    /// Returns true if any input line draws from `source`.
    #[must_use]
    pub fn uses_input(&self, source: &InputSource) -> bool {
        self.inputs.iter().any(|line| &line.source == source)
    }

    /// Returns true if any labor line uses `role_id`.
    #[must_use]
    pub fn uses_role(&self, role_id: &LaborRoleId) -> bool {
        self.labor.iter().any(|line| &line.role_id == role_id)
    }

    /// Validate the recipe before it is written to the store.
    ///
    /// Line numbers in errors are 1-based.
    ///
    /// # Errors
    ///
    /// Returns the first rule the recipe violates.
    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.product_id.is_empty() {
            return Err(RecipeError::MissingProduct);
        }
        if self.batch_yield <= Decimal::ZERO {
            return Err(RecipeError::NonPositiveBatchYield);
        }
        if let Some(index) = self.inputs.iter().position(|l| l.quantity <= Decimal::ZERO) {
            return Err(RecipeError::NonPositiveQuantity { line: index + 1 });
        }
        if let Some(index) = self.labor.iter().position(|l| l.hours <= Decimal::ZERO) {
            return Err(RecipeError::NonPositiveHours { line: index + 1 });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_legacy_input_line_defaults_to_raw_input() {
        let line: RecipeInput =
            serde_json::from_value(json!({"inputId": "i1", "quantity": 2})).unwrap();
        assert_eq!(line.source, InputSource::RawInput(InputId::new("i1")));
        assert_eq!(line.quantity, dec!(2));
    }

    #[test]
    fn test_input_type_product_reads_as_product() {
        let line: RecipeInput = serde_json::from_value(
            json!({"inputId": "p9", "inputType": "product", "quantity": "0.5"}),
        )
        .unwrap();
        assert_eq!(line.source, InputSource::Product(ProductId::new("p9")));
        assert_eq!(line.quantity, dec!(0.5));
    }

    #[test]
    fn test_product_id_line_reads_as_product() {
        let line: RecipeInput =
            serde_json::from_value(json!({"productId": "p3", "quantity": 1})).unwrap();
        assert_eq!(line.source, InputSource::Product(ProductId::new("p3")));
    }

    #[test]
    fn test_line_without_reference_is_rejected() {
        let result: Result<RecipeInput, _> = serde_json::from_value(json!({"quantity": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_line_serializes_with_input_type() {
        let line = RecipeInput::product(ProductId::new("p3"), dec!(1));
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["inputId"], json!("p3"));
        assert_eq!(value["inputType"], json!("product"));
        assert!(value.get("productId").is_none());
    }

    #[test]
    fn test_recipe_defaults_to_active() {
        let recipe: Recipe = serde_json::from_value(json!({
            "productId": "p1",
            "batchYield": 10,
            "createdAt": 1_700_000_000_000_i64,
            "inputs": [{"inputId": "i1", "inputType": "input", "quantity": 2}],
            "labor": [{"roleId": "r1", "hours": 1}]
        }))
        .unwrap();
        assert!(recipe.active);
        assert_eq!(recipe.batch_yield, dec!(10));
        assert!(recipe.created_at.is_some());
        assert!(recipe.uses_input(&InputSource::RawInput(InputId::new("i1"))));
        assert!(recipe.uses_role(&LaborRoleId::new("r1")));
    }

    #[test]
    fn test_validate_reports_line_numbers() {
        let recipe = Recipe::new("r1", "p1", dec!(10))
            .with_input(RecipeInput::raw(InputId::new("i1"), dec!(1)))
            .with_input(RecipeInput::raw(InputId::new("i2"), dec!(0)));
        assert_eq!(
            recipe.validate(),
            Err(RecipeError::NonPositiveQuantity { line: 2 })
        );

        let recipe = Recipe::new("r1", "p1", dec!(10)).with_labor("l1", dec!(-1));
        assert_eq!(
            recipe.validate(),
            Err(RecipeError::NonPositiveHours { line: 1 })
        );
    }

    #[test]
    fn test_validate_batch_yield_and_product() {
        assert_eq!(
            Recipe::new("r1", "p1", dec!(0)).validate(),
            Err(RecipeError::NonPositiveBatchYield)
        );
        assert_eq!(
            Recipe::new("r1", "", dec!(1)).validate(),
            Err(RecipeError::MissingProduct)
        );
        assert!(Recipe::new("r1", "p1", dec!(1)).validate().is_ok());
    }
}
