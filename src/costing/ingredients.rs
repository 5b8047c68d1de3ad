//! Ingredient cost calculation
//!
//! Turns raw ingredient input into priced lines plus the dish-level totals.
//!
//! `quantity` is expected to already be in the basis `price_per_unit` is quoted
//! in; `display_quantity`/`display_unit` are carried along for presentation only
//! and never enter the cost formula.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{CostingResult, ValidationError};
use super::units::Unit;

/// One ingredient as received from a caller, before validation.
///
/// Numeric fields accept JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawIngredient {
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub display_quantity: Option<Value>,
    #[serde(default)]
    pub display_unit: Option<String>,
    #[serde(default)]
    pub price_per_unit: Option<Value>,
}

/// A priced ingredient line, snapshotted when the dish is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub product_id: Option<i64>,
    pub name: String,
    /// Canonical quantity (grams or pieces)
    pub quantity: f64,
    pub display_quantity: f64,
    pub display_unit: Unit,
    pub price_per_unit: f64,
    pub cost: f64,
}

/// Dish-level weight and cost totals
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DishAggregate {
    /// Grams
    pub total_weight: f64,
    pub total_cost: f64,
}

/// Result of pricing a full ingredient list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishCosting {
    pub lines: Vec<IngredientLine>,
    pub total_cost: f64,
}

impl DishCosting {
    pub fn aggregate(&self) -> DishAggregate {
        DishAggregate {
            total_weight: calculate_dish_weight(&self.lines),
            total_cost: self.total_cost,
        }
    }
}

/// A line of a cost preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedLine {
    pub product_id: Option<i64>,
    pub name: String,
    pub quantity: f64,
    pub price_per_unit: f64,
    pub cost: f64,
}

/// Cost preview for an ingredient list that is not persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub lines: Vec<EstimatedLine>,
    pub total_cost: f64,
}

/// Validate and price a dish's ingredient list
pub fn compute_ingredients(raw: &[RawIngredient]) -> CostingResult<DishCosting> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyIngredients.into());
    }

    let lines = raw
        .iter()
        .enumerate()
        .map(|(line, ingredient)| price_line(line, ingredient))
        .collect::<CostingResult<Vec<_>>>()?;

    let total_cost = ensure_finite_total(lines.iter().fold(0.0, |acc, l| acc + l.cost))?;

    tracing::debug!(lines = lines.len(), total_cost, "Priced ingredient list");

    Ok(DishCosting { lines, total_cost })
}

fn price_line(line: usize, ingredient: &RawIngredient) -> CostingResult<IngredientLine> {
    let name = required_name(line, ingredient.name.as_deref())?;
    let quantity = parse_number(line, "quantity", ingredient.quantity.as_ref())?;
    let display_quantity =
        parse_number(line, "display_quantity", ingredient.display_quantity.as_ref())?;
    let display_unit: Unit = match ingredient.display_unit.as_deref().map(str::trim) {
        Some(u) if !u.is_empty() => u.parse()?,
        _ => {
            return Err(ValidationError::MissingField {
                line,
                field: "display_unit",
            }
            .into())
        }
    };
    let price_per_unit = parse_number(line, "price_per_unit", ingredient.price_per_unit.as_ref())?;

    ensure_positive(line, "quantity", quantity)?;
    ensure_positive(line, "display_quantity", display_quantity)?;
    ensure_non_negative(line, "price_per_unit", price_per_unit)?;

    Ok(IngredientLine {
        product_id: ingredient.product_id,
        name,
        quantity,
        display_quantity,
        display_unit,
        price_per_unit,
        cost: line_cost(line, quantity, price_per_unit)?,
    })
}

/// Price an ingredient list without display fields, for previews
pub fn estimate_cost(raw: &[RawIngredient]) -> CostingResult<CostEstimate> {
    let lines = raw
        .iter()
        .enumerate()
        .map(|(line, ingredient)| {
            let name = required_name(line, ingredient.name.as_deref())?;
            let quantity = parse_number(line, "quantity", ingredient.quantity.as_ref())?;
            let price_per_unit =
                parse_number(line, "price_per_unit", ingredient.price_per_unit.as_ref())?;
            ensure_positive(line, "quantity", quantity)?;
            ensure_non_negative(line, "price_per_unit", price_per_unit)?;

            Ok(EstimatedLine {
                product_id: ingredient.product_id,
                name,
                quantity,
                price_per_unit,
                cost: line_cost(line, quantity, price_per_unit)?,
            })
        })
        .collect::<CostingResult<Vec<_>>>()?;

    let total_cost = ensure_finite_total(lines.iter().fold(0.0, |acc, l| acc + l.cost))?;
    Ok(CostEstimate { lines, total_cost })
}

/// Total weight of a dish in grams, from canonical line quantities
pub fn calculate_dish_weight(lines: &[IngredientLine]) -> f64 {
    lines.iter().fold(0.0, |acc, l| acc + l.quantity)
}

fn required_name(line: usize, name: Option<&str>) -> CostingResult<String> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(n.to_string()),
        _ => Err(ValidationError::MissingField { line, field: "name" }.into()),
    }
}

fn parse_number(line: usize, field: &'static str, value: Option<&Value>) -> CostingResult<f64> {
    let invalid = |v: &Value| ValidationError::InvalidNumber {
        line,
        field,
        value: v.to_string(),
    };

    let parsed = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => {
                return Err(ValidationError::InvalidNumber {
                    line,
                    field,
                    value: s.clone(),
                }
                .into())
            }
        },
        // non-finite values are caught below
        Some(Value::Number(n)) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Some(other) => return Err(invalid(other).into()),
    };

    match parsed {
        None => Err(ValidationError::MissingField { line, field }.into()),
        Some(n) if !n.is_finite() => Err(ValidationError::InvalidNumber {
            line,
            field,
            value: n.to_string(),
        }
        .into()),
        Some(n) => Ok(n),
    }
}

fn line_cost(line: usize, quantity: f64, price_per_unit: f64) -> CostingResult<f64> {
    let cost = quantity * price_per_unit;
    if cost.is_finite() {
        Ok(cost)
    } else {
        Err(ValidationError::OutOfRange {
            line,
            field: "cost",
            value: cost,
        }
        .into())
    }
}

fn ensure_finite_total(total: f64) -> CostingResult<f64> {
    if total.is_finite() {
        Ok(total)
    } else {
        Err(ValidationError::TotalOutOfRange(total).into())
    }
}

fn ensure_positive(line: usize, field: &'static str, value: f64) -> CostingResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { line, field, value }.into())
    }
}

fn ensure_non_negative(line: usize, field: &'static str, value: f64) -> CostingResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { line, field, value }.into())
    }
}
