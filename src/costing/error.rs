//! Costing errors

use thiserror::Error;

/// Malformed or missing input to a cost calculation.
///
/// `line` is the zero-based position of the ingredient in the submitted list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("at least one ingredient required")]
    EmptyIngredients,

    #[error("ingredient {line}: missing required field '{field}'")]
    MissingField { line: usize, field: &'static str },

    #[error("ingredient {line}: field '{field}' is not a finite number (got {value})")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("ingredient {line}: field '{field}' is out of range (got {value})")]
    OutOfRange {
        line: usize,
        field: &'static str,
        value: f64,
    },

    #[error("total cost is out of range (got {0})")]
    TotalOutOfRange(f64),

    #[error("quantity must not be negative (got {0})")]
    NegativeQuantity(f64),
}

/// Error type for the costing engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostingError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("unknown unit '{0}' (expected one of kg, g, l, ml, pcs, tbsp, tsp)")]
    UnknownUnit(String),
}

pub type CostingResult<T> = Result<T, CostingError>;
