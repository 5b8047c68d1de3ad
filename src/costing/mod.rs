//! Costing engine
//!
//! Unit normalisation, ingredient pricing and warehouse pricing. Pure functions
//! with no I/O; the tool layer persists what they return.

pub mod error;
pub mod ingredients;
pub mod pricing;
pub mod units;

pub use error::{CostingError, CostingResult, ValidationError};
pub use ingredients::{
    calculate_dish_weight, compute_ingredients, estimate_cost, CostEstimate, DishAggregate,
    DishCosting, EstimatedLine, IngredientLine, RawIngredient,
};
pub use pricing::{apply_quantity_adjustment, compute_price_per_unit, AdjustmentMode, PurchaseRecord};
pub use units::{
    canonicalize, convert_units, format_for_display, format_price, to_canonical_grams,
    CanonicalBase, Unit,
};
