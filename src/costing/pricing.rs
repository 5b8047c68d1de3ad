//! Warehouse product pricing
//!
//! Derives price-per-unit from a purchase and applies stock adjustments.

use serde::{Deserialize, Serialize};

use super::units::Unit;

/// A purchase of a warehouse product
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub total_price: f64,
    pub quantity: f64,
    pub unit: Unit,
}

impl PurchaseRecord {
    /// Price of one unit of the purchase, zero for a non-positive quantity
    pub fn price_per_unit(&self) -> f64 {
        compute_price_per_unit(self.total_price, self.quantity)
    }
}

/// Divide a total price over the purchased quantity.
///
/// A quantity of zero or less yields zero rather than an error.
pub fn compute_price_per_unit(total_price: f64, quantity: f64) -> f64 {
    if quantity > 0.0 {
        total_price / quantity
    } else {
        tracing::warn!(total_price, quantity, "Non-positive purchase quantity, price per unit set to 0");
        0.0
    }
}

/// How a stock quantity change is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentMode {
    #[default]
    Set,
    Add,
    Subtract,
}

impl AdjustmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentMode::Set => "set",
            AdjustmentMode::Add => "add",
            AdjustmentMode::Subtract => "subtract",
        }
    }

    /// Parse a mode string; anything unrecognised means `Set`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "add" => AdjustmentMode::Add,
            "subtract" => AdjustmentMode::Subtract,
            "set" => AdjustmentMode::Set,
            other => {
                tracing::debug!(mode = other, "Unrecognised adjustment mode, using set");
                AdjustmentMode::Set
            }
        }
    }
}

/// Apply a stock adjustment; subtraction clamps at zero
pub fn apply_quantity_adjustment(current: f64, delta: f64, mode: AdjustmentMode) -> f64 {
    match mode {
        AdjustmentMode::Set => delta,
        AdjustmentMode::Add => current + delta,
        AdjustmentMode::Subtract => (current - delta).max(0.0),
    }
}
