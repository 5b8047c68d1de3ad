//! Unit types and conversion
//!
//! Every warehouse quantity is reduced to one of two canonical bases before
//! arithmetic: grams for mass and volume, pieces for counts. Volume is treated
//! as mass at a density of 1 (1 l == 1 kg).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CostingError, CostingResult, ValidationError};

/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;
/// Grams per liter, assuming the density of water
pub const G_PER_LITER: f64 = 1000.0;

/// Measurement unit accepted for products and ingredient lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    G,
    L,
    Ml,
    Pcs,
    Tbsp,
    Tsp,
}

/// Canonical base a unit reduces to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalBase {
    /// Grams (kg, g, l, ml; spoons pass through as-is)
    Mass,
    /// Pieces
    Count,
}

impl Unit {
    pub const ALL: [Unit; 7] = [
        Unit::Kg,
        Unit::G,
        Unit::L,
        Unit::Ml,
        Unit::Pcs,
        Unit::Tbsp,
        Unit::Tsp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "l",
            Unit::Ml => "ml",
            Unit::Pcs => "pcs",
            Unit::Tbsp => "tbsp",
            Unit::Tsp => "tsp",
        }
    }

    /// Factor that takes a value in this unit to its canonical base.
    ///
    /// Spoon units have no gram equivalence and pass through unchanged.
    pub fn canonical_factor(&self) -> f64 {
        match self {
            Unit::Kg => G_PER_KG,
            Unit::L => G_PER_LITER,
            Unit::G | Unit::Ml | Unit::Pcs | Unit::Tbsp | Unit::Tsp => 1.0,
        }
    }

    pub fn canonical_base(&self) -> CanonicalBase {
        match self {
            Unit::Pcs => CanonicalBase::Count,
            _ => CanonicalBase::Mass,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = CostingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(Unit::Kg),
            "g" => Ok(Unit::G),
            "l" => Ok(Unit::L),
            "ml" => Ok(Unit::Ml),
            "pcs" => Ok(Unit::Pcs),
            "tbsp" => Ok(Unit::Tbsp),
            "tsp" => Ok(Unit::Tsp),
            _ => Err(CostingError::UnknownUnit(s.to_string())),
        }
    }
}

/// Convert a quantity into its canonical base (grams or pieces)
pub fn to_canonical_grams(value: f64, unit: Unit) -> CostingResult<f64> {
    if value < 0.0 {
        return Err(ValidationError::NegativeQuantity(value).into());
    }
    if matches!(unit, Unit::Tbsp | Unit::Tsp) {
        tracing::debug!(unit = %unit, value, "No gram equivalence for spoon unit, passing value through");
    }
    Ok(value * unit.canonical_factor())
}

/// Convert a quantity given with a unit label
pub fn canonicalize(value: f64, unit: &str) -> CostingResult<f64> {
    let unit: Unit = unit.parse()?;
    to_canonical_grams(value, unit)
}

/// Convert between units by way of grams
///
/// A count target rounds to whole pieces.
pub fn convert_units(value: f64, from: Unit, to: Unit) -> f64 {
    if from == to {
        return value;
    }

    let grams = value * from.canonical_factor();
    match to {
        Unit::Kg | Unit::L => grams / 1000.0,
        Unit::Pcs => grams.round(),
        _ => grams,
    }
}

/// Render a canonical value for a display unit
pub fn format_for_display(canonical_grams: f64, target: Unit) -> String {
    match target {
        Unit::Kg => {
            if canonical_grams < G_PER_KG {
                format!("{} g", canonical_grams.round())
            } else {
                format!("{:.3} kg", canonical_grams / G_PER_KG)
            }
        }
        // liter-denominated values are tracked by the caller; no back-conversion here
        Unit::L => format!("{:.3} l", canonical_grams),
        Unit::Pcs => format!("{} pcs", canonical_grams.round()),
        other => format!("{:.2} {}", canonical_grams, other),
    }
}

/// Format a monetary amount to two decimals
pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_canonical_grams() {
        assert_eq!(to_canonical_grams(2.0, Unit::Kg).unwrap(), 2000.0);
        assert_eq!(to_canonical_grams(500.0, Unit::G).unwrap(), 500.0);
        assert_eq!(to_canonical_grams(1.5, Unit::L).unwrap(), 1500.0);
        assert_eq!(to_canonical_grams(250.0, Unit::Ml).unwrap(), 250.0);
        assert_eq!(to_canonical_grams(3.0, Unit::Pcs).unwrap(), 3.0);
    }

    #[test]
    fn test_spoons_pass_through() {
        assert_eq!(to_canonical_grams(2.0, Unit::Tbsp).unwrap(), 2.0);
        assert_eq!(to_canonical_grams(0.5, Unit::Tsp).unwrap(), 0.5);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = to_canonical_grams(-1.0, Unit::G).unwrap_err();
        assert_eq!(
            err,
            CostingError::Validation(ValidationError::NegativeQuantity(-1.0))
        );
    }

    #[test]
    fn test_unknown_unit() {
        assert_eq!(
            canonicalize(1.0, "cup"),
            Err(CostingError::UnknownUnit("cup".to_string()))
        );
        assert_eq!(canonicalize(1.0, " KG ").unwrap(), 1000.0);
    }

    #[test]
    fn test_unit_parse_round_trip_labels() {
        for unit in Unit::ALL {
            assert_eq!(unit.as_str().parse::<Unit>().unwrap(), unit);
        }
    }

    #[test]
    fn test_canonical_base() {
        assert_eq!(Unit::Pcs.canonical_base(), CanonicalBase::Count);
        assert_eq!(Unit::L.canonical_base(), CanonicalBase::Mass);
    }

    #[test]
    fn test_format_kg() {
        assert_eq!(format_for_display(750.0, Unit::Kg), "750 g");
        assert_eq!(format_for_display(999.6, Unit::Kg), "1000 g");
        assert_eq!(format_for_display(1500.0, Unit::Kg), "1.500 kg");
    }

    #[test]
    fn test_format_other_units() {
        assert_eq!(format_for_display(1.25, Unit::L), "1.250 l");
        assert_eq!(format_for_display(3.4, Unit::Pcs), "3 pcs");
        assert_eq!(format_for_display(12.0, Unit::G), "12.00 g");
        assert_eq!(format_for_display(2.0, Unit::Tbsp), "2.00 tbsp");
    }

    #[test]
    fn test_convert_units() {
        assert_eq!(convert_units(2.0, Unit::Kg, Unit::Kg), 2.0);
        assert_eq!(convert_units(2.0, Unit::Kg, Unit::G), 2000.0);
        assert_eq!(convert_units(500.0, Unit::G, Unit::Kg), 0.5);
        assert_eq!(convert_units(1.0, Unit::L, Unit::Ml), 1000.0);
        assert_eq!(convert_units(12.6, Unit::G, Unit::Pcs), 13.0);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(1.3), "1.30");
        assert_eq!(format_price(0.0), "0.00");
    }
}
