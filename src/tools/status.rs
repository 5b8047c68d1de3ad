//! CostChef Status Tool
//!
//! Provides runtime status information about the CostChef service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Costing guide for AI assistants
pub const COSTING_INSTRUCTIONS: &str = r#"
# CostChef Costing Instructions

This guide explains how to keep a priced warehouse and cost dishes with the
CostChef tools.

## Overview

1. **Products** - Warehouse stock with a unit and a price per unit
2. **Dishes** - Recipes built from priced ingredient lines
3. **Cost price** - The sum of all line costs, stored with the dish

---

## Units

Allowed units: `kg`, `g`, `l`, `ml`, `pcs`, `tbsp`, `tsp`.

| Unit | Canonical value |
|------|-----------------|
| kg | value x 1000 (grams) |
| l | value x 1000 (treated as grams, density 1) |
| g, ml | value |
| pcs | value (pieces) |
| tbsp, tsp | value (no gram equivalence) |

Any other unit label is rejected.

---

## Adding Products

**Tool:** `add_product`

Give either:
- `total_price` for the whole purchase together with `quantity`. The price per
  unit is `total_price / quantity`, or 0 when quantity is 0.
- `price_per_unit` directly.

Giving both is rejected.

The price per unit is fixed at creation. `adjust_product_quantity` changes the
stock only:
- `set` replaces the quantity
- `add` increases it
- `subtract` decreases it, never below 0

Unknown operations are treated as `set`.

---

## Creating Dishes

**Tool:** `create_dish`

Every ingredient line needs:
- `name`
- `quantity` > 0, in the same basis the price is quoted in
- `display_quantity` > 0 and `display_unit`, shown to people only
- `price_per_unit` >= 0
- `product_id` (optional) links the line to a warehouse product

**IMPORTANT:** `cost = quantity x price_per_unit`. No unit conversion is applied.
If a product is priced per kg, give the quantity in kg. If it is priced per g,
give grams.

Numbers may be sent as JSON numbers or numeric strings.

The dish `weight` is what you enter. `get_dish` also reports `computed_weight`,
the sum of the line quantities.

---

## Updating Dishes

**Tool:** `update_dish`

- Sending `ingredients` replaces the whole list and recomputes `cost_price`.
- Leaving `ingredients` out keeps the existing lines and cost.
- Lines are snapshots: later product price changes do not reprice a dish.
  Send the ingredients again to reprice it.

---

## Previewing Costs

**Tool:** `estimate_dish_cost`

Prices a list of `{name, quantity, price_per_unit}` without saving anything.

---

## Dish Categories

| id | name |
|----|------|
| 1 | Appetizers |
| 2 | Salads |
| 3 | Soups |
| 4 | Main courses |
| 5 | Desserts |
| 6 | Drinks |
| 7 | Other |

---

## Notes

- Product and dish names are unique
- `copy_dish` creates "<name> (copy)" with the same lines and cost
- Deleting a product keeps the dish lines that used it, unlinked
- Listings are newest first; `page` starts at 1 and `limit` defaults to 10
"#;

/// Runtime status of the CostChef service
#[derive(Debug, Clone, Serialize)]
pub struct CostChefStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,

    /// Process information
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    started_at: DateTime<Utc>,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: Utc::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, schema_version: Option<i32>) -> CostChefStatus {
        let build_info = BuildInfo::current();

        // in-memory databases have no file
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        CostChefStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            started_at: self.started_at,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_missing_file() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/costchef.db"));
        let status = tracker.get_status(Some(1));
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.schema_version, Some(1));
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn test_instructions_list_every_unit() {
        for unit in crate::costing::Unit::ALL {
            assert!(COSTING_INSTRUCTIONS.contains(&format!("`{}`", unit.as_str())));
        }
    }
}
