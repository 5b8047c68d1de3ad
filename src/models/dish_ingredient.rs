//! Dish Ingredient model
//!
//! Priced ingredient lines owned by a dish. Lines are never edited one by one;
//! the whole list is replaced whenever the dish's ingredients change.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::costing::IngredientLine;
use crate::db::DbResult;
use super::product::unit_from_column;

/// A stored ingredient line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishIngredient {
    pub id: i64,
    pub dish_id: i64,
    pub position: i64,
    #[serde(flatten)]
    pub line: IngredientLine,
}

impl DishIngredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            dish_id: row.get("dish_id")?,
            position: row.get("position")?,
            line: IngredientLine {
                product_id: row.get("product_id")?,
                name: row.get("name")?,
                quantity: row.get("quantity")?,
                display_quantity: row.get("display_quantity")?,
                display_unit: unit_from_column(row, "display_unit")?,
                price_per_unit: row.get("price_per_unit")?,
                cost: row.get("cost")?,
            },
        })
    }

    /// Replace every line of a dish with `lines`, keeping their order
    pub fn replace_for_dish(
        conn: &Connection,
        dish_id: i64,
        lines: &[IngredientLine],
    ) -> DbResult<Vec<Self>> {
        conn.execute("DELETE FROM dish_ingredients WHERE dish_id = ?1", [dish_id])?;

        let mut stmt = conn.prepare(
            r#"
            INSERT INTO dish_ingredients (
                dish_id, product_id, position, name,
                quantity, display_quantity, display_unit, price_per_unit, cost
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )?;

        for (position, line) in lines.iter().enumerate() {
            stmt.execute(params![
                dish_id,
                line.product_id,
                position as i64,
                line.name,
                line.quantity,
                line.display_quantity,
                line.display_unit.as_str(),
                line.price_per_unit,
                line.cost,
            ])?;
        }

        Self::get_for_dish(conn, dish_id)
    }

    /// All lines of a dish in submission order
    pub fn get_for_dish(conn: &Connection, dish_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM dish_ingredients WHERE dish_id = ?1 ORDER BY position",
        )?;

        let lines = stmt
            .query_map([dish_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    /// Count lines of a dish
    pub fn count_for_dish(conn: &Connection, dish_id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM dish_ingredients WHERE dish_id = ?1",
            [dish_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
