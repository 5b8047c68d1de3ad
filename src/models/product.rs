//! Product model
//!
//! Represents a warehouse product with stock quantity and unit price.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::costing::Unit;
use crate::db::{DbError, DbResult};

/// A warehouse product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub unit: Unit,
    pub quantity: f64,
    pub total_price: Option<f64>,
    pub price_per_unit: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
    pub unit: Unit,
    #[serde(default)]
    pub quantity: f64,
    pub total_price: Option<f64>,
    pub price_per_unit: f64,
}

/// Data for updating a product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<Unit>,
    pub price_per_unit: Option<f64>,
    pub quantity: Option<f64>,
}

/// Filter and paging for product listings
#[derive(Debug, Clone, Default)]
pub struct ProductFilter<'a> {
    /// Substring match on name or category
    pub search: Option<&'a str>,
    /// Exact category
    pub category: Option<&'a str>,
}

pub(crate) fn unit_from_column(row: &Row, column: &str) -> rusqlite::Result<Unit> {
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e: crate::costing::CostingError| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            category: row.get("category")?,
            unit: unit_from_column(row, "unit")?,
            quantity: row.get("quantity")?,
            total_price: row.get("total_price")?,
            price_per_unit: row.get("price_per_unit")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new product
    pub fn create(conn: &Connection, data: &ProductCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO products (name, category, unit, quantity, total_price, price_per_unit)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                data.name,
                data.category,
                data.unit.as_str(),
                data.quantity,
                data.total_price,
                data.price_per_unit,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a product by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM products WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a product by its exact name
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM products WHERE name = ?1")?;

        match stmt.query_row([name], Self::from_row) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List products, newest first
    pub fn list(
        conn: &Connection,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let (where_sql, mut values) = Self::where_clause(filter);
        let sql = format!(
            "SELECT * FROM products{} ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
            where_sql,
            values.len() + 1,
            values.len() + 2
        );
        values.push(Box::new(limit));
        values.push(Box::new(offset));

        let params_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products)
    }

    /// Count products matching a filter
    pub fn count(conn: &Connection, filter: &ProductFilter) -> DbResult<i64> {
        let (where_sql, values) = Self::where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM products{}", where_sql);
        let params_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    fn where_clause(filter: &ProductFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut clauses = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(search) = filter.search {
            let n = values.len() + 1;
            clauses.push(format!("(name LIKE ?{n} OR category LIKE ?{n})"));
            values.push(Box::new(format!("%{}%", search)));
        }
        if let Some(category) = filter.category {
            clauses.push(format!("category = ?{}", values.len() + 1));
            values.push(Box::new(category.to_string()));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }

    /// Update a product
    pub fn update(conn: &Connection, id: i64, data: &ProductUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(name, "name");
        add_update!(category, "category");
        add_update!(price_per_unit, "price_per_unit");
        add_update!(quantity, "quantity");

        if let Some(unit) = data.unit {
            updates.push(format!("unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit.as_str()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE products SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Overwrite the stock quantity; price_per_unit is left untouched
    pub fn set_quantity(conn: &Connection, id: i64, quantity: f64) -> DbResult<Option<Self>> {
        let rows = conn.execute(
            "UPDATE products SET quantity = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![quantity, id],
        )?;
        if rows == 0 {
            return Ok(None);
        }
        Self::get_by_id(conn, id)
    }

    /// Distinct product categories, alphabetically
    pub fn categories(conn: &Connection) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare("SELECT DISTINCT category FROM products ORDER BY category")?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(categories)
    }

    /// Number of dish ingredient lines referencing this product
    pub fn get_dish_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM dish_ingredients WHERE product_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a product. Ingredient lines keep their snapshot and lose the reference.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn flour() -> ProductCreate {
        ProductCreate {
            name: "Flour".to_string(),
            category: "Dry goods".to_string(),
            unit: Unit::Kg,
            quantity: 10.0,
            total_price: Some(25.0),
            price_per_unit: 2.5,
        }
    }

    #[test]
    fn test_create_and_get() {
        let conn = conn();
        let product = Product::create(&conn, &flour()).unwrap();
        assert_eq!(product.unit, Unit::Kg);
        assert_eq!(product.price_per_unit, 2.5);

        let by_name = Product::get_by_name(&conn, "Flour").unwrap().unwrap();
        assert_eq!(by_name.id, product.id);
        assert!(Product::get_by_id(&conn, product.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_list_filters() {
        let conn = conn();
        Product::create(&conn, &flour()).unwrap();
        Product::create(
            &conn,
            &ProductCreate {
                name: "Milk".to_string(),
                category: "Dairy".to_string(),
                unit: Unit::L,
                quantity: 4.0,
                total_price: None,
                price_per_unit: 1.1,
            },
        )
        .unwrap();

        let all = ProductFilter::default();
        assert_eq!(Product::count(&conn, &all).unwrap(), 2);
        assert_eq!(Product::list(&conn, &all, 1, 0).unwrap().len(), 1);

        let dairy = ProductFilter {
            category: Some("Dairy"),
            ..Default::default()
        };
        let listed = Product::list(&conn, &dairy, 10, 0).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Milk");

        let search = ProductFilter {
            search: Some("dry"),
            ..Default::default()
        };
        assert_eq!(Product::count(&conn, &search).unwrap(), 1);

        assert_eq!(Product::categories(&conn).unwrap(), vec!["Dairy", "Dry goods"]);
    }

    #[test]
    fn test_update_and_set_quantity() {
        let conn = conn();
        let product = Product::create(&conn, &flour()).unwrap();

        let updated = Product::update(
            &conn,
            product.id,
            &ProductUpdate {
                unit: Some(Unit::G),
                price_per_unit: Some(0.0025),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.unit, Unit::G);
        assert_eq!(updated.price_per_unit, 0.0025);

        let restocked = Product::set_quantity(&conn, product.id, 42.0).unwrap().unwrap();
        assert_eq!(restocked.quantity, 42.0);
        assert_eq!(restocked.price_per_unit, 0.0025);

        assert!(Product::set_quantity(&conn, 999, 1.0).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let conn = conn();
        let product = Product::create(&conn, &flour()).unwrap();
        assert!(Product::delete(&conn, product.id).unwrap());
        assert!(!Product::delete(&conn, product.id).unwrap());
    }
}
