//! Dish model
//!
//! Represents a dish with its snapshotted cost price.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

pub const DEFAULT_IMAGE_URL: &str = "https://via.placeholder.com/280x150";

/// A dish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub process: Option<String>,
    pub image_url: String,
    /// Caller-supplied weight in grams
    pub weight: f64,
    /// Sum of ingredient line costs at the last ingredient write
    pub cost_price: f64,
    pub category_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new dish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishCreate {
    pub name: String,
    pub description: Option<String>,
    pub process: Option<String>,
    pub image_url: Option<String>,
    pub weight: f64,
    pub cost_price: f64,
    pub category_id: i64,
}

/// Data for updating dish metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DishUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub process: Option<String>,
    pub image_url: Option<String>,
    pub weight: Option<f64>,
    pub category_id: Option<i64>,
}

/// Filter for dish listings
#[derive(Debug, Clone, Default)]
pub struct DishFilter<'a> {
    pub search: Option<&'a str>,
    pub category_id: Option<i64>,
}

impl Dish {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            process: row.get("process")?,
            image_url: row.get("image_url")?,
            weight: row.get("weight")?,
            cost_price: row.get("cost_price")?,
            category_id: row.get("category_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new dish (ingredient lines are written separately)
    pub fn create(conn: &Connection, data: &DishCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO dishes (name, description, process, image_url, weight, cost_price, category_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                data.name,
                data.description,
                data.process,
                data.image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL),
                data.weight,
                data.cost_price,
                data.category_id,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a dish by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM dishes WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(dish) => Ok(Some(dish)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a dish by its exact name
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM dishes WHERE name = ?1")?;

        match stmt.query_row([name], Self::from_row) {
            Ok(dish) => Ok(Some(dish)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List dishes, newest first
    pub fn list(conn: &Connection, filter: &DishFilter, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let (where_sql, mut values) = Self::where_clause(filter);
        let sql = format!(
            "SELECT * FROM dishes{} ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
            where_sql,
            values.len() + 1,
            values.len() + 2
        );
        values.push(Box::new(limit));
        values.push(Box::new(offset));

        let params_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let dishes = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(dishes)
    }

    /// Count dishes matching a filter
    pub fn count(conn: &Connection, filter: &DishFilter) -> DbResult<i64> {
        let (where_sql, values) = Self::where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM dishes{}", where_sql);
        let params_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    fn where_clause(filter: &DishFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut clauses = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(search) = filter.search {
            clauses.push(format!("name LIKE ?{}", values.len() + 1));
            values.push(Box::new(format!("%{}%", search)));
        }
        if let Some(category_id) = filter.category_id {
            clauses.push(format!("category_id = ?{}", values.len() + 1));
            values.push(Box::new(category_id));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }

    /// Update dish metadata
    pub fn update(conn: &Connection, id: i64, data: &DishUpdate) -> DbResult<Option<Self>> {
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
        add_update!(description, "description");
        add_update!(process, "process");
        add_update!(image_url, "image_url");
        add_update!(weight, "weight");
        add_update!(category_id, "category_id");

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE dishes SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Store a new cost price after the ingredient list was replaced
    pub fn update_costing(conn: &Connection, id: i64, cost_price: f64) -> DbResult<()> {
        conn.execute(
            "UPDATE dishes SET cost_price = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![cost_price, id],
        )?;
        Ok(())
    }

    /// Delete a dish; its ingredient lines cascade
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM dishes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::{IngredientLine, Unit};
    use crate::db::migrations::run_migrations;
    use crate::models::{DishIngredient, Product, ProductCreate};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn soup() -> DishCreate {
        DishCreate {
            name: "Tomato soup".to_string(),
            description: None,
            process: Some("Simmer".to_string()),
            image_url: None,
            weight: 350.0,
            cost_price: 1.2,
            category_id: 3,
        }
    }

    fn line(product_id: Option<i64>, name: &str, quantity: f64, price: f64) -> IngredientLine {
        IngredientLine {
            product_id,
            name: name.to_string(),
            quantity,
            display_quantity: quantity,
            display_unit: Unit::G,
            price_per_unit: price,
            cost: quantity * price,
        }
    }

    #[test]
    fn test_create_uses_default_image() {
        let conn = conn();
        let dish = Dish::create(&conn, &soup()).unwrap();
        assert_eq!(dish.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(dish.category_id, 3);
    }

    #[test]
    fn test_duplicate_name_rejected_by_schema() {
        let conn = conn();
        Dish::create(&conn, &soup()).unwrap();
        assert!(Dish::create(&conn, &soup()).is_err());
    }

    #[test]
    fn test_update_metadata() {
        let conn = conn();
        let dish = Dish::create(&conn, &soup()).unwrap();
        let updated = Dish::update(
            &conn,
            dish.id,
            &DishUpdate {
                weight: Some(400.0),
                description: Some("Smooth".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.weight, 400.0);
        assert_eq!(updated.description.as_deref(), Some("Smooth"));
        assert_eq!(updated.cost_price, 1.2);
    }

    #[test]
    fn test_lines_replace_and_cascade() {
        let conn = conn();
        let dish = Dish::create(&conn, &soup()).unwrap();

        let first = DishIngredient::replace_for_dish(
            &conn,
            dish.id,
            &[line(None, "Tomato", 300.0, 0.003), line(None, "Salt", 5.0, 0.001)],
        )
        .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].line.name, "Salt");

        let second =
            DishIngredient::replace_for_dish(&conn, dish.id, &[line(None, "Tomato", 320.0, 0.003)])
                .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(DishIngredient::count_for_dish(&conn, dish.id).unwrap(), 1);

        assert!(Dish::delete(&conn, dish.id).unwrap());
        assert_eq!(DishIngredient::count_for_dish(&conn, dish.id).unwrap(), 0);
    }

    #[test]
    fn test_deleting_product_keeps_line_snapshot() {
        let conn = conn();
        let product = Product::create(
            &conn,
            &ProductCreate {
                name: "Tomato".to_string(),
                category: "Vegetables".to_string(),
                unit: Unit::G,
                quantity: 1000.0,
                total_price: Some(3.0),
                price_per_unit: 0.003,
            },
        )
        .unwrap();
        let dish = Dish::create(&conn, &soup()).unwrap();
        DishIngredient::replace_for_dish(&conn, dish.id, &[line(Some(product.id), "Tomato", 300.0, 0.003)])
            .unwrap();

        assert_eq!(Product::get_dish_usage_count(&conn, product.id).unwrap(), 1);
        Product::delete(&conn, product.id).unwrap();

        let lines = DishIngredient::get_for_dish(&conn, dish.id).unwrap();
        assert_eq!(lines[0].line.product_id, None);
        assert_eq!(lines[0].line.price_per_unit, 0.003);
    }

    #[test]
    fn test_list_and_count() {
        let conn = conn();
        Dish::create(&conn, &soup()).unwrap();
        Dish::create(
            &conn,
            &DishCreate {
                name: "Fruit salad".to_string(),
                category_id: 2,
                ..soup()
            },
        )
        .unwrap();

        let soups = DishFilter {
            category_id: Some(3),
            ..Default::default()
        };
        assert_eq!(Dish::count(&conn, &soups).unwrap(), 1);

        let salad = DishFilter {
            search: Some("salad"),
            ..Default::default()
        };
        let listed = Dish::list(&conn, &salad, 10, 0).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Fruit salad");

        let all = Dish::list(&conn, &DishFilter::default(), 10, 0).unwrap();
        assert_eq!(all[0].name, "Fruit salad");
    }
}
