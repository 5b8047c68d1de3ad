//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- PRODUCTS
        -- Warehouse stock with derived unit price
        -- ============================================
        CREATE TABLE products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            category TEXT NOT NULL,
            unit TEXT NOT NULL CHECK(unit IN ('kg', 'g', 'l', 'ml', 'pcs', 'tbsp', 'tsp')),
            quantity REAL NOT NULL DEFAULT 0 CHECK(quantity >= 0),
            total_price REAL,                    -- purchase price, if the product came from a purchase
            price_per_unit REAL NOT NULL CHECK(price_per_unit >= 0),

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_products_category ON products(category);

        -- ============================================
        -- DISHES
        -- cost_price is the sum of ingredient line costs at write time
        -- ============================================
        CREATE TABLE dishes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            process TEXT,
            image_url TEXT NOT NULL DEFAULT 'https://via.placeholder.com/280x150',
            weight REAL NOT NULL CHECK(weight >= 0),   -- caller-supplied, grams
            cost_price REAL NOT NULL CHECK(cost_price >= 0),
            category_id INTEGER NOT NULL CHECK(category_id BETWEEN 1 AND 7),

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_dishes_category ON dishes(category_id);
        CREATE INDEX idx_dishes_created ON dishes(created_at);

        -- ============================================
        -- DISH INGREDIENTS
        -- Priced snapshot lines, rewritten wholesale with the dish
        -- ============================================
        CREATE TABLE dish_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dish_id INTEGER NOT NULL REFERENCES dishes(id) ON DELETE CASCADE,
            product_id INTEGER REFERENCES products(id) ON DELETE SET NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            quantity REAL NOT NULL CHECK(quantity >= 0),
            display_quantity REAL NOT NULL CHECK(display_quantity >= 0),
            display_unit TEXT NOT NULL CHECK(display_unit IN ('kg', 'g', 'l', 'ml', 'pcs', 'tbsp', 'tsp')),
            price_per_unit REAL NOT NULL CHECK(price_per_unit >= 0),
            cost REAL NOT NULL CHECK(cost >= 0),

            UNIQUE(dish_id, position)
        );

        CREATE INDEX idx_dish_ingredients_dish ON dish_ingredients(dish_id);
        CREATE INDEX idx_dish_ingredients_product ON dish_ingredients(product_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('products', 'dishes', 'dish_ingredients')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }
}
