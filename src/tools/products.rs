//! Product MCP Tools
//!
//! Tools for managing warehouse products.

use serde::Serialize;

use crate::costing::{apply_quantity_adjustment, AdjustmentMode, PurchaseRecord, Unit};
use crate::db::{Database, DbError};
use crate::models::{Product, ProductCreate, ProductFilter, ProductUpdate};

use super::{is_unique_violation, required_name, Pagination, ToolError, ToolResult};

const MAX_NAME_LEN: usize = 100;
const MAX_CATEGORY_LEN: usize = 50;

/// Input for add_product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub quantity: f64,
    /// Price of the whole purchase; price_per_unit is derived from it.
    /// Exactly one of the two prices must be given.
    pub total_price: Option<f64>,
    pub price_per_unit: Option<f64>,
}

/// Input for update_product
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
    pub quantity: Option<f64>,
}

/// Response for list_products
#[derive(Debug, Serialize)]
pub struct ListProductsResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Response for adjust_product_quantity
#[derive(Debug, Serialize)]
pub struct AdjustQuantityResponse {
    pub operation: &'static str,
    pub previous_quantity: f64,
    pub product: Product,
}

/// Response for delete_product
#[derive(Debug, Serialize)]
pub struct DeleteProductResponse {
    pub success: bool,
    pub deleted_id: i64,
    /// Dish ingredient lines that referenced the product and now keep only their snapshot
    pub detached_lines: i64,
}

fn parse_unit(raw: &str) -> ToolResult<Unit> {
    Ok(raw.parse::<Unit>()?)
}

fn check_length(field: &str, value: &str, max: usize) -> ToolResult<()> {
    if value.chars().count() > max {
        return Err(ToolError::Invalid(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn name_taken(name: &str) -> ToolError {
    ToolError::Conflict(format!("A product named '{}' already exists", name))
}

/// Map a UNIQUE violation on write to a name conflict
fn conflict_on_unique(name: &str, e: rusqlite::Error) -> ToolError {
    if is_unique_violation(&e) {
        name_taken(name)
    } else {
        e.into()
    }
}

fn check_non_negative(field: &str, value: f64) -> ToolResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ToolError::Invalid(format!(
            "{} must be a non-negative number (got {})",
            field, value
        )));
    }
    Ok(())
}

/// Add a product to the warehouse
pub fn add_product(db: &Database, data: NewProduct) -> ToolResult<Product> {
    let name = required_name("Product name", &data.name)?;
    let category = required_name("Category", &data.category)?;
    check_length("name", &name, MAX_NAME_LEN)?;
    check_length("category", &category, MAX_CATEGORY_LEN)?;
    let unit = parse_unit(&data.unit)?;
    check_non_negative("quantity", data.quantity)?;

    let price_per_unit = match (data.total_price, data.price_per_unit) {
        (Some(_), Some(_)) => {
            return Err(ToolError::Invalid(
                "Give either price_per_unit or total_price, not both".to_string(),
            ))
        }
        (Some(total_price), None) => {
            check_non_negative("total_price", total_price)?;
            PurchaseRecord {
                total_price,
                quantity: data.quantity,
                unit,
            }
            .price_per_unit()
        }
        (None, Some(price)) => price,
        (None, None) => {
            return Err(ToolError::Invalid(
                "Either price_per_unit or total_price is required".to_string(),
            ))
        }
    };
    check_non_negative("price_per_unit", price_per_unit)?;

    let product = db.with_transaction(|tx| -> ToolResult<Product> {
        if Product::get_by_name(tx, &name)?.is_some() {
            return Err(name_taken(&name));
        }
        Product::create(
            tx,
            &ProductCreate {
                name: name.clone(),
                category,
                unit,
                quantity: data.quantity,
                total_price: data.total_price,
                price_per_unit,
            },
        )
        .map_err(|e| match e {
            DbError::Sqlite(e) => conflict_on_unique(&name, e),
            other => other.into(),
        })
    })?;

    tracing::info!(id = product.id, name = %product.name, price_per_unit, "Product added");
    Ok(product)
}

/// Get a product by ID
pub fn get_product(db: &Database, id: i64) -> ToolResult<Product> {
    let conn = db.get_conn()?;
    Product::get_by_id(&conn, id)?.ok_or(ToolError::NotFound { entity: "Product", id })
}

/// List products, newest first
pub fn list_products(
    db: &Database,
    search: Option<&str>,
    category: Option<&str>,
    page: Option<i64>,
    limit: Option<i64>,
) -> ToolResult<ListProductsResponse> {
    let (page, limit) = Pagination::clamp(page, limit);
    let filter = ProductFilter {
        search: search.map(str::trim).filter(|s| !s.is_empty()),
        category: category.map(str::trim).filter(|s| !s.is_empty()),
    };

    let conn = db.get_conn()?;
    let total = Product::count(&conn, &filter)?;
    let pagination = Pagination::new(page, limit, total);
    let products = Product::list(&conn, &filter, limit, pagination.offset())?;

    Ok(ListProductsResponse {
        products,
        pagination,
    })
}

/// Update product fields. Stored ingredient lines keep their old price snapshot.
pub fn update_product(db: &Database, id: i64, changes: ProductChanges) -> ToolResult<Product> {
    let name = changes
        .name
        .as_deref()
        .map(|n| required_name("Product name", n))
        .transpose()?;
    if let Some(ref n) = name {
        check_length("name", n, MAX_NAME_LEN)?;
    }
    let category = changes
        .category
        .as_deref()
        .map(|c| required_name("Category", c))
        .transpose()?;
    if let Some(ref c) = category {
        check_length("category", c, MAX_CATEGORY_LEN)?;
    }
    let unit = changes.unit.as_deref().map(parse_unit).transpose()?;
    if let Some(price) = changes.price_per_unit {
        check_non_negative("price_per_unit", price)?;
    }
    if let Some(quantity) = changes.quantity {
        check_non_negative("quantity", quantity)?;
    }

    let product = db.with_transaction(|tx| -> ToolResult<Product> {
        let existing = Product::get_by_id(tx, id)?.ok_or(ToolError::NotFound { entity: "Product", id })?;

        if let Some(ref n) = name {
            if *n != existing.name {
                if let Some(other) = Product::get_by_name(tx, n)? {
                    if other.id != id {
                        return Err(name_taken(n));
                    }
                }
            }
        }

        let update = ProductUpdate {
            name: name.clone(),
            category,
            unit,
            price_per_unit: changes.price_per_unit,
            quantity: changes.quantity,
        };

        Product::update(tx, id, &update)
            .map_err(|e| match (e, name.as_deref()) {
                (DbError::Sqlite(e), Some(n)) => conflict_on_unique(n, e),
                (other, _) => other.into(),
            })?
            .ok_or(ToolError::NotFound { entity: "Product", id })
    })?;
    tracing::info!(id, "Product updated");
    Ok(product)
}

/// Change the stock quantity with set/add/subtract semantics
pub fn adjust_product_quantity(
    db: &Database,
    id: i64,
    quantity: f64,
    operation: Option<&str>,
) -> ToolResult<AdjustQuantityResponse> {
    if !quantity.is_finite() {
        return Err(ToolError::Invalid(format!(
            "quantity must be a finite number (got {})",
            quantity
        )));
    }
    let mode = operation.map(AdjustmentMode::parse).unwrap_or_default();

    let conn = db.get_conn()?;
    let product = Product::get_by_id(&conn, id)?.ok_or(ToolError::NotFound { entity: "Product", id })?;

    let new_quantity = apply_quantity_adjustment(product.quantity, quantity, mode);
    check_non_negative("resulting quantity", new_quantity)?;

    let updated =
        Product::set_quantity(&conn, id, new_quantity)?.ok_or(ToolError::NotFound { entity: "Product", id })?;

    tracing::info!(
        id,
        operation = mode.as_str(),
        from = product.quantity,
        to = new_quantity,
        "Product quantity adjusted"
    );

    Ok(AdjustQuantityResponse {
        operation: mode.as_str(),
        previous_quantity: product.quantity,
        product: updated,
    })
}

/// Delete a product
pub fn delete_product(db: &Database, id: i64) -> ToolResult<DeleteProductResponse> {
    let conn = db.get_conn()?;

    if Product::get_by_id(&conn, id)?.is_none() {
        return Err(ToolError::NotFound { entity: "Product", id });
    }

    let detached_lines = Product::get_dish_usage_count(&conn, id)?;
    Product::delete(&conn, id)?;

    tracing::info!(id, detached_lines, "Product deleted");

    Ok(DeleteProductResponse {
        success: true,
        deleted_id: id,
        detached_lines,
    })
}

/// Distinct product categories
pub fn list_product_categories(db: &Database) -> ToolResult<Vec<String>> {
    let conn = db.get_conn()?;
    Ok(Product::categories(&conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn db() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();
        db
    }

    fn sugar() -> NewProduct {
        NewProduct {
            name: "Sugar".to_string(),
            category: "Dry goods".to_string(),
            unit: "kg".to_string(),
            quantity: 4.0,
            total_price: Some(10.0),
            price_per_unit: None,
        }
    }

    #[test]
    fn test_add_product_derives_price_from_purchase() {
        let db = db();
        let product = add_product(&db, sugar()).unwrap();
        assert_eq!(product.price_per_unit, 2.5);
        assert_eq!(product.total_price, Some(10.0));
        assert_eq!(product.unit, Unit::Kg);
    }

    #[test]
    fn test_add_product_zero_quantity_purchase() {
        let db = db();
        let product = add_product(
            &db,
            NewProduct {
                quantity: 0.0,
                ..sugar()
            },
        )
        .unwrap();
        assert_eq!(product.price_per_unit, 0.0);
    }

    #[test]
    fn test_add_product_validation() {
        let db = db();

        let err = add_product(
            &db,
            NewProduct {
                unit: "cup".to_string(),
                ..sugar()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Costing(_)));

        let err = add_product(
            &db,
            NewProduct {
                total_price: None,
                price_per_unit: None,
                ..sugar()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Invalid(_)));

        let err = add_product(
            &db,
            NewProduct {
                name: "   ".to_string(),
                ..sugar()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Invalid(_)));
    }

    #[test]
    fn test_duplicate_name_conflicts() {
        let db = db();
        add_product(&db, sugar()).unwrap();
        let err = add_product(&db, sugar()).unwrap_err();
        assert!(matches!(err, ToolError::Conflict(_)));

        let salt = add_product(
            &db,
            NewProduct {
                name: "Salt".to_string(),
                ..sugar()
            },
        )
        .unwrap();
        let err = update_product(
            &db,
            salt.id,
            ProductChanges {
                name: Some("Sugar".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Conflict(_)));
    }

    #[test]
    fn test_both_prices_rejected() {
        let db = db();
        let err = add_product(
            &db,
            NewProduct {
                price_per_unit: Some(99.0),
                ..sugar()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Invalid(_)));
        assert!(err.is_caller_error());
        assert_eq!(list_products(&db, None, None, None, None).unwrap().pagination.total, 0);

        let product = add_product(
            &db,
            NewProduct {
                total_price: None,
                price_per_unit: Some(2.0),
                ..sugar()
            },
        )
        .unwrap();
        assert_eq!(product.price_per_unit, 2.0);
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let db = db();
        add_product(&db, sugar()).unwrap();

        // a write that slips past the name check still surfaces as a conflict
        let err = db
            .with_conn(|conn| {
                Product::create(
                    conn,
                    &ProductCreate {
                        name: "Sugar".to_string(),
                        category: "Dry goods".to_string(),
                        unit: Unit::Kg,
                        quantity: 1.0,
                        total_price: None,
                        price_per_unit: 1.0,
                    },
                )
            })
            .unwrap_err();
        let e = match err {
            DbError::Sqlite(e) => e,
            other => panic!("expected a SQLite error, got {:?}", other),
        };
        assert!(is_unique_violation(&e));
        assert!(matches!(conflict_on_unique("Sugar", e), ToolError::Conflict(_)));

        let other = rusqlite::Error::QueryReturnedNoRows;
        assert!(matches!(conflict_on_unique("Sugar", other), ToolError::Database(_)));
    }

    #[test]
    fn test_failed_rename_leaves_product_unchanged() {
        let db = db();
        add_product(&db, sugar()).unwrap();
        let salt = add_product(
            &db,
            NewProduct {
                name: "Salt".to_string(),
                ..sugar()
            },
        )
        .unwrap();

        let err = update_product(
            &db,
            salt.id,
            ProductChanges {
                name: Some("Sugar".to_string()),
                quantity: Some(99.0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Conflict(_)));

        let unchanged = get_product(&db, salt.id).unwrap();
        assert_eq!(unchanged.name, "Salt");
        assert_eq!(unchanged.quantity, 4.0);
    }

    #[test]
    fn test_huge_page_is_empty() {
        let db = db();
        add_product(&db, sugar()).unwrap();
        let listed = list_products(&db, None, None, Some(i64::MAX), Some(100)).unwrap();
        assert!(listed.products.is_empty());
        assert_eq!(listed.pagination.total, 1);
        assert_eq!(listed.pagination.current, crate::tools::MAX_PAGE);
    }

    #[test]
    fn test_adjust_quantity() {
        let db = db();
        let product = add_product(
            &db,
            NewProduct {
                quantity: 10.0,
                ..sugar()
            },
        )
        .unwrap();

        let added = adjust_product_quantity(&db, product.id, 5.0, Some("add")).unwrap();
        assert_eq!(added.previous_quantity, 10.0);
        assert_eq!(added.product.quantity, 15.0);
        // price is derived once and never recomputed
        assert_eq!(added.product.price_per_unit, product.price_per_unit);

        let clamped = adjust_product_quantity(&db, product.id, 100.0, Some("subtract")).unwrap();
        assert_eq!(clamped.product.quantity, 0.0);

        let set = adjust_product_quantity(&db, product.id, 7.0, Some("bogus")).unwrap();
        assert_eq!(set.operation, "set");
        assert_eq!(set.product.quantity, 7.0);

        assert!(adjust_product_quantity(&db, product.id, -1.0, None).is_err());
        assert!(matches!(
            adjust_product_quantity(&db, 999, 1.0, None).unwrap_err(),
            ToolError::NotFound { .. }
        ));
    }

    #[test]
    fn test_list_and_categories() {
        let db = db();
        add_product(&db, sugar()).unwrap();
        add_product(
            &db,
            NewProduct {
                name: "Milk".to_string(),
                category: "Dairy".to_string(),
                unit: "l".to_string(),
                ..sugar()
            },
        )
        .unwrap();

        let listed = list_products(&db, None, None, Some(1), Some(1)).unwrap();
        assert_eq!(listed.products.len(), 1);
        assert_eq!(listed.pagination.total, 2);
        assert_eq!(listed.pagination.pages, 2);

        let dairy = list_products(&db, None, Some("Dairy"), None, None).unwrap();
        assert_eq!(dairy.products[0].name, "Milk");

        assert_eq!(list_product_categories(&db).unwrap(), vec!["Dairy", "Dry goods"]);
    }

    #[test]
    fn test_update_and_delete() {
        let db = db();
        let product = add_product(&db, sugar()).unwrap();

        let updated = update_product(
            &db,
            product.id,
            ProductChanges {
                unit: Some("g".to_string()),
                price_per_unit: Some(0.0025),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.unit, Unit::G);

        let deleted = delete_product(&db, product.id).unwrap();
        assert_eq!(deleted.detached_lines, 0);
        assert!(matches!(
            get_product(&db, product.id).unwrap_err(),
            ToolError::NotFound { .. }
        ));
    }
}
