//! Dish MCP Tools
//!
//! Tools for composing dishes from priced ingredients. Every write that
//! touches the ingredient list reprices it and stores the lines together
//! with the new cost price in one transaction.

use rusqlite::Connection;
use serde::Serialize;

use crate::costing::{
    calculate_dish_weight, compute_ingredients, estimate_cost, format_for_display, format_price,
    CostEstimate, DishCosting, IngredientLine, RawIngredient, Unit,
};
use crate::db::Database;
use crate::models::{Dish, DishCategory, DishCreate, DishFilter, DishIngredient, DishUpdate, Product};

use super::{required_name, Pagination, ToolError, ToolResult};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_PROCESS_LEN: usize = 2000;
const COPY_SUFFIX: &str = " (copy)";

/// Input for create_dish
#[derive(Debug, Clone)]
pub struct NewDish {
    pub name: String,
    pub description: Option<String>,
    pub process: Option<String>,
    pub image_url: Option<String>,
    /// Grams, as entered by the caller
    pub weight: f64,
    pub category_id: i64,
    pub ingredients: Vec<RawIngredient>,
}

/// Input for update_dish. A present ingredient list replaces the old one.
#[derive(Debug, Clone, Default)]
pub struct DishChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub process: Option<String>,
    pub image_url: Option<String>,
    pub weight: Option<f64>,
    pub category_id: Option<i64>,
    pub ingredients: Option<Vec<RawIngredient>>,
}

/// Full dish with its ingredient lines
#[derive(Debug, Serialize)]
pub struct DishDetail {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub process: Option<String>,
    pub image_url: String,
    pub category_id: i64,
    pub category_name: Option<&'static str>,
    pub weight: f64,
    pub weight_display: String,
    /// Sum of the stored line quantities
    pub computed_weight: f64,
    pub cost_price: f64,
    pub cost_price_display: String,
    pub ingredients: Vec<DishIngredient>,
    pub created_at: String,
    pub updated_at: String,
}

impl DishDetail {
    fn from_parts(dish: Dish, ingredients: Vec<DishIngredient>) -> Self {
        let lines: Vec<IngredientLine> = ingredients.iter().map(|i| i.line.clone()).collect();
        Self {
            id: dish.id,
            category_name: DishCategory::get(dish.category_id).map(|c| c.name),
            weight_display: format_for_display(dish.weight, Unit::Kg),
            computed_weight: calculate_dish_weight(&lines),
            cost_price_display: format_price(dish.cost_price),
            name: dish.name,
            description: dish.description,
            process: dish.process,
            image_url: dish.image_url,
            category_id: dish.category_id,
            weight: dish.weight,
            cost_price: dish.cost_price,
            ingredients,
            created_at: dish.created_at,
            updated_at: dish.updated_at,
        }
    }

    fn load(conn: &Connection, id: i64) -> ToolResult<Self> {
        let dish = Dish::get_by_id(conn, id)?.ok_or(ToolError::NotFound { entity: "Dish", id })?;
        let ingredients = DishIngredient::get_for_dish(conn, id)?;
        Ok(Self::from_parts(dish, ingredients))
    }
}

/// Summary of a dish for list results
#[derive(Debug, Serialize)]
pub struct DishSummary {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub category_name: Option<&'static str>,
    pub weight: f64,
    pub cost_price: f64,
    pub ingredient_count: i64,
    pub image_url: String,
    pub created_at: String,
}

/// Response for list_dishes
#[derive(Debug, Serialize)]
pub struct ListDishesResponse {
    pub dishes: Vec<DishSummary>,
    pub pagination: Pagination,
}

/// Response for estimate_dish_cost
#[derive(Debug, Serialize)]
pub struct EstimateCostResponse {
    #[serde(flatten)]
    pub estimate: CostEstimate,
    pub total_cost_display: String,
}

/// Response for delete_dish
#[derive(Debug, Serialize)]
pub struct DeleteDishResponse {
    pub success: bool,
    pub deleted_id: i64,
    pub ingredients_removed: i64,
}

fn check_length(field: &str, value: Option<&str>, max: usize) -> ToolResult<()> {
    if let Some(v) = value {
        if v.chars().count() > max {
            return Err(ToolError::Invalid(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

fn check_weight(weight: f64) -> ToolResult<()> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(ToolError::Invalid(format!(
            "weight must be a positive number of grams (got {})",
            weight
        )));
    }
    Ok(())
}

fn check_category(category_id: i64) -> ToolResult<()> {
    if DishCategory::get(category_id).is_none() {
        return Err(ToolError::Invalid(format!(
            "Unknown dish category: {} (use list_dish_categories)",
            category_id
        )));
    }
    Ok(())
}

fn ensure_name_free(conn: &Connection, name: &str, except: Option<i64>) -> ToolResult<()> {
    match Dish::get_by_name(conn, name)? {
        Some(other) if Some(other.id) != except => Err(ToolError::Conflict(format!(
            "A dish named '{}' already exists",
            name
        ))),
        _ => Ok(()),
    }
}

/// Every linked product must exist in the warehouse
fn ensure_products_exist(conn: &Connection, lines: &[IngredientLine]) -> ToolResult<()> {
    for id in lines.iter().filter_map(|l| l.product_id) {
        if Product::get_by_id(conn, id)?.is_none() {
            return Err(ToolError::NotFound { entity: "Product", id });
        }
    }
    Ok(())
}

/// Create a dish and price its ingredients
pub fn create_dish(db: &Database, data: NewDish) -> ToolResult<DishDetail> {
    let name = required_name("Dish name", &data.name)?;
    check_length("name", Some(name.as_str()), MAX_NAME_LEN)?;
    check_length("description", data.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    check_length("process", data.process.as_deref(), MAX_PROCESS_LEN)?;
    check_weight(data.weight)?;
    check_category(data.category_id)?;

    let costing = compute_ingredients(&data.ingredients)?;

    let detail = db.with_transaction(|tx| -> ToolResult<DishDetail> {
        ensure_name_free(tx, &name, None)?;
        ensure_products_exist(tx, &costing.lines)?;

        let dish = Dish::create(
            tx,
            &DishCreate {
                name: name.clone(),
                description: data.description.clone(),
                process: data.process.clone(),
                image_url: data.image_url.clone().filter(|u| !u.trim().is_empty()),
                weight: data.weight,
                cost_price: costing.total_cost,
                category_id: data.category_id,
            },
        )?;
        let ingredients = DishIngredient::replace_for_dish(tx, dish.id, &costing.lines)?;
        Ok(DishDetail::from_parts(dish, ingredients))
    })?;

    tracing::info!(
        id = detail.id,
        name = %detail.name,
        lines = detail.ingredients.len(),
        cost_price = detail.cost_price,
        "Dish created"
    );
    Ok(detail)
}

/// Get a dish with its ingredient lines
pub fn get_dish(db: &Database, id: i64) -> ToolResult<DishDetail> {
    let conn = db.get_conn()?;
    DishDetail::load(&conn, id)
}

/// List dishes, newest first
pub fn list_dishes(
    db: &Database,
    search: Option<&str>,
    category_id: Option<i64>,
    page: Option<i64>,
    limit: Option<i64>,
) -> ToolResult<ListDishesResponse> {
    let (page, limit) = Pagination::clamp(page, limit);
    let filter = DishFilter {
        search: search.map(str::trim).filter(|s| !s.is_empty()),
        category_id,
    };

    let conn = db.get_conn()?;
    let total = Dish::count(&conn, &filter)?;
    let pagination = Pagination::new(page, limit, total);

    let dishes = Dish::list(&conn, &filter, limit, pagination.offset())?
        .into_iter()
        .map(|dish| -> ToolResult<DishSummary> {
            let ingredient_count = DishIngredient::count_for_dish(&conn, dish.id)?;
            Ok(DishSummary {
                id: dish.id,
                category_name: DishCategory::get(dish.category_id).map(|c| c.name),
                name: dish.name,
                category_id: dish.category_id,
                weight: dish.weight,
                cost_price: dish.cost_price,
                ingredient_count,
                image_url: dish.image_url,
                created_at: dish.created_at,
            })
        })
        .collect::<ToolResult<Vec<_>>>()?;

    Ok(ListDishesResponse { dishes, pagination })
}

/// Update dish fields, replacing and repricing the ingredient list if one is given
pub fn update_dish(db: &Database, id: i64, changes: DishChanges) -> ToolResult<DishDetail> {
    let name = changes
        .name
        .as_deref()
        .map(|n| required_name("Dish name", n))
        .transpose()?;
    check_length("name", name.as_deref(), MAX_NAME_LEN)?;
    check_length("description", changes.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    check_length("process", changes.process.as_deref(), MAX_PROCESS_LEN)?;
    if let Some(weight) = changes.weight {
        check_weight(weight)?;
    }
    if let Some(category_id) = changes.category_id {
        check_category(category_id)?;
    }

    let costing: Option<DishCosting> = changes
        .ingredients
        .as_deref()
        .map(compute_ingredients)
        .transpose()?;

    let detail = db.with_transaction(|tx| -> ToolResult<DishDetail> {
        let existing = Dish::get_by_id(tx, id)?.ok_or(ToolError::NotFound { entity: "Dish", id })?;
        if let Some(ref n) = name {
            if *n != existing.name {
                ensure_name_free(tx, n, Some(id))?;
            }
        }

        Dish::update(
            tx,
            id,
            &DishUpdate {
                name: name.clone(),
                description: changes.description.clone(),
                process: changes.process.clone(),
                image_url: changes.image_url.clone(),
                weight: changes.weight,
                category_id: changes.category_id,
            },
        )?;

        if let Some(ref costing) = costing {
            ensure_products_exist(tx, &costing.lines)?;
            DishIngredient::replace_for_dish(tx, id, &costing.lines)?;
            Dish::update_costing(tx, id, costing.total_cost)?;
        }

        DishDetail::load(tx, id)
    })?;

    tracing::info!(
        id,
        repriced = costing.is_some(),
        cost_price = detail.cost_price,
        "Dish updated"
    );
    Ok(detail)
}

/// Delete a dish and its ingredient lines
pub fn delete_dish(db: &Database, id: i64) -> ToolResult<DeleteDishResponse> {
    let conn = db.get_conn()?;

    if Dish::get_by_id(&conn, id)?.is_none() {
        return Err(ToolError::NotFound { entity: "Dish", id });
    }

    let ingredients_removed = DishIngredient::count_for_dish(&conn, id)?;
    Dish::delete(&conn, id)?;

    tracing::info!(id, ingredients_removed, "Dish deleted");

    Ok(DeleteDishResponse {
        success: true,
        deleted_id: id,
        ingredients_removed,
    })
}

/// Duplicate a dish under "<name> (copy)", keeping its line snapshots
pub fn copy_dish(db: &Database, id: i64) -> ToolResult<DishDetail> {
    let detail = db.with_transaction(|tx| -> ToolResult<DishDetail> {
        let original = Dish::get_by_id(tx, id)?.ok_or(ToolError::NotFound { entity: "Dish", id })?;
        let lines: Vec<IngredientLine> = DishIngredient::get_for_dish(tx, id)?
            .into_iter()
            .map(|i| i.line)
            .collect();

        let name = format!("{}{}", original.name, COPY_SUFFIX);
        ensure_name_free(tx, &name, None)?;

        let copy = Dish::create(
            tx,
            &DishCreate {
                name,
                description: original.description,
                process: original.process,
                image_url: Some(original.image_url),
                weight: original.weight,
                cost_price: original.cost_price,
                category_id: original.category_id,
            },
        )?;
        let ingredients = DishIngredient::replace_for_dish(tx, copy.id, &lines)?;
        Ok(DishDetail::from_parts(copy, ingredients))
    })?;

    tracing::info!(from = id, id = detail.id, "Dish copied");
    Ok(detail)
}

/// Price an ingredient list without saving anything
pub fn estimate_dish_cost(ingredients: &[RawIngredient]) -> ToolResult<EstimateCostResponse> {
    let estimate = estimate_cost(ingredients)?;
    Ok(EstimateCostResponse {
        total_cost_display: format_price(estimate.total_cost),
        estimate,
    })
}

/// The fixed dish categories
pub fn list_dish_categories() -> &'static [DishCategory] {
    DishCategory::all()
}
