//! CostChef MCP Server Implementation
//!
//! Implements the MCP server with all CostChef tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::costing::RawIngredient;
use crate::db::{migrations, Database};
use crate::tools::dishes::{self, DishChanges, NewDish};
use crate::tools::products::{self, NewProduct, ProductChanges};
use crate::tools::status::{StatusTracker, COSTING_INSTRUCTIONS};
use crate::tools::ToolError;

/// CostChef MCP Service
#[derive(Clone)]
pub struct CostChefService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<CostChefService>,
}

impl CostChefService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

/// Input mistakes become invalid_params; storage failures become internal_error.
fn tool_error(e: ToolError) -> McpError {
    if e.is_caller_error() {
        tracing::debug!(error = %e, "Tool call rejected");
        McpError::invalid_params(e.to_string(), None)
    } else {
        tracing::error!(error = %e, "Tool call failed");
        McpError::internal_error(e.to_string(), None)
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Product Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddProductParams {
    pub name: String,
    pub category: String,
    /// One of kg, g, l, ml, pcs, tbsp, tsp
    pub unit: String,
    /// Stock on hand, in `unit`
    #[serde(default)]
    pub quantity: f64,
    /// Price paid for the whole quantity; price_per_unit is derived from it
    pub total_price: Option<f64>,
    /// Give this or total_price, not both
    pub price_per_unit: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListProductsParams {
    /// Substring of the name or category
    pub search: Option<String>,
    pub category: Option<String>,
    /// Starts at 1
    pub page: Option<i64>,
    /// Defaults to 10
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateProductParams {
    pub id: i64,
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AdjustProductQuantityParams {
    pub id: i64,
    pub quantity: f64,
    /// set (default), add or subtract
    pub operation: Option<String>,
}

// ============================================================================
// Dish Parameter Structs
// ============================================================================

/// One ingredient line. Numbers may be JSON numbers or numeric strings.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientParams {
    /// Warehouse product this line was taken from
    pub product_id: Option<i64>,
    pub name: Option<String>,
    /// Quantity in the basis price_per_unit is quoted in
    pub quantity: Option<Value>,
    pub display_quantity: Option<Value>,
    /// One of kg, g, l, ml, pcs, tbsp, tsp
    pub display_unit: Option<String>,
    pub price_per_unit: Option<Value>,
}

impl From<IngredientParams> for RawIngredient {
    fn from(p: IngredientParams) -> Self {
        Self {
            product_id: p.product_id,
            name: p.name,
            quantity: p.quantity,
            display_quantity: p.display_quantity,
            display_unit: p.display_unit,
            price_per_unit: p.price_per_unit,
        }
    }
}

fn raw_ingredients(params: Vec<IngredientParams>) -> Vec<RawIngredient> {
    params.into_iter().map(RawIngredient::from).collect()
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateDishParams {
    pub name: String,
    pub description: Option<String>,
    pub process: Option<String>,
    pub image_url: Option<String>,
    /// Dish weight in grams
    pub weight: f64,
    /// 1-7, see list_dish_categories
    pub category_id: i64,
    pub ingredients: Vec<IngredientParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDishesParams {
    /// Substring of the dish name
    pub search: Option<String>,
    pub category_id: Option<i64>,
    /// Starts at 1
    pub page: Option<i64>,
    /// Defaults to 10
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateDishParams {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub process: Option<String>,
    pub image_url: Option<String>,
    pub weight: Option<f64>,
    pub category_id: Option<i64>,
    /// Replaces every existing line and recomputes cost_price
    pub ingredients: Option<Vec<IngredientParams>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EstimateDishCostParams {
    /// Only name, quantity and price_per_unit are needed
    pub ingredients: Vec<IngredientParams>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl CostChefService {
    // --- Status ---

    #[tool(description = "Get the current status of the CostChef service including build info, database status, and process information")]
    async fn costchef_status(&self) -> Result<CallToolResult, McpError> {
        let schema_version = self
            .database
            .with_conn(|conn| migrations::get_schema_version(conn))
            .ok();
        let tracker = self.status_tracker.lock().await;
        json_result(&tracker.get_status(schema_version))
    }

    #[tool(description = "Get instructions for pricing products and costing dishes. Call this before creating dishes or when unsure how quantities and prices relate.")]
    fn costing_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(COSTING_INSTRUCTIONS)]))
    }

    // --- Products ---

    #[tool(description = "Add a warehouse product. Give total_price for a purchase to derive price_per_unit, or give price_per_unit directly. Giving both is an error.")]
    fn add_product(&self, Parameters(p): Parameters<AddProductParams>) -> Result<CallToolResult, McpError> {
        let data = NewProduct {
            name: p.name,
            category: p.category,
            unit: p.unit,
            quantity: p.quantity,
            total_price: p.total_price,
            price_per_unit: p.price_per_unit,
        };
        let result = products::add_product(&self.database, data).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Get a warehouse product by ID")]
    fn get_product(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = products::get_product(&self.database, p.id).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "List warehouse products, newest first, with optional search, category filter and pagination")]
    fn list_products(&self, Parameters(p): Parameters<ListProductsParams>) -> Result<CallToolResult, McpError> {
        let result = products::list_products(
            &self.database,
            p.search.as_deref(),
            p.category.as_deref(),
            p.page,
            p.limit,
        )
        .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Update a warehouse product. Existing dishes keep the price they were costed with.")]
    fn update_product(&self, Parameters(p): Parameters<UpdateProductParams>) -> Result<CallToolResult, McpError> {
        let changes = ProductChanges {
            name: p.name,
            category: p.category,
            unit: p.unit,
            price_per_unit: p.price_per_unit,
            quantity: p.quantity,
        };
        let result = products::update_product(&self.database, p.id, changes).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Change a product's stock quantity. operation is set (default), add or subtract; subtract never goes below 0.")]
    fn adjust_product_quantity(&self, Parameters(p): Parameters<AdjustProductQuantityParams>) -> Result<CallToolResult, McpError> {
        let result = products::adjust_product_quantity(&self.database, p.id, p.quantity, p.operation.as_deref())
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Delete a warehouse product. Dish ingredient lines that used it keep their snapshot.")]
    fn delete_product(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = products::delete_product(&self.database, p.id).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "List the distinct product categories in the warehouse")]
    fn list_product_categories(&self) -> Result<CallToolResult, McpError> {
        let result = products::list_product_categories(&self.database).map_err(tool_error)?;
        json_result(&result)
    }

    // --- Dishes ---

    #[tool(description = "Create a dish from priced ingredient lines. cost_price is the sum of quantity x price_per_unit over all lines.")]
    fn create_dish(&self, Parameters(p): Parameters<CreateDishParams>) -> Result<CallToolResult, McpError> {
        let data = NewDish {
            name: p.name,
            description: p.description,
            process: p.process,
            image_url: p.image_url,
            weight: p.weight,
            category_id: p.category_id,
            ingredients: raw_ingredients(p.ingredients),
        };
        let result = dishes::create_dish(&self.database, data).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Get a dish with its ingredient lines, cost price and computed weight")]
    fn get_dish(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = dishes::get_dish(&self.database, p.id).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "List dishes, newest first, with optional name search, category filter and pagination")]
    fn list_dishes(&self, Parameters(p): Parameters<ListDishesParams>) -> Result<CallToolResult, McpError> {
        let result = dishes::list_dishes(&self.database, p.search.as_deref(), p.category_id, p.page, p.limit)
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Update a dish. Sending ingredients replaces all lines and recomputes cost_price.")]
    fn update_dish(&self, Parameters(p): Parameters<UpdateDishParams>) -> Result<CallToolResult, McpError> {
        let changes = DishChanges {
            name: p.name,
            description: p.description,
            process: p.process,
            image_url: p.image_url,
            weight: p.weight,
            category_id: p.category_id,
            ingredients: p.ingredients.map(raw_ingredients),
        };
        let result = dishes::update_dish(&self.database, p.id, changes).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Delete a dish and its ingredient lines")]
    fn delete_dish(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = dishes::delete_dish(&self.database, p.id).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Copy a dish as '<name> (copy)' with the same ingredient lines and cost price")]
    fn copy_dish(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = dishes::copy_dish(&self.database, p.id).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Preview the cost of an ingredient list without saving anything")]
    fn estimate_dish_cost(&self, Parameters(p): Parameters<EstimateDishCostParams>) -> Result<CallToolResult, McpError> {
        let result = dishes::estimate_dish_cost(&raw_ingredients(p.ingredients)).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "List the fixed dish categories")]
    fn list_dish_categories(&self) -> Result<CallToolResult, McpError> {
        json_result(&dishes::list_dish_categories())
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for CostChefService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "costchef".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("CostChef".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "CostChef - Warehouse pricing and dish cost calculation. \
                 IMPORTANT: Call costing_instructions before creating dishes. \
                 Products: add/get/list/update/delete_product, adjust_product_quantity, list_product_categories. \
                 Dishes: create/get/list/update/delete_dish, copy_dish, list_dish_categories. \
                 Previews: estimate_dish_cost. \
                 Status: costchef_status."
                    .into(),
            ),
        }
    }
}
