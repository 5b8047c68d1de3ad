//! Utility to fill a database with demo products and one demo dish
//!
//! Existing names are skipped, so it is safe to run more than once.

use serde_json::json;
use tracing_subscriber::EnvFilter;

use costchef::config::Config;
use costchef::costing::RawIngredient;
use costchef::db::{migrations, Database};
use costchef::models::{Dish, Product};
use costchef::tools::dishes::{self, NewDish};
use costchef::tools::products::{self, NewProduct};

/// name, category, unit, quantity, total price
const DEMO_PRODUCTS: &[(&str, &str, &str, f64, f64)] = &[
    ("Wheat flour", "Dry goods", "g", 5000.0, 9.5),
    ("Sugar", "Dry goods", "g", 2000.0, 3.2),
    ("Butter", "Dairy", "g", 1000.0, 11.0),
    ("Milk", "Dairy", "ml", 3000.0, 3.9),
    ("Eggs", "Dairy", "pcs", 30.0, 7.5),
    ("Salt", "Spices", "g", 1000.0, 0.8),
];

/// product name, quantity, display quantity, display unit
const DEMO_DISH_LINES: &[(&str, f64, f64, &str)] = &[
    ("Wheat flour", 250.0, 250.0, "g"),
    ("Milk", 500.0, 0.5, "l"),
    ("Eggs", 3.0, 3.0, "pcs"),
    ("Sugar", 30.0, 30.0, "g"),
    ("Butter", 20.0, 20.0, "g"),
    ("Salt", 2.0, 2.0, "g"),
];

const DEMO_DISH: &str = "Pancakes";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .with_writer(std::io::stderr)
        .init();

    println!("Database path: {}", config.database_path.display());
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&config.database_path)?;
    database.with_conn(|conn| migrations::run_migrations(conn))?;

    let mut created = 0;
    for &(name, category, unit, quantity, total_price) in DEMO_PRODUCTS {
        if database.with_conn(|conn| Product::get_by_name(conn, name))?.is_some() {
            println!("  skip product: {}", name);
            continue;
        }
        let product = products::add_product(
            &database,
            NewProduct {
                name: name.to_string(),
                category: category.to_string(),
                unit: unit.to_string(),
                quantity,
                total_price: Some(total_price),
                price_per_unit: None,
            },
        )?;
        println!(
            "  product: {} ({} per {})",
            product.name, product.price_per_unit, product.unit
        );
        created += 1;
    }
    println!("Products created: {}", created);

    if database.with_conn(|conn| Dish::get_by_name(conn, DEMO_DISH))?.is_some() {
        println!("  skip dish: {}", DEMO_DISH);
        return Ok(());
    }

    let mut ingredients = Vec::with_capacity(DEMO_DISH_LINES.len());
    for &(name, quantity, display_quantity, display_unit) in DEMO_DISH_LINES {
        let product = database
            .with_conn(|conn| Product::get_by_name(conn, name))?
            .ok_or_else(|| format!("demo product missing: {}", name))?;
        ingredients.push(RawIngredient {
            product_id: Some(product.id),
            name: Some(product.name),
            quantity: Some(json!(quantity)),
            display_quantity: Some(json!(display_quantity)),
            display_unit: Some(display_unit.to_string()),
            price_per_unit: Some(json!(product.price_per_unit)),
        });
    }

    let dish = dishes::create_dish(
        &database,
        NewDish {
            name: DEMO_DISH.to_string(),
            description: Some("Thin milk pancakes".to_string()),
            process: Some("Whisk eggs with sugar and salt, add milk and flour, rest 20 minutes, fry in butter.".to_string()),
            image_url: None,
            weight: 800.0,
            category_id: 4,
            ingredients,
        },
    )?;
    println!(
        "Dish created: {} (cost {}, {})",
        dish.name, dish.cost_price_display, dish.weight_display
    );

    Ok(())
}
