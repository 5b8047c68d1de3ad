//! Data models
//!
//! Rust structs representing database entities.

mod dish;
mod dish_category;
mod dish_ingredient;
mod product;

pub use dish::{Dish, DishCreate, DishFilter, DishUpdate, DEFAULT_IMAGE_URL};
pub use dish_category::{DishCategory, DISH_CATEGORIES};
pub use dish_ingredient::DishIngredient;
pub use product::{Product, ProductCreate, ProductFilter, ProductUpdate};
