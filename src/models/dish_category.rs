//! Dish categories
//!
//! A fixed list; dishes store only the numeric id.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DishCategory {
    pub id: i64,
    pub name: &'static str,
}

pub const DISH_CATEGORIES: [DishCategory; 7] = [
    DishCategory { id: 1, name: "Appetizers" },
    DishCategory { id: 2, name: "Salads" },
    DishCategory { id: 3, name: "Soups" },
    DishCategory { id: 4, name: "Main courses" },
    DishCategory { id: 5, name: "Desserts" },
    DishCategory { id: 6, name: "Drinks" },
    DishCategory { id: 7, name: "Other" },
];

impl DishCategory {
    pub fn all() -> &'static [DishCategory] {
        &DISH_CATEGORIES
    }

    pub fn get(id: i64) -> Option<DishCategory> {
        DISH_CATEGORIES.iter().copied().find(|c| c.id == id)
    }
}
