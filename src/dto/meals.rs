use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Meal;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMealRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub image: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMealRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub image: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MealList {
    pub items: Vec<Meal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<String>,
}
