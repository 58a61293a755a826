use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartItem;

/// The client sends the meal fields as shown at add time; the cart stores
/// them as a snapshot instead of re-reading the catalog.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub meal_id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    pub price: Option<i64>,
    #[serde(default)]
    pub image: String,
    pub quantity: Option<i32>,
    pub seller_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartItem>,
}
