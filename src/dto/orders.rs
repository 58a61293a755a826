use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub notes: Option<String>,
}

/// One line of the checkout payload, expected to be a cart snapshot.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub meal_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub seller_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer: CustomerInfo,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub payment_method: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// An order as one seller sees it: only that seller's lines, with a total
/// over exactly those lines. The stored order is untouched.
#[derive(Debug, Serialize, ToSchema)]
pub struct SellerOrderView {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub seller_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerOrderList {
    pub items: Vec<SellerOrderView>,
}
