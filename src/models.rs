use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub address: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub image: String,
    pub category: String,
    /// Owning seller.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One line of a user's cart. Name, price, image and seller are frozen at
/// add time so later catalog edits do not change what the user put in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub quantity: i32,
    pub seller_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer: Customer,
    pub total: i64,
    pub payment_method: String,
    pub status: OrderStatus,
    pub estimated_delivery: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Frozen copy of a cart line at order-creation time. Never updated.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub meal_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub seller_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Delivery lifecycle: `processing → preparing → enroute → delivered`.
/// `cancelled` is only reachable through an explicit status update and,
/// like `delivered`, is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Preparing,
    Enroute,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Enroute => "enroute",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// The next forward step, or `None` for the terminal states.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Processing => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Enroute),
            OrderStatus::Enroute => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(OrderStatus::Processing),
            "preparing" => Ok(OrderStatus::Preparing),
            "enroute" => Ok(OrderStatus::Enroute),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
