use std::collections::HashMap;

use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        CreateOrderRequest, OrderList, OrderWithItems, SellerOrderList, SellerOrderView,
        UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Customer, Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Orders are promised within a fixed lead time of checkout.
const DELIVERY_LEAD_MINUTES: i64 = 40;

/// Checks the whole payload and reports every violation at once.
pub fn validate_order(payload: &CreateOrderRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if payload.customer.name.trim().is_empty() {
        errors.push("Customer name is required".to_string());
    }
    if payload.customer.phone.trim().is_empty() {
        errors.push("Customer phone is required".to_string());
    }
    if payload.customer.address.trim().is_empty() {
        errors.push("Delivery address is required".to_string());
    }
    if payload.items.is_empty() {
        errors.push("Order must contain at least one item".to_string());
    }
    if payload.items.iter().any(|item| item.quantity < 1) {
        errors.push("Item quantity must be at least 1".to_string());
    }
    if payload.items.iter().any(|item| item.price < 0) {
        errors.push("Item price must not be negative".to_string());
    }
    if payload.payment_method.trim().is_empty() {
        errors.push("Payment method is required".to_string());
    }

    errors
}

/// Creates an order from a cart snapshot. The total is computed from the
/// submitted lines, never re-read from the catalog, and the order row plus
/// all of its lines are written in one transaction.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let errors = validate_order(&payload);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let total: i64 = payload
        .items
        .iter()
        .map(|item| item.price * item.quantity as i64)
        .sum();

    let txn = state.orm.begin().await?;

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        customer_name: Set(payload.customer.name.trim().to_string()),
        customer_phone: Set(payload.customer.phone.trim().to_string()),
        customer_address: Set(payload.customer.address.trim().to_string()),
        customer_notes: Set(payload
            .customer
            .notes
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string()),
        total: Set(total),
        payment_method: Set(payload.payment_method.clone()),
        status: Set(OrderStatus::Processing.as_str().to_string()),
        estimated_delivery: Set((now + Duration::minutes(DELIVERY_LEAD_MINUTES)).into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let row = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            meal_id: Set(item.meal_id),
            name: Set(item.name.clone()),
            price: Set(item.price),
            quantity: Set(item.quantity),
            seller_id: Set(item.seller_id),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        items.push(order_item_from_entity(row));
    }

    txn.commit().await?;

    log_audit(
        state,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Unscoped listing across all buyers; admin only.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<Order>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Orders the user placed, newest first.
pub async fn list_orders_for_buyer(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<Order>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Orders containing at least one of the seller's lines, each projected
/// down to only that seller's lines with a total over exactly those lines.
/// A pure read; the stored orders are never modified.
pub async fn list_orders_for_seller(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SellerOrderList>> {
    let lines = OrderItems::find()
        .filter(OrderItemCol::SellerId.eq(user.user_id))
        .all(&state.orm)
        .await?;

    let mut lines_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for line in lines {
        lines_by_order
            .entry(line.order_id)
            .or_default()
            .push(order_item_from_entity(line));
    }

    if lines_by_order.is_empty() {
        return Ok(ApiResponse::success(
            "Orders",
            SellerOrderList { items: Vec::new() },
            Some(Meta::empty()),
        ));
    }

    let order_ids: Vec<Uuid> = lines_by_order.keys().copied().collect();
    let orders = Orders::find()
        .filter(OrderCol::Id.is_in(order_ids))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut views = Vec::with_capacity(orders.len());
    for model in orders {
        let order = order_from_entity(model)?;
        let items = lines_by_order.remove(&order.id).unwrap_or_default();
        let seller_total = items
            .iter()
            .map(|item| item.price * item.quantity as i64)
            .sum();
        views.push(SellerOrderView {
            order,
            items,
            seller_total,
        });
    }

    Ok(ApiResponse::success(
        "Orders",
        SellerOrderList { items: views },
        Some(Meta::empty()),
    ))
}

/// Manual status update. Any valid status may be set at any time; only the
/// automatic sweep is constrained to the forward flow.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let status = payload
        .status
        .parse::<OrderStatus>()
        .map_err(|_| AppError::Validation(vec![format!("Invalid status: {}", payload.status)]))?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    log_audit(
        state,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let status = model.status.parse::<OrderStatus>().map_err(|_| {
        AppError::Internal(anyhow::anyhow!(
            "unknown order status in store: {}",
            model.status
        ))
    })?;

    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        customer: Customer {
            name: model.customer_name,
            phone: model.customer_phone,
            address: model.customer_address,
            notes: model.customer_notes,
        },
        total: model.total,
        payment_method: model.payment_method,
        status,
        estimated_delivery: model.estimated_delivery.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        meal_id: model.meal_id,
        name: model.name,
        price: model.price,
        quantity: model.quantity,
        seller_id: model.seller_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
