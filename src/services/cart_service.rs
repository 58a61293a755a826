use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartList, UpdateCartItemRequest},
    entity::cart_items::{
        ActiveModel as CartItemActive, Column as CartCol, Entity as CartItems,
        Model as CartItemModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// An add-to-cart payload that passed validation.
#[derive(Debug)]
pub struct NewCartItem {
    pub meal_id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub quantity: i32,
    pub seller_id: Option<Uuid>,
}

/// Checks every field and reports all violations at once, so the caller
/// can render the full list instead of fixing one error per round trip.
pub fn validate_add_item(payload: &AddToCartRequest) -> Result<NewCartItem, Vec<String>> {
    let mut errors = Vec::new();

    if payload.meal_id.is_none() {
        errors.push("Meal ID is required".to_string());
    }
    if payload.name.trim().is_empty() {
        errors.push("Meal name is required".to_string());
    }
    match payload.price {
        None => errors.push("Price is required".to_string()),
        Some(price) if price < 0 => errors.push("Price must be a positive number".to_string()),
        _ => {}
    }
    if payload.image.trim().is_empty() {
        errors.push("Image is required".to_string());
    }
    if payload.quantity.is_none_or(|q| q < 1) {
        errors.push("Quantity must be at least 1".to_string());
    }

    match (payload.meal_id, payload.price, payload.quantity) {
        (Some(meal_id), Some(price), Some(quantity)) if errors.is_empty() => Ok(NewCartItem {
            meal_id,
            name: payload.name.trim().to_string(),
            price,
            image: payload.image.clone(),
            quantity,
            seller_id: payload.seller_id,
        }),
        _ => Err(errors),
    }
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let items = user_cart(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", CartList { items }, None))
}

/// Adds a meal to the user's cart, merging into an existing line for the
/// same meal. Two concurrent adds for the same (user, meal) may both see
/// no line and race to insert; the unique index rejects the loser, which
/// then falls back to incrementing the winner's line.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartList>> {
    let line = validate_add_item(&payload).map_err(AppError::Validation)?;

    let mut attempts = 0;
    loop {
        let existing = CartItems::find()
            .filter(
                Condition::all()
                    .add(CartCol::UserId.eq(user.user_id))
                    .add(CartCol::MealId.eq(line.meal_id)),
            )
            .one(&state.orm)
            .await?;

        if existing.is_some() {
            let result = CartItems::update_many()
                .col_expr(
                    CartCol::Quantity,
                    Expr::col(CartCol::Quantity).add(line.quantity),
                )
                .filter(
                    Condition::all()
                        .add(CartCol::UserId.eq(user.user_id))
                        .add(CartCol::MealId.eq(line.meal_id)),
                )
                .exec(&state.orm)
                .await?;
            if result.rows_affected > 0 {
                break;
            }
            // The line was removed between the read and the update; insert instead.
        } else {
            let insert = CartItemActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                meal_id: Set(line.meal_id),
                name: Set(line.name.clone()),
                price: Set(line.price),
                image: Set(line.image.clone()),
                quantity: Set(line.quantity),
                seller_id: Set(line.seller_id),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await;

            match insert {
                Ok(_) => break,
                Err(err) => match AppError::from(err) {
                    // Lost the duplicate-insert race; add to the winner's line.
                    AppError::Conflict(_) => {}
                    other => return Err(other),
                },
            }
        }

        attempts += 1;
        if attempts >= 3 {
            return Err(AppError::Internal(anyhow::anyhow!(
                "cart line for meal {} kept changing during add",
                line.meal_id
            )));
        }
    }

    log_audit(
        state,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "meal_id": line.meal_id, "quantity": line.quantity })),
    )
    .await;

    let items = user_cart(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "Item added to cart",
        CartList { items },
        None,
    ))
}

/// Sets a line's quantity exactly (not additive).
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartList>> {
    if payload.quantity < 1 {
        return Err(AppError::Validation(vec![
            "Quantity must be at least 1".to_string(),
        ]));
    }

    let result = CartItems::update_many()
        .col_expr(CartCol::Quantity, Expr::value(payload.quantity))
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(item_id))
                .add(CartCol::UserId.eq(user.user_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    log_audit(
        state,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id, "quantity": payload.quantity })),
    )
    .await;

    let items = user_cart(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "Cart item updated",
        CartList { items },
        None,
    ))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartList>> {
    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(item_id))
                .add(CartCol::UserId.eq(user.user_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    log_audit(
        state,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await;

    let items = user_cart(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "Item removed from cart",
        CartList { items },
        None,
    ))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    clear_user_cart(state, user.user_id).await?;

    log_audit(
        state,
        Some(user.user_id),
        "cart_clear",
        Some("cart_items"),
        None,
    )
    .await;

    Ok(ApiResponse::success(
        "Cart cleared",
        CartList { items: Vec::new() },
        Some(Meta::empty()),
    ))
}

/// Deletes every line of the user's cart. Idempotent.
pub async fn clear_user_cart(state: &AppState, user_id: Uuid) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user_id))
        .exec(&state.orm)
        .await?;
    Ok(result.rows_affected)
}

async fn user_cart(state: &AppState, user_id: Uuid) -> AppResult<Vec<CartItem>> {
    let items = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_desc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(cart_item_from_entity)
        .collect();
    Ok(items)
}

fn cart_item_from_entity(model: CartItemModel) -> CartItem {
    CartItem {
        id: model.id,
        user_id: model.user_id,
        meal_id: model.meal_id,
        name: model.name,
        price: model.price,
        image: model.image,
        quantity: model.quantity,
        seller_id: model.seller_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
