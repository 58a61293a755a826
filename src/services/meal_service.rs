use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::meals::{CategoryList, CreateMealRequest, MealList, UpdateMealRequest},
    entity::meals::{ActiveModel, Column, Entity as Meals, Model as MealModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Meal,
    response::{ApiResponse, Meta},
    routes::params::{MealQuery, MealSortBy, SortOrder},
    state::AppState,
};

const DEFAULT_IMAGE: &str = "/images/meals/default.jpg";
const DEFAULT_CATEGORY: &str = "main";

/// Checks name and price together and reports every violation at once.
/// Returns the validated price.
pub fn validate_meal(payload: &CreateMealRequest) -> Result<i64, Vec<String>> {
    let mut errors = Vec::new();

    if payload.name.trim().is_empty() {
        errors.push("Meal name is required".to_string());
    }
    match payload.price {
        None => errors.push("Price is required".to_string()),
        Some(price) if price < 0 => errors.push("Price must be a positive number".to_string()),
        _ => {}
    }

    match payload.price {
        Some(price) if errors.is_empty() => Ok(price),
        _ => Err(errors),
    }
}

pub async fn list_meals(state: &AppState, query: MealQuery) -> AppResult<ApiResponse<MealList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        // ILIKE without wildcards: case-insensitive category match.
        condition = condition.add(Expr::col(Column::Category).ilike(category.clone()));
    }

    let sort_by = query.sort_by.unwrap_or(MealSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        MealSortBy::CreatedAt => Column::CreatedAt,
        MealSortBy::Price => Column::Price,
        MealSortBy::Name => Column::Name,
    };

    let mut finder = Meals::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(meal_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Meals", MealList { items }, Some(meta)))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<String> = Meals::find()
        .select_only()
        .column(Column::Category)
        .distinct()
        .order_by_asc(Column::Category)
        .into_tuple()
        .all(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

/// Oldest meals first, as the storefront's placeholder popularity rule.
pub async fn popular_meals(state: &AppState, limit: u64) -> AppResult<ApiResponse<MealList>> {
    let items = Meals::find()
        .order_by_asc(Column::CreatedAt)
        .limit(limit)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(meal_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Popular meals",
        MealList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_meal(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Meal>> {
    let result = Meals::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(meal_from_entity);
    let result = match result {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Meal", result, None))
}

pub async fn create_meal(
    state: &AppState,
    user: &AuthUser,
    payload: CreateMealRequest,
) -> AppResult<ApiResponse<Meal>> {
    let price = validate_meal(&payload).map_err(AppError::Validation)?;

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description.unwrap_or_default()),
        price: Set(price),
        image: Set(payload.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string())),
        category: Set(payload
            .category
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())),
        user_id: Set(user.user_id),
        created_at: NotSet,
    };
    let meal = active.insert(&state.orm).await?;

    log_audit(
        state,
        Some(user.user_id),
        "meal_create",
        Some("meals"),
        Some(serde_json::json!({ "meal_id": meal.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Meal created",
        meal_from_entity(meal),
        Some(Meta::empty()),
    ))
}

pub async fn update_meal(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMealRequest,
) -> AppResult<ApiResponse<Meal>> {
    let existing = Meals::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };
    ensure_owner(&existing, user)?;

    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::Validation(vec![
                "Price must be a positive number".to_string(),
            ]));
        }
    }
    if let Some(name) = payload.name.as_ref() {
        if name.trim().is_empty() {
            return Err(AppError::Validation(vec![
                "Meal name is required".to_string(),
            ]));
        }
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(image) = payload.image {
        active.image = Set(image);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }

    let meal = active.update(&state.orm).await?;

    log_audit(
        state,
        Some(user.user_id),
        "meal_update",
        Some("meals"),
        Some(serde_json::json!({ "meal_id": meal.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        meal_from_entity(meal),
        Some(Meta::empty()),
    ))
}

pub async fn delete_meal(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Meals::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };
    ensure_owner(&existing, user)?;

    Meals::delete_by_id(id).exec(&state.orm).await?;

    log_audit(
        state,
        Some(user.user_id),
        "meal_delete",
        Some("meals"),
        Some(serde_json::json!({ "meal_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Only the seller who created a meal may mutate it.
fn ensure_owner(meal: &MealModel, user: &AuthUser) -> Result<(), AppError> {
    if meal.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn meal_from_entity(model: MealModel) -> Meal {
    Meal {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        image: model.image,
        category: model.category,
        user_id: model.user_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
