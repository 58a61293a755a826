use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::meals::{CategoryList, CreateMealRequest, MealList, UpdateMealRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Meal,
    response::ApiResponse,
    routes::params::{MealQuery, PopularQuery},
    services::meal_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meals).post(create_meal))
        .route("/categories", get(list_categories))
        .route("/popular", get(popular_meals))
        .route(
            "/{id}",
            get(get_meal).put(update_meal).delete(delete_meal),
        )
}

#[utoipa::path(
    get,
    path = "/api/meals",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in name and description"),
        ("category" = Option<String>, Query, description = "Filter by category")
    ),
    responses(
        (status = 200, description = "List meals", body = ApiResponse<MealList>)
    ),
    tag = "Meals"
)]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(query): Query<MealQuery>,
) -> AppResult<Json<ApiResponse<MealList>>> {
    let response = meal_service::list_meals(&state, query).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/meals/categories",
    responses(
        (status = 200, description = "Distinct category tags", body = ApiResponse<CategoryList>)
    ),
    tag = "Meals"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let response = meal_service::list_categories(&state).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/meals/popular",
    params(
        ("limit" = Option<u64>, Query, description = "How many meals, default 8")
    ),
    responses(
        (status = 200, description = "Popular meals for the home page", body = ApiResponse<MealList>)
    ),
    tag = "Meals"
)]
pub async fn popular_meals(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> AppResult<Json<ApiResponse<MealList>>> {
    let response = meal_service::popular_meals(&state, query.limit.unwrap_or(8)).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/meals/{id}",
    params(
        ("id" = Uuid, Path, description = "Meal ID")
    ),
    responses(
        (status = 200, description = "Meal", body = ApiResponse<Meal>),
        (status = 404, description = "Meal not found"),
    ),
    tag = "Meals"
)]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Meal>>> {
    let response = meal_service::get_meal(&state, id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/meals",
    request_body = CreateMealRequest,
    responses(
        (status = 200, description = "Create a meal owned by the current user", body = ApiResponse<Meal>),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Meals"
)]
pub async fn create_meal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateMealRequest>,
) -> AppResult<Json<ApiResponse<Meal>>> {
    let response = meal_service::create_meal(&state, &user, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/meals/{id}",
    params(
        ("id" = Uuid, Path, description = "Meal ID")
    ),
    request_body = UpdateMealRequest,
    responses(
        (status = 200, description = "Update an owned meal", body = ApiResponse<Meal>),
        (status = 403, description = "Not the meal's owner"),
        (status = 404, description = "Meal not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Meals"
)]
pub async fn update_meal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMealRequest>,
) -> AppResult<Json<ApiResponse<Meal>>> {
    let response = meal_service::update_meal(&state, &user, id, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/meals/{id}",
    params(
        ("id" = Uuid, Path, description = "Meal ID")
    ),
    responses(
        (status = 200, description = "Delete an owned meal", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Not the meal's owner"),
        (status = 404, description = "Meal not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Meals"
)]
pub async fn delete_meal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let response = meal_service::delete_meal(&state, &user, id).await?;
    Ok(Json(response))
}
