use axum_food_delivery_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        meals::{CreateMealRequest, UpdateMealRequest},
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::AuthUser,
    models::Meal,
    services::{cart_service, meal_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: duplicate adds merge into one line, quantities update
// exactly, snapshots survive catalog edits, and only owners mutate meals.
#[tokio::test]
async fn cart_merge_snapshot_and_ownership_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let buyer_id = create_user(&state, "buyer", "buyer@example.com").await?;
    let cook_id = create_user(&state, "cook", "cook@example.com").await?;

    let buyer = AuthUser {
        user_id: buyer_id,
        role: "user".into(),
    };
    let cook = AuthUser {
        user_id: cook_id,
        role: "user".into(),
    };

    let koshari = create_meal(&state, &cook, "Koshari", 100).await?;
    let soup = create_meal(&state, &cook, "Lentil Soup", 45).await?;

    // First add creates a line with the given quantity.
    let cart = cart_service::add_to_cart(&state, &buyer, add_request(&koshari, 1))
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 1);
    assert_eq!(cart.items[0].price, 100);

    // A second add for the same meal merges instead of duplicating.
    let cart = cart_service::add_to_cart(&state, &buyer, add_request(&koshari, 2))
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 1, "duplicate add must not create a row");
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.items[0].price, 100);
    let koshari_line = cart.items[0].id;

    // Two concurrent adds for the same (user, meal) both succeed and sum.
    let (a, b) = tokio::join!(
        cart_service::add_to_cart(&state, &buyer, add_request(&soup, 1)),
        cart_service::add_to_cart(&state, &buyer, add_request(&soup, 1)),
    );
    a?;
    b?;
    let cart = cart_service::list_cart(&state, &buyer).await?.data.unwrap();
    assert_eq!(cart.items.len(), 2);
    let soup_line = cart
        .items
        .iter()
        .find(|item| item.meal_id == soup.id)
        .expect("soup line");
    assert_eq!(soup_line.quantity, 2);
    let soup_line = soup_line.id;

    // update_quantity sets exactly, not additively.
    let cart = cart_service::update_quantity(
        &state,
        &buyer,
        koshari_line,
        UpdateCartItemRequest { quantity: 5 },
    )
    .await?
    .data
    .unwrap();
    let line = cart
        .items
        .iter()
        .find(|item| item.id == koshari_line)
        .expect("koshari line");
    assert_eq!(line.quantity, 5);

    // Unknown line id fails with NotFound and changes nothing.
    let err = cart_service::update_quantity(
        &state,
        &buyer,
        Uuid::new_v4(),
        UpdateCartItemRequest { quantity: 9 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // A line id belonging to another user is NotFound for this one.
    let err = cart_service::update_quantity(
        &state,
        &cook,
        koshari_line,
        UpdateCartItemRequest { quantity: 9 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let cart = cart_service::list_cart(&state, &buyer).await?.data.unwrap();
    let line = cart
        .items
        .iter()
        .find(|item| item.id == koshari_line)
        .expect("koshari line");
    assert_eq!(line.quantity, 5, "failed updates must leave the cart alone");

    // Zero quantity is rejected up front.
    let err = cart_service::update_quantity(
        &state,
        &buyer,
        koshari_line,
        UpdateCartItemRequest { quantity: 0 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The cart is a snapshot: a later catalog price edit does not touch it.
    meal_service::update_meal(
        &state,
        &cook,
        koshari.id,
        UpdateMealRequest {
            name: None,
            description: None,
            price: Some(999),
            image: None,
            category: None,
        },
    )
    .await?;
    let cart = cart_service::list_cart(&state, &buyer).await?.data.unwrap();
    let line = cart
        .items
        .iter()
        .find(|item| item.id == koshari_line)
        .expect("koshari line");
    assert_eq!(line.price, 100);

    // Only the owning seller may mutate a meal.
    let err = meal_service::update_meal(
        &state,
        &buyer,
        koshari.id,
        UpdateMealRequest {
            name: None,
            description: None,
            price: Some(1),
            image: None,
            category: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    let meal = meal_service::get_meal(&state, koshari.id).await?.data.unwrap();
    assert_eq!(meal.price, 999, "a forbidden update must not apply");

    let err = meal_service::delete_meal(&state, &buyer, koshari.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Removal and clearing.
    let err = cart_service::remove_item(&state, &buyer, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let cart = cart_service::remove_item(&state, &buyer, soup_line)
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 1);

    let cart = cart_service::clear_cart(&state, &buyer).await?.data.unwrap();
    assert!(cart.items.is_empty());

    // Clearing an already-empty cart is fine.
    let cart = cart_service::clear_cart(&state, &buyer).await?.data.unwrap();
    assert!(cart.items.is_empty());

    Ok(())
}

fn add_request(meal: &Meal, quantity: i32) -> AddToCartRequest {
    AddToCartRequest {
        meal_id: Some(meal.id),
        name: meal.name.clone(),
        price: Some(meal.price),
        image: meal.image.clone(),
        quantity: Some(quantity),
        seller_id: Some(meal.user_id),
    }
}

async fn create_meal(
    state: &AppState,
    owner: &AuthUser,
    name: &str,
    price: i64,
) -> anyhow::Result<Meal> {
    let meal = meal_service::create_meal(
        state,
        owner,
        CreateMealRequest {
            name: name.to_string(),
            description: None,
            price: Some(price),
            image: None,
            category: None,
        },
    )
    .await?
    .data
    .unwrap();
    Ok(meal)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, audit_logs, meals, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}

async fn create_user(state: &AppState, username: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        address: Set(String::new()),
        role: Set("user".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
