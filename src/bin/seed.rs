use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use axum_food_delivery_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin123", "admin").await?;
    let cook_id = ensure_user(&pool, "cook", "cook@example.com", "cook123", "user").await?;
    let user_id = ensure_user(&pool, "hungry", "user@example.com", "user123", "user").await?;
    seed_meals(&pool, cook_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Cook ID: {cook_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} <{email}> (role={role})");
    Ok(user_id)
}

async fn seed_meals(pool: &sqlx::PgPool, seller_id: Uuid) -> anyhow::Result<()> {
    let meals = vec![
        (
            "Margherita Pizza",
            "Tomato, mozzarella and basil",
            "pizza",
            12000,
        ),
        (
            "Koshari",
            "Rice, lentils and pasta with spiced tomato sauce",
            "main",
            9000,
        ),
        ("Chicken Shawarma", "Wrap with garlic sauce", "main", 8500),
        ("Lentil Soup", "Slow-cooked with cumin", "starter", 4500),
        ("Baklava", "Layered pastry with pistachio", "dessert", 5000),
    ];

    for (name, desc, category, price) in meals {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM meals WHERE name = $1 AND user_id = $2")
                .bind(name)
                .bind(seller_id)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO meals (id, name, description, price, category, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price as i64)
        .bind(category)
        .bind(seller_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded meals");
    Ok(())
}
