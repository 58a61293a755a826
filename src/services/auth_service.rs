use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        Claims, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Collects every violated field so the registration form can show all
/// problems at once.
pub fn validate_registration(payload: &RegisterRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if payload.username.trim().is_empty() {
        errors.push("Username is required".to_string());
    }
    if payload.email.trim().is_empty() {
        errors.push("Email is required".to_string());
    } else if !looks_like_email(&payload.email) {
        errors.push("Invalid email format".to_string());
    }
    if payload.password.trim().is_empty() {
        errors.push("Password is required".to_string());
    }

    errors
}

pub fn looks_like_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let errors = validate_registration(&payload);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let exist: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 OR username = $2")
            .bind(payload.email.trim())
            .bind(payload.username.trim())
            .fetch_optional(&state.pool)
            .await?;

    if exist.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let id = Uuid::new_v4();

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, address)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.username.trim())
    .bind(payload.email.trim())
    .bind(password_hash)
    .bind(payload.address.as_deref().unwrap_or_default())
    .fetch_one(&state.pool)
    .await
    .map_err(|err| match &err {
        // Two concurrent registrations can both pass the existence check.
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("User already exists".to_string())
        }
        _ => AppError::DbError(err),
    })?;

    log_audit(
        state,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success("User created", user, None))
}

/// Login by username or email.
pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;
    let user: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE username = $1 OR email = $1")
            .bind(username.as_str())
            .fetch_optional(&state.pool)
            .await?;

    let user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::BadRequest(
                "Invalid username or password".to_string(),
            ));
        }
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest(
            "Invalid username or password".to_string(),
        ));
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    log_audit(
        state,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        user,
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let found: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;

    match found {
        Some(u) => Ok(ApiResponse::success("OK", u, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    if let Some(username) = payload.username.as_ref() {
        if username.trim().is_empty() {
            return Err(AppError::Validation(vec![
                "Username is required".to_string(),
            ]));
        }
    }

    let updated: Option<User> = sqlx::query_as(
        r#"
        UPDATE users
        SET username = COALESCE($2, username),
            address = COALESCE($3, address)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.username.as_deref().map(str::trim))
    .bind(payload.address.as_deref())
    .fetch_optional(&state.pool)
    .await?;

    let updated = match updated {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    log_audit(
        state,
        Some(user.user_id),
        "profile_update",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.user_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated",
        updated,
        Some(Meta::empty()),
    ))
}
