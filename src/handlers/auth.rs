// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        CreateUserRequest, GenerateUsernameParams, LoginRequest, User, disambiguate_username,
        username_base,
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Picks a free username for the given name and birthday.
pub(crate) async fn generate_unique_username(
    pool: &PgPool,
    first_name: &str,
    last_name: &str,
    date_of_birth: NaiveDate,
) -> Result<String, AppError> {
    let base = username_base(first_name, last_name, date_of_birth);

    let (existing,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE LEFT(username, LENGTH($1)) = $1")
            .bind(&base)
            .fetch_one(pool)
            .await?;

    Ok(disambiguate_username(&base, existing))
}

/// Registers a new user.
///
/// The username is generated from the name and date of birth.
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let username = generate_unique_username(
        &pool,
        &payload.first_name,
        &payload.last_name,
        payload.date_of_birth,
    )
    .await?;
    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, first_name, last_name, date_of_birth, year_group, password)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, username, first_name, last_name, date_of_birth, year_group, password, is_staff, created_at
        "#,
    )
    .bind(&username)
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.date_of_birth)
    .bind(payload.year_group)
    .bind(hashed_password)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Postgres error code for unique violation is 23505
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Username '{}' already exists", username))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!("Registered user {}", user.username);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the username and password against the database.
/// If valid, signs a JWT token with the user's ID and staff flag.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, first_name, last_name, date_of_birth, year_group, password, is_staff, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = user.ok_or(AppError::AuthError("Invalid username or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid username or password".to_string()));
    }

    let token = sign_jwt(user.id, user.is_staff, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": {
            "username": user.username,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "is_staff": user.is_staff,
        }
    })))
}

/// Previews the username registration would assign.
pub async fn generate_username(
    State(pool): State<PgPool>,
    Query(params): Query<GenerateUsernameParams>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(first_name), Some(last_name), Some(date_of_birth)) = (
        params.first_name.filter(|s| !s.trim().is_empty()),
        params.last_name.filter(|s| !s.trim().is_empty()),
        params.date_of_birth.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    let dob = NaiveDate::parse_from_str(date_of_birth.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format".to_string()))?;

    let username = generate_unique_username(&pool, &first_name, &last_name, dob).await?;

    Ok(Json(json!({ "username": username })))
}
