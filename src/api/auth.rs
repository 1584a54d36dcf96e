//! Registration, login, and token-session plumbing.
//!
//! Tokens are random 32-byte hex strings handed to the client once;
//! the server stores only a SHA-256 hash alongside an expiry. The `User`
//! extractor resolves the bearer token to the acting user for every
//! protected handler.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::str::FromStr;
use std::sync::Arc;

use crate::db::{
    AuthResponse, Authorisation, DbPool, LoginRequest, MessageResponse, RegisterRequest, Role,
    Session, User, UserDetailResponse, UserResponse,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password, validate_short_text};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Open a session for a user and return the plaintext token
async fn open_session(pool: &DbPool, user_id: i64, ttl_days: i64) -> Result<String, ApiError> {
    let token = generate_token();
    let token_hash = hash_token(&token);

    let expires_at = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::days(ttl_days))
        .ok_or_else(|| ApiError::internal("Failed to compute session expiry"))?
        .to_rfc3339();

    let session_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(&token_hash)
    .bind(&expires_at)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(token)
}

/// Register endpoint
///
/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_short_text(&req.name, "Name") {
        errors.add("name", e);
    }
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }

    // Role defaults to student; anything outside the closed set is rejected
    let role = match &req.role {
        None => Role::Student,
        Some(raw) => match Role::from_str(raw) {
            Ok(role) => role,
            Err(_) => {
                errors.add("role", "Role must be one of: student, teacher, admin");
                Role::Student
            }
        },
    };

    // Uniqueness reported alongside the other field errors
    let taken: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_one(&state.db)
        .await?;
    if taken.0 > 0 {
        errors.add("email", "Email is already registered");
    }

    errors.finish()?;

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(role)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    let token = open_session(&state.db, user.id, state.config.auth.session_ttl_days).await?;

    tracing::info!(email = %user.email, role = %user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            status: "success",
            user: UserResponse::from(user),
            authorisation: Authorisation::bearer(token),
        }),
    ))
}

/// Login endpoint
///
/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;

    // Same message for unknown email and wrong password
    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = open_session(&state.db, user.id, state.config.auth.session_ttl_days).await?;

    Ok(Json(AuthResponse {
        status: "success",
        user: UserResponse::from(user),
        authorisation: Authorisation::bearer(token),
    }))
}

/// Current user endpoint
///
/// GET /api/userdetail
pub async fn user_details(user: User) -> Json<UserDetailResponse> {
    Json(UserDetailResponse {
        status: "success",
        user: UserResponse::from(user),
    })
}

/// Logout endpoint; invalidates the presented token only
///
/// POST /api/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    _user: User,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let token =
        extract_token(&headers).ok_or_else(|| ApiError::unauthorized("Unauthenticated"))?;

    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_token(&token))
        .execute(&state.db)
        .await?;

    Ok(Json(MessageResponse::success("Logged out successfully")))
}

/// Extract the bearer token from request headers
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization").and_then(|h| h.to_str().ok())?;
    if let Some(token) = auth_header.strip_prefix("Bearer ") {
        Some(token.to_string())
    } else {
        Some(auth_header.to_string())
    }
}

/// Get the current user from a token
pub async fn get_current_user(pool: &DbPool, token: &str) -> Result<User, ApiError> {
    let token_hash = hash_token(token);
    let session: Option<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE token_hash = ? AND expires_at > datetime('now')",
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await?;

    let session = session.ok_or_else(|| ApiError::unauthorized("Unauthenticated"))?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(session.user_id)
        .fetch_optional(pool)
        .await?;

    user.ok_or_else(|| ApiError::unauthorized("Unauthenticated"))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for User {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Unauthenticated"))?;
        get_current_user(&state.db, &token).await
    }
}

/// Seed the configured admin account if it does not exist yet
pub async fn ensure_admin_user(pool: &DbPool, email: &str, password: &str) -> anyhow::Result<()> {
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        return Ok(());
    }

    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind("Administrator")
    .bind(email)
    .bind(&password_hash)
    .bind(Role::Admin)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    tracing::info!(email, "Seeded admin user");
    Ok(())
}
