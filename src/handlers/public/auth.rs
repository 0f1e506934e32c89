use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, verify_password, Claims};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::middleware::context::load_permissions;
use crate::middleware::ApiResponse;
use crate::services::TenantService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub tenant: String,
    pub username: String,
    pub password: String,
}

/// POST /auth/login - authenticate against a tenant and receive a JWT.
///
/// Unknown tenant, unknown user, wrong password, and deactivated accounts all
/// answer the same 401 - the login surface must not leak which part failed.
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<ApiResponse<Value>, ApiError> {
    let service = TenantService::new().await?;

    let tenant = service
        .find_active(&payload.tenant)
        .await
        .map_err(|_| ApiError::unauthorized("Invalid credentials"))?;

    let pool = DatabaseManager::tenant_pool(&tenant.database).await?;

    // Usernames are stored lowercased
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(payload.username.trim().to_lowercase())
        .fetch_optional(&pool)
        .await?;

    let Some(user) = user else {
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !user.is_active || !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let claims = Claims::new(
        tenant.name.clone(),
        user.username.clone(),
        tenant.database.clone(),
        user.id,
    );
    let token = generate_jwt(&claims)?;

    let permissions = load_permissions(&pool, &user).await?;

    tracing::info!(tenant = %tenant.name, user = %user.username, "login succeeded");

    Ok(ApiResponse::success(json!({
        "token": token,
        "expires_in": config::config().security.jwt_expiry_hours * 3600,
        "user": {
            "id": user.id,
            "username": user.username,
            "display_name": user.display_name,
            "tenant": tenant.name,
            "permissions": permissions.as_strings(),
        }
    })))
}
