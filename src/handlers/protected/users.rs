use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::auth::hash_password;
use crate::database::models::role::UserPermissionRow;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};
use crate::permissions::{Permission, Resource};

use super::{page_params, snapshot};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub password: String,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct OverrideEntry {
    pub resource: String,
    pub permission: String,
    pub granted: bool,
}

/// GET /api/users
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    ctx.require(Resource::Users, Permission::View)?;
    let (limit, offset) = page_params(query.limit, query.offset);

    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users ORDER BY username LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(users))
}

/// GET /api/users/:id
pub async fn get(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<User>, ApiError> {
    ctx.require(Resource::Users, Permission::View)?;
    let user = fetch_user(&ctx, id).await?;
    Ok(ApiResponse::success(user))
}

/// POST /api/users
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateUser>,
) -> Result<ApiResponse<User>, ApiError> {
    ctx.require(Resource::Users, Permission::Create)?;

    let username = payload.username.trim().to_lowercase();
    if username.is_empty() || payload.display_name.trim().is_empty() {
        return Err(ApiError::bad_request("Username and display name are required"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Failed to create user")
    })?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, display_name, email, password_hash, role_id)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(&username)
    .bind(payload.display_name.trim())
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(payload.role_id)
    .fetch_one(&ctx.pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            ApiError::conflict("Username is already taken")
        }
        _ => e.into(),
    })?;

    ctx.audit()
        .record(AuditAction::Create, Resource::Users, Some(user.id), None, snapshot(&user))
        .await;

    Ok(ApiResponse::created(user))
}

/// PUT /api/users/:id - role changes are audited as permission changes
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUser>,
) -> Result<ApiResponse<User>, ApiError> {
    ctx.require(Resource::Users, Permission::Edit)?;

    if payload.is_active == Some(false) && id == ctx.auth.user_id {
        return Err(ApiError::bad_request("Cannot deactivate your own account"));
    }

    let password_hash = match &payload.password {
        Some(password) => {
            if password.len() < 8 {
                return Err(ApiError::bad_request("Password must be at least 8 characters"));
            }
            Some(hash_password(password).map_err(|e| {
                tracing::error!("Password hashing failed: {}", e);
                ApiError::internal_server_error("Failed to update user")
            })?)
        }
        None => None,
    };

    let before = fetch_user(&ctx, id).await?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET
            display_name = COALESCE($2, display_name),
            email = COALESCE($3, email),
            password_hash = COALESCE($4, password_hash),
            role_id = COALESCE($5, role_id),
            is_active = COALESCE($6, is_active),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&payload.display_name)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(payload.role_id)
    .bind(payload.is_active)
    .fetch_one(&ctx.pool)
    .await?;

    let action = if payload.role_id.is_some() && payload.role_id != before.role_id {
        AuditAction::PermissionChange
    } else {
        AuditAction::Update
    };
    ctx.audit()
        .record(action, Resource::Users, Some(id), snapshot(&before), snapshot(&user))
        .await;

    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/:id - deactivates rather than deletes; history keeps
/// its foreign keys
pub async fn deactivate(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<User>, ApiError> {
    ctx.require(Resource::Users, Permission::Delete)?;

    if id == ctx.auth.user_id {
        return Err(ApiError::bad_request("Cannot deactivate your own account"));
    }

    let before = fetch_user(&ctx, id).await?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Update, Resource::Users, Some(id), snapshot(&before), snapshot(&user))
        .await;

    Ok(ApiResponse::success(user))
}

/// GET /api/users/:id/permissions - the user's override rows
pub async fn list_overrides(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Vec<UserPermissionRow>>, ApiError> {
    ctx.require(Resource::Users, Permission::View)?;

    fetch_user(&ctx, id).await?;

    let rows = sqlx::query_as::<_, UserPermissionRow>(
        "SELECT * FROM user_permissions WHERE user_id = $1 ORDER BY resource, permission",
    )
    .bind(id)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(rows))
}

/// PUT /api/users/:id/permissions - replaces the override set atomically
pub async fn replace_overrides(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(entries): Json<Vec<OverrideEntry>>,
) -> Result<ApiResponse<Vec<UserPermissionRow>>, ApiError> {
    ctx.require(Resource::Users, Permission::Edit)?;

    // Reject unknown resource/permission strings before touching the table
    for entry in &entries {
        entry
            .resource
            .parse::<crate::permissions::Resource>()
            .map_err(ApiError::bad_request)?;
        entry
            .permission
            .parse::<crate::permissions::Permission>()
            .map_err(ApiError::bad_request)?;
    }

    fetch_user(&ctx, id).await?;

    let mut tx = ctx.pool.begin().await?;

    let before: Vec<UserPermissionRow> =
        sqlx::query_as("SELECT * FROM user_permissions WHERE user_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

    sqlx::query("DELETE FROM user_permissions WHERE user_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let mut after = Vec::with_capacity(entries.len());
    for entry in &entries {
        let row: UserPermissionRow = sqlx::query_as(
            "INSERT INTO user_permissions (user_id, resource, permission, granted)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, resource, permission) DO UPDATE SET granted = EXCLUDED.granted
             RETURNING *",
        )
        .bind(id)
        .bind(&entry.resource)
        .bind(&entry.permission)
        .bind(entry.granted)
        .fetch_one(&mut *tx)
        .await?;
        after.push(row);
    }

    tx.commit().await?;

    ctx.audit()
        .record(
            AuditAction::PermissionChange,
            Resource::Users,
            Some(id),
            Some(json!(before)),
            Some(json!(after)),
        )
        .await;

    Ok(ApiResponse::success(after))
}

async fn fetch_user(ctx: &RequestContext, id: Uuid) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}
