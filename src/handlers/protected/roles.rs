use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::database::models::role::{Role, RolePermissionRow};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};
use crate::permissions::{Permission, Resource};

use super::snapshot;

#[derive(Debug, Deserialize)]
pub struct GrantEntry {
    pub resource: String,
    pub permission: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
    pub hierarchy_level: i32,
    #[serde(default)]
    pub permissions: Vec<GrantEntry>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hierarchy_level: Option<i32>,
    pub permissions: Option<Vec<GrantEntry>>,
}

/// GET /api/roles
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
) -> Result<ApiResponse<Vec<Role>>, ApiError> {
    ctx.require(Resource::Roles, Permission::View)?;

    let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY hierarchy_level, name")
        .fetch_all(&ctx.pool)
        .await?;

    Ok(ApiResponse::success(roles))
}

/// GET /api/roles/:id - role plus its explicit grants
pub async fn get(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Value>, ApiError> {
    ctx.require(Resource::Roles, Permission::View)?;

    let role = fetch_role(&ctx, id).await?;
    let grants = fetch_grants(&ctx, id).await?;

    Ok(ApiResponse::success(json!({
        "role": role,
        "permissions": grants,
    })))
}

/// POST /api/roles
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateRole>,
) -> Result<ApiResponse<Value>, ApiError> {
    ctx.require(Resource::Roles, Permission::Create)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Role name is required"));
    }
    if payload.hierarchy_level < 1 {
        return Err(ApiError::bad_request("Hierarchy level must be at least 1"));
    }
    validate_grants(&payload.permissions)?;

    let mut tx = ctx.pool.begin().await?;

    let role = sqlx::query_as::<_, Role>(
        "INSERT INTO roles (name, description, hierarchy_level)
         VALUES ($1, $2, $3)
         RETURNING *",
    )
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.hierarchy_level)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            ApiError::conflict("Role name is already taken")
        }
        _ => e.into(),
    })?;

    let grants = insert_grants(&mut tx, role.id, &payload.permissions).await?;

    tx.commit().await?;

    ctx.audit()
        .record(
            AuditAction::Create,
            Resource::Roles,
            Some(role.id),
            None,
            Some(json!({ "role": role, "permissions": grants })),
        )
        .await;

    Ok(ApiResponse::created(json!({
        "role": role,
        "permissions": grants,
    })))
}

/// PUT /api/roles/:id - replacing the grant set is a permission change
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRole>,
) -> Result<ApiResponse<Value>, ApiError> {
    ctx.require(Resource::Roles, Permission::Edit)?;

    if let Some(level) = payload.hierarchy_level {
        if level < 1 {
            return Err(ApiError::bad_request("Hierarchy level must be at least 1"));
        }
    }
    if let Some(grants) = &payload.permissions {
        validate_grants(grants)?;
    }

    let before_role = fetch_role(&ctx, id).await?;
    let before_grants = fetch_grants(&ctx, id).await?;

    let mut tx = ctx.pool.begin().await?;

    let role = sqlx::query_as::<_, Role>(
        "UPDATE roles SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            hierarchy_level = COALESCE($4, hierarchy_level),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.hierarchy_level)
    .fetch_one(&mut *tx)
    .await?;

    let grants = match &payload.permissions {
        Some(entries) => {
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_grants(&mut tx, id, entries).await?
        }
        None => before_grants.clone(),
    };

    tx.commit().await?;

    let action = if payload.permissions.is_some() {
        AuditAction::PermissionChange
    } else {
        AuditAction::Update
    };
    ctx.audit()
        .record(
            action,
            Resource::Roles,
            Some(id),
            Some(json!({ "role": before_role, "permissions": before_grants })),
            Some(json!({ "role": role, "permissions": grants })),
        )
        .await;

    Ok(ApiResponse::success(json!({
        "role": role,
        "permissions": grants,
    })))
}

/// DELETE /api/roles/:id - refuses while users still hold the role
pub async fn delete(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    ctx.require(Resource::Roles, Permission::Delete)?;

    let before = fetch_role(&ctx, id).await?;

    let holders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = $1")
        .bind(id)
        .fetch_one(&ctx.pool)
        .await?;
    if holders > 0 {
        return Err(ApiError::conflict(format!(
            "Role is still assigned to {} user(s)",
            holders
        )));
    }

    sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await?;

    ctx.audit()
        .record(AuditAction::Delete, Resource::Roles, Some(id), snapshot(&before), None)
        .await;

    Ok(ApiResponse::no_content())
}

fn validate_grants(entries: &[GrantEntry]) -> Result<(), ApiError> {
    for entry in entries {
        entry
            .resource
            .parse::<Resource>()
            .map_err(ApiError::bad_request)?;
        entry
            .permission
            .parse::<Permission>()
            .map_err(ApiError::bad_request)?;
    }
    Ok(())
}

async fn insert_grants(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    role_id: Uuid,
    entries: &[GrantEntry],
) -> Result<Vec<RolePermissionRow>, ApiError> {
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let row: RolePermissionRow = sqlx::query_as(
            "INSERT INTO role_permissions (role_id, resource, permission)
             VALUES ($1, $2, $3)
             ON CONFLICT (role_id, resource, permission) DO UPDATE SET permission = EXCLUDED.permission
             RETURNING *",
        )
        .bind(role_id)
        .bind(&entry.resource)
        .bind(&entry.permission)
        .fetch_one(&mut **tx)
        .await?;
        rows.push(row);
    }
    Ok(rows)
}

async fn fetch_role(ctx: &RequestContext, id: Uuid) -> Result<Role, ApiError> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Role not found"))
}

async fn fetch_grants(ctx: &RequestContext, id: Uuid) -> Result<Vec<RolePermissionRow>, ApiError> {
    let rows = sqlx::query_as::<_, RolePermissionRow>(
        "SELECT * FROM role_permissions WHERE role_id = $1 ORDER BY resource, permission",
    )
    .bind(id)
    .fetch_all(&ctx.pool)
    .await?;
    Ok(rows)
}
