use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};

/// GET /api/auth/whoami - current user profile with role and permissions
pub async fn whoami(
    Extension(ctx): Extension<RequestContext>,
) -> Result<ApiResponse<Value>, ApiError> {
    let role_name: Option<String> = sqlx::query_scalar(
        "SELECT r.name FROM roles r JOIN users u ON u.role_id = r.id WHERE u.id = $1",
    )
    .bind(ctx.auth.user_id)
    .fetch_optional(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(json!({
        "id": ctx.auth.user_id,
        "username": ctx.auth.user,
        "tenant": ctx.auth.tenant,
        "role": role_name,
        "permissions": ctx.permissions.as_strings(),
    })))
}

/// GET /api/auth/permissions - effective permission strings for UI gating
pub async fn permissions(
    Extension(ctx): Extension<RequestContext>,
) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": ctx.permissions.as_strings(),
    }))
}
