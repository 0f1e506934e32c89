use axum::extract::Query;
use axum::Extension;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::audit::AuditLog;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};
use crate::permissions::{Permission, Resource};

use super::page_params;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub resource: Option<String>,
    pub actor: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/audit - newest entries first
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<AuditLog>>, ApiError> {
    ctx.require(Resource::AuditLogs, Permission::View)?;

    if let Some(resource) = &query.resource {
        resource
            .parse::<Resource>()
            .map_err(ApiError::bad_request)?;
    }
    let (limit, offset) = page_params(query.limit, query.offset);

    let entries = sqlx::query_as::<_, AuditLog>(
        "SELECT * FROM audit_logs
         WHERE ($1::text IS NULL OR resource = $1)
           AND ($2::uuid IS NULL OR actor_id = $2)
         ORDER BY id DESC
         LIMIT $3 OFFSET $4",
    )
    .bind(&query.resource)
    .bind(query.actor)
    .bind(limit)
    .bind(offset)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(entries))
}
