use axum::extract::Query;
use axum::Extension;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::database::models::attendance::Attendance;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};
use crate::permissions::{Permission, Resource};

use super::{page_params, snapshot};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/attendance - own records freely; listing others requires
/// attendance:view
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<Attendance>>, ApiError> {
    let target = query.user.unwrap_or(ctx.auth.user_id);
    if target != ctx.auth.user_id {
        ctx.require(Resource::Attendance, Permission::View)?;
    }
    let (limit, offset) = page_params(query.limit, query.offset);

    let records = sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance
         WHERE user_id = $1
           AND ($2::date IS NULL OR work_date = $2)
         ORDER BY work_date DESC
         LIMIT $3 OFFSET $4",
    )
    .bind(target)
    .bind(query.date)
    .bind(limit)
    .bind(offset)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(records))
}

/// POST /api/attendance/check-in - one record per user per day
pub async fn check_in(
    Extension(ctx): Extension<RequestContext>,
) -> Result<ApiResponse<Attendance>, ApiError> {
    ctx.require(Resource::Attendance, Permission::Create)?;

    let today = Utc::now().date_naive();

    let record = sqlx::query_as::<_, Attendance>(
        "INSERT INTO attendance (user_id, work_date, check_in)
         VALUES ($1, $2, now())
         RETURNING *",
    )
    .bind(ctx.auth.user_id)
    .bind(today)
    .fetch_one(&ctx.pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            ApiError::conflict("Already checked in today")
        }
        _ => e.into(),
    })?;

    ctx.audit()
        .record(AuditAction::Create, Resource::Attendance, Some(record.id), None, snapshot(&record))
        .await;

    Ok(ApiResponse::created(record))
}

/// POST /api/attendance/check-out - closes today's open record
pub async fn check_out(
    Extension(ctx): Extension<RequestContext>,
) -> Result<ApiResponse<Attendance>, ApiError> {
    ctx.require(Resource::Attendance, Permission::Create)?;

    let today = Utc::now().date_naive();

    let record = sqlx::query_as::<_, Attendance>(
        "UPDATE attendance SET check_out = now()
         WHERE user_id = $1 AND work_date = $2 AND check_out IS NULL
         RETURNING *",
    )
    .bind(ctx.auth.user_id)
    .bind(today)
    .fetch_optional(&ctx.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("No open attendance record for today"))?;

    ctx.audit()
        .record(AuditAction::Update, Resource::Attendance, Some(record.id), None, snapshot(&record))
        .await;

    Ok(ApiResponse::success(record))
}
