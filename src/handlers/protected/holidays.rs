use axum::extract::{Path, Query};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::database::models::holiday::{Holiday, HOLIDAY_KINDS};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};
use crate::permissions::{Permission, Resource};

use super::{snapshot, validate_choice};

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHoliday {
    pub name: String,
    pub holiday_date: NaiveDate,
    pub kind: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHoliday {
    pub name: Option<String>,
    pub holiday_date: Option<NaiveDate>,
    pub kind: Option<String>,
    pub is_optional: Option<bool>,
}

/// GET /api/holidays - calendar listing, optionally filtered by year/month
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<CalendarQuery>,
) -> Result<ApiResponse<Vec<Holiday>>, ApiError> {
    ctx.require(Resource::Holidays, Permission::View)?;

    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(ApiError::bad_request("Month must be between 1 and 12"));
        }
    }

    let holidays = sqlx::query_as::<_, Holiday>(
        "SELECT * FROM holidays
         WHERE ($1::int IS NULL OR EXTRACT(YEAR FROM holiday_date)::int = $1)
           AND ($2::int IS NULL OR EXTRACT(MONTH FROM holiday_date)::int = $2)
         ORDER BY holiday_date",
    )
    .bind(query.year)
    .bind(query.month)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(holidays))
}

/// POST /api/holidays - duplicate (date, name) pairs are rejected
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateHoliday>,
) -> Result<ApiResponse<Holiday>, ApiError> {
    ctx.require(Resource::Holidays, Permission::Create)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Holiday name is required"));
    }
    let kind = payload.kind.unwrap_or_else(|| "public".to_string());
    validate_choice("kind", &kind, HOLIDAY_KINDS)?;

    let holiday = sqlx::query_as::<_, Holiday>(
        "INSERT INTO holidays (name, holiday_date, kind, is_optional)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(payload.name.trim())
    .bind(payload.holiday_date)
    .bind(&kind)
    .bind(payload.is_optional)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Create, Resource::Holidays, Some(holiday.id), None, snapshot(&holiday))
        .await;

    Ok(ApiResponse::created(holiday))
}

/// PUT /api/holidays/:id
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateHoliday>,
) -> Result<ApiResponse<Holiday>, ApiError> {
    ctx.require(Resource::Holidays, Permission::Edit)?;

    if let Some(kind) = &payload.kind {
        validate_choice("kind", kind, HOLIDAY_KINDS)?;
    }

    let before = fetch_holiday(&ctx, id).await?;

    let holiday = sqlx::query_as::<_, Holiday>(
        "UPDATE holidays SET
            name = COALESCE($2, name),
            holiday_date = COALESCE($3, holiday_date),
            kind = COALESCE($4, kind),
            is_optional = COALESCE($5, is_optional)
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(payload.holiday_date)
    .bind(&payload.kind)
    .bind(payload.is_optional)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Update, Resource::Holidays, Some(id), snapshot(&before), snapshot(&holiday))
        .await;

    Ok(ApiResponse::success(holiday))
}

/// DELETE /api/holidays/:id
pub async fn delete(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    ctx.require(Resource::Holidays, Permission::Delete)?;

    let before = fetch_holiday(&ctx, id).await?;

    sqlx::query("DELETE FROM holidays WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await?;

    ctx.audit()
        .record(AuditAction::Delete, Resource::Holidays, Some(id), snapshot(&before), None)
        .await;

    Ok(ApiResponse::no_content())
}

async fn fetch_holiday(ctx: &RequestContext, id: Uuid) -> Result<Holiday, ApiError> {
    sqlx::query_as::<_, Holiday>("SELECT * FROM holidays WHERE id = $1")
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Holiday not found"))
}
