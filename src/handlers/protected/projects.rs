use axum::extract::{Path, Query};
use axum::{Extension, Json};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::database::models::project::{Project, PROJECT_STATUSES};
use crate::documents::numbering::{next_monthly_project_serial, project_code};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};
use crate::permissions::{Permission, Resource};

use super::{page_params, snapshot, validate_choice};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub client_name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub client_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<Decimal>,
}

/// GET /api/projects
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<Project>>, ApiError> {
    ctx.require(Resource::Projects, Permission::View)?;

    if let Some(status) = &query.status {
        validate_choice("status", status, PROJECT_STATUSES)?;
    }
    let (limit, offset) = page_params(query.limit, query.offset);

    let projects = sqlx::query_as::<_, Project>(
        "SELECT * FROM projects
         WHERE ($1::text IS NULL OR status = $1)
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(&query.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(projects))
}

/// GET /api/projects/:id
pub async fn get(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Project>, ApiError> {
    ctx.require(Resource::Projects, Permission::View)?;
    let project = fetch_project(&ctx, id).await?;
    Ok(ApiResponse::success(project))
}

/// POST /api/projects - assigns the `serial-month-year` code, serial
/// restarting each calendar month
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateProject>,
) -> Result<ApiResponse<Project>, ApiError> {
    ctx.require(Resource::Projects, Permission::Create)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Project name is required"));
    }
    validate_dates(payload.start_date, payload.end_date)?;

    let now = Utc::now();

    let mut tx = ctx.pool.begin().await?;
    let serial = next_monthly_project_serial(&mut tx).await?;
    let code = project_code(serial, now.month(), now.year());

    let project = sqlx::query_as::<_, Project>(
        "INSERT INTO projects (code, serial, name, client_name, description, start_date, end_date, budget)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(&code)
    .bind(serial)
    .bind(payload.name.trim())
    .bind(&payload.client_name)
    .bind(&payload.description)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.budget)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    ctx.audit()
        .record(AuditAction::Create, Resource::Projects, Some(project.id), None, snapshot(&project))
        .await;

    Ok(ApiResponse::created(project))
}

/// PUT /api/projects/:id
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProject>,
) -> Result<ApiResponse<Project>, ApiError> {
    ctx.require(Resource::Projects, Permission::Edit)?;

    if let Some(status) = &payload.status {
        validate_choice("status", status, PROJECT_STATUSES)?;
    }

    let before = fetch_project(&ctx, id).await?;

    let start = payload.start_date.or(before.start_date);
    let end = payload.end_date.or(before.end_date);
    validate_dates(start, end)?;

    let project = sqlx::query_as::<_, Project>(
        "UPDATE projects SET
            name = COALESCE($2, name),
            client_name = COALESCE($3, client_name),
            description = COALESCE($4, description),
            status = COALESCE($5, status),
            start_date = COALESCE($6, start_date),
            end_date = COALESCE($7, end_date),
            budget = COALESCE($8, budget),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.client_name)
    .bind(&payload.description)
    .bind(&payload.status)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.budget)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Update, Resource::Projects, Some(id), snapshot(&before), snapshot(&project))
        .await;

    Ok(ApiResponse::success(project))
}

/// DELETE /api/projects/:id
pub async fn delete(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    ctx.require(Resource::Projects, Permission::Delete)?;

    let before = fetch_project(&ctx, id).await?;

    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await?;

    ctx.audit()
        .record(AuditAction::Delete, Resource::Projects, Some(id), snapshot(&before), None)
        .await;

    Ok(ApiResponse::no_content())
}

fn validate_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), ApiError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ApiError::bad_request("End date must not be before start date"));
        }
    }
    Ok(())
}

async fn fetch_project(ctx: &RequestContext, id: Uuid) -> Result<Project, ApiError> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))
}
