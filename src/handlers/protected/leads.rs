use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::database::models::lead::{Lead, LEAD_STATUSES};
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
pub struct CreateLead {
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLead {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub owner_id: Option<Uuid>,
}

/// GET /api/leads
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<Lead>>, ApiError> {
    ctx.require(Resource::Leads, Permission::View)?;

    if let Some(status) = &query.status {
        validate_choice("status", status, LEAD_STATUSES)?;
    }
    let (limit, offset) = page_params(query.limit, query.offset);

    let leads = sqlx::query_as::<_, Lead>(
        "SELECT * FROM leads
         WHERE ($1::text IS NULL OR status = $1)
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(&query.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(leads))
}

/// GET /api/leads/:id
pub async fn get(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Lead>, ApiError> {
    ctx.require(Resource::Leads, Permission::View)?;
    let lead = fetch_lead(&ctx, id).await?;
    Ok(ApiResponse::success(lead))
}

/// POST /api/leads
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateLead>,
) -> Result<ApiResponse<Lead>, ApiError> {
    ctx.require(Resource::Leads, Permission::Create)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Lead name is required"));
    }
    let status = payload.status.unwrap_or_else(|| "new".to_string());
    validate_choice("status", &status, LEAD_STATUSES)?;

    let lead = sqlx::query_as::<_, Lead>(
        "INSERT INTO leads (name, company, email, phone, source, status, notes, owner_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(payload.name.trim())
    .bind(&payload.company)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.source)
    .bind(&status)
    .bind(&payload.notes)
    .bind(payload.owner_id)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Create, Resource::Leads, Some(lead.id), None, snapshot(&lead))
        .await;

    Ok(ApiResponse::created(lead))
}

/// PUT /api/leads/:id
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLead>,
) -> Result<ApiResponse<Lead>, ApiError> {
    ctx.require(Resource::Leads, Permission::Edit)?;

    if let Some(status) = &payload.status {
        validate_choice("status", status, LEAD_STATUSES)?;
    }

    let before = fetch_lead(&ctx, id).await?;

    let lead = sqlx::query_as::<_, Lead>(
        "UPDATE leads SET
            name = COALESCE($2, name),
            company = COALESCE($3, company),
            email = COALESCE($4, email),
            phone = COALESCE($5, phone),
            source = COALESCE($6, source),
            status = COALESCE($7, status),
            notes = COALESCE($8, notes),
            owner_id = COALESCE($9, owner_id),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.company)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.source)
    .bind(&payload.status)
    .bind(&payload.notes)
    .bind(payload.owner_id)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Update, Resource::Leads, Some(id), snapshot(&before), snapshot(&lead))
        .await;

    Ok(ApiResponse::success(lead))
}

/// DELETE /api/leads/:id
pub async fn delete(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    ctx.require(Resource::Leads, Permission::Delete)?;

    let before = fetch_lead(&ctx, id).await?;

    sqlx::query("DELETE FROM leads WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await?;

    ctx.audit()
        .record(AuditAction::Delete, Resource::Leads, Some(id), snapshot(&before), None)
        .await;

    Ok(ApiResponse::no_content())
}

async fn fetch_lead(ctx: &RequestContext, id: Uuid) -> Result<Lead, ApiError> {
    sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead not found"))
}
