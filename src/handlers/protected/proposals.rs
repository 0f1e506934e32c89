use axum::extract::{Path, Query};
use axum::response::Html;
use axum::{Extension, Json};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::database::models::line_item::{grand_total, subtotal, LineItem};
use crate::database::models::proposal::{Proposal, PROPOSAL_STATUSES};
use crate::documents::html::quotation_html;
use crate::documents::numbering::{next_serial, proposal_number, SerialTable};
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
pub struct CreateProposal {
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub tax_percent: Decimal,
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProposal {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub line_items: Option<Vec<LineItem>>,
    pub discount_percent: Option<Decimal>,
    pub tax_percent: Option<Decimal>,
    pub status: Option<String>,
    pub valid_until: Option<NaiveDate>,
}

/// GET /api/proposals
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<Proposal>>, ApiError> {
    ctx.require(Resource::Proposals, Permission::View)?;

    if let Some(status) = &query.status {
        validate_choice("status", status, PROPOSAL_STATUSES)?;
    }
    let (limit, offset) = page_params(query.limit, query.offset);

    let proposals = sqlx::query_as::<_, Proposal>(
        "SELECT * FROM proposals
         WHERE ($1::text IS NULL OR status = $1)
         ORDER BY serial DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(&query.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(proposals))
}

/// GET /api/proposals/:id
pub async fn get(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Proposal>, ApiError> {
    ctx.require(Resource::Proposals, Permission::View)?;
    let proposal = fetch_proposal(&ctx, id).await?;
    Ok(ApiResponse::success(proposal))
}

/// POST /api/proposals - allocates the next QT number inside the insert tx
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateProposal>,
) -> Result<ApiResponse<Proposal>, ApiError> {
    ctx.require(Resource::Proposals, Permission::Create)?;

    if payload.client_name.trim().is_empty() {
        return Err(ApiError::bad_request("Client name is required"));
    }
    validate_percent("discount_percent", payload.discount_percent)?;
    validate_percent("tax_percent", payload.tax_percent)?;

    let sub = subtotal(&payload.line_items);
    let total = grand_total(sub, payload.discount_percent, payload.tax_percent);

    let mut tx = ctx.pool.begin().await?;
    let serial = next_serial(&mut tx, SerialTable::Proposals).await?;
    let number = proposal_number(serial);

    let proposal = sqlx::query_as::<_, Proposal>(
        "INSERT INTO proposals
            (number, serial, client_name, client_email, client_address, line_items,
             discount_percent, tax_percent, subtotal, total, valid_until, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING *",
    )
    .bind(&number)
    .bind(serial)
    .bind(payload.client_name.trim())
    .bind(&payload.client_email)
    .bind(&payload.client_address)
    .bind(SqlJson(&payload.line_items))
    .bind(payload.discount_percent)
    .bind(payload.tax_percent)
    .bind(sub)
    .bind(total)
    .bind(payload.valid_until)
    .bind(ctx.auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    ctx.audit()
        .record(AuditAction::Create, Resource::Proposals, Some(proposal.id), None, snapshot(&proposal))
        .await;

    Ok(ApiResponse::created(proposal))
}

/// PUT /api/proposals/:id - merges changes and recomputes totals
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProposal>,
) -> Result<ApiResponse<Proposal>, ApiError> {
    ctx.require(Resource::Proposals, Permission::Edit)?;

    if let Some(status) = &payload.status {
        validate_choice("status", status, PROPOSAL_STATUSES)?;
    }
    if let Some(discount) = payload.discount_percent {
        validate_percent("discount_percent", discount)?;
    }
    if let Some(tax) = payload.tax_percent {
        validate_percent("tax_percent", tax)?;
    }

    let before = fetch_proposal(&ctx, id).await?;

    let line_items = payload.line_items.unwrap_or_else(|| before.line_items.0.clone());
    let discount = payload.discount_percent.unwrap_or(before.discount_percent);
    let tax = payload.tax_percent.unwrap_or(before.tax_percent);
    let sub = subtotal(&line_items);
    let total = grand_total(sub, discount, tax);

    let proposal = sqlx::query_as::<_, Proposal>(
        "UPDATE proposals SET
            client_name = COALESCE($2, client_name),
            client_email = COALESCE($3, client_email),
            client_address = COALESCE($4, client_address),
            line_items = $5,
            discount_percent = $6,
            tax_percent = $7,
            subtotal = $8,
            total = $9,
            status = COALESCE($10, status),
            valid_until = COALESCE($11, valid_until),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&payload.client_name)
    .bind(&payload.client_email)
    .bind(&payload.client_address)
    .bind(SqlJson(&line_items))
    .bind(discount)
    .bind(tax)
    .bind(sub)
    .bind(total)
    .bind(&payload.status)
    .bind(payload.valid_until)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Update, Resource::Proposals, Some(id), snapshot(&before), snapshot(&proposal))
        .await;

    Ok(ApiResponse::success(proposal))
}

/// DELETE /api/proposals/:id
pub async fn delete(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    ctx.require(Resource::Proposals, Permission::Delete)?;

    let before = fetch_proposal(&ctx, id).await?;

    sqlx::query("DELETE FROM proposals WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await?;

    ctx.audit()
        .record(AuditAction::Delete, Resource::Proposals, Some(id), snapshot(&before), None)
        .await;

    Ok(ApiResponse::no_content())
}

/// GET /api/proposals/:id/document - printable quotation for browser print-to-PDF
pub async fn document(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    ctx.require(Resource::Proposals, Permission::View)?;
    let proposal = fetch_proposal(&ctx, id).await?;
    Ok(Html(quotation_html(&proposal)))
}

fn validate_percent(field: &str, value: Decimal) -> Result<(), ApiError> {
    if value < Decimal::ZERO || value > Decimal::from(100) {
        return Err(ApiError::bad_request(format!("{} must be between 0 and 100", field)));
    }
    Ok(())
}

async fn fetch_proposal(ctx: &RequestContext, id: Uuid) -> Result<Proposal, ApiError> {
    sqlx::query_as::<_, Proposal>("SELECT * FROM proposals WHERE id = $1")
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Proposal not found"))
}
