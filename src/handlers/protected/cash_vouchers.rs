use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Extension, Json};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::database::models::cash_voucher::{CashVoucher, VOUCHER_KINDS};
use crate::documents::html::voucher_html;
use crate::documents::numbering::{next_serial, voucher_number, SerialTable};
use crate::documents::pdf::voucher_pdf;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};
use crate::permissions::{Permission, Resource};

use super::{page_params, snapshot, validate_choice};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub kind: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVoucher {
    pub payee: String,
    pub amount: Decimal,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub voucher_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVoucher {
    pub payee: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub voucher_date: Option<NaiveDate>,
}

/// GET /api/cash-vouchers
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<CashVoucher>>, ApiError> {
    ctx.require(Resource::CashVouchers, Permission::View)?;

    if let Some(kind) = &query.kind {
        validate_choice("kind", kind, VOUCHER_KINDS)?;
    }
    let (limit, offset) = page_params(query.limit, query.offset);

    let vouchers = sqlx::query_as::<_, CashVoucher>(
        "SELECT * FROM cash_vouchers
         WHERE ($1::text IS NULL OR kind = $1)
         ORDER BY serial DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(&query.kind)
    .bind(limit)
    .bind(offset)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(vouchers))
}

/// GET /api/cash-vouchers/:id
pub async fn get(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CashVoucher>, ApiError> {
    ctx.require(Resource::CashVouchers, Permission::View)?;
    let voucher = fetch_voucher(&ctx, id).await?;
    Ok(ApiResponse::success(voucher))
}

/// POST /api/cash-vouchers - allocates the next CV number inside the insert tx
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateVoucher>,
) -> Result<ApiResponse<CashVoucher>, ApiError> {
    ctx.require(Resource::CashVouchers, Permission::Create)?;

    if payload.payee.trim().is_empty() {
        return Err(ApiError::bad_request("Payee is required"));
    }
    if payload.amount <= Decimal::ZERO {
        return Err(ApiError::bad_request("Amount must be positive"));
    }
    let kind = payload.kind.unwrap_or_else(|| "payment".to_string());
    validate_choice("kind", &kind, VOUCHER_KINDS)?;

    let voucher_date = payload
        .voucher_date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let mut tx = ctx.pool.begin().await?;
    let serial = next_serial(&mut tx, SerialTable::CashVouchers).await?;
    let number = voucher_number(serial);

    let voucher = sqlx::query_as::<_, CashVoucher>(
        "INSERT INTO cash_vouchers (number, serial, payee, amount, kind, description, voucher_date, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(&number)
    .bind(serial)
    .bind(payload.payee.trim())
    .bind(payload.amount)
    .bind(&kind)
    .bind(&payload.description)
    .bind(voucher_date)
    .bind(ctx.auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    ctx.audit()
        .record(AuditAction::Create, Resource::CashVouchers, Some(voucher.id), None, snapshot(&voucher))
        .await;

    Ok(ApiResponse::created(voucher))
}

/// PUT /api/cash-vouchers/:id - the generated number is immutable
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVoucher>,
) -> Result<ApiResponse<CashVoucher>, ApiError> {
    ctx.require(Resource::CashVouchers, Permission::Edit)?;

    if let Some(kind) = &payload.kind {
        validate_choice("kind", kind, VOUCHER_KINDS)?;
    }
    if let Some(amount) = payload.amount {
        if amount <= Decimal::ZERO {
            return Err(ApiError::bad_request("Amount must be positive"));
        }
    }

    let before = fetch_voucher(&ctx, id).await?;

    let voucher = sqlx::query_as::<_, CashVoucher>(
        "UPDATE cash_vouchers SET
            payee = COALESCE($2, payee),
            amount = COALESCE($3, amount),
            kind = COALESCE($4, kind),
            description = COALESCE($5, description),
            voucher_date = COALESCE($6, voucher_date),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&payload.payee)
    .bind(payload.amount)
    .bind(&payload.kind)
    .bind(&payload.description)
    .bind(payload.voucher_date)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Update, Resource::CashVouchers, Some(id), snapshot(&before), snapshot(&voucher))
        .await;

    Ok(ApiResponse::success(voucher))
}

/// DELETE /api/cash-vouchers/:id
pub async fn delete(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    ctx.require(Resource::CashVouchers, Permission::Delete)?;

    let before = fetch_voucher(&ctx, id).await?;

    sqlx::query("DELETE FROM cash_vouchers WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await?;

    ctx.audit()
        .record(AuditAction::Delete, Resource::CashVouchers, Some(id), snapshot(&before), None)
        .await;

    Ok(ApiResponse::no_content())
}

/// GET /api/cash-vouchers/:id/document - printable HTML voucher
pub async fn document(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    ctx.require(Resource::CashVouchers, Permission::View)?;
    let voucher = fetch_voucher(&ctx, id).await?;
    Ok(Html(voucher_html(&voucher)))
}

/// GET /api/cash-vouchers/:id/pdf - binary PDF rendition
pub async fn pdf(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    ctx.require(Resource::CashVouchers, Permission::View)?;
    let voucher = fetch_voucher(&ctx, id).await?;

    let bytes = voucher_pdf(&voucher).map_err(|e| {
        tracing::error!("PDF rendering failed for voucher {}: {}", voucher.number, e);
        ApiError::internal_server_error("Failed to render PDF")
    })?;

    let disposition = format!("inline; filename=\"{}.pdf\"", voucher.number);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn fetch_voucher(ctx: &RequestContext, id: Uuid) -> Result<CashVoucher, ApiError> {
    sqlx::query_as::<_, CashVoucher>("SELECT * FROM cash_vouchers WHERE id = $1")
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Cash voucher not found"))
}
