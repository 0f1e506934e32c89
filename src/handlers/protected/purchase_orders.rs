use axum::extract::{Path, Query};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::database::models::line_item::{subtotal, LineItem};
use crate::database::models::purchase_order::{PurchaseOrder, PURCHASE_ORDER_STATUSES};
use crate::documents::numbering::{next_serial, purchase_order_number, SerialTable};
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
pub struct CreatePurchaseOrder {
    pub supplier_name: String,
    pub supplier_address: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub expected_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseOrder {
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
    pub line_items: Option<Vec<LineItem>>,
    pub status: Option<String>,
    pub expected_date: Option<NaiveDate>,
}

/// GET /api/purchase-orders
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<PurchaseOrder>>, ApiError> {
    ctx.require(Resource::PurchaseOrders, Permission::View)?;

    if let Some(status) = &query.status {
        validate_choice("status", status, PURCHASE_ORDER_STATUSES)?;
    }
    let (limit, offset) = page_params(query.limit, query.offset);

    let orders = sqlx::query_as::<_, PurchaseOrder>(
        "SELECT * FROM purchase_orders
         WHERE ($1::text IS NULL OR status = $1)
         ORDER BY serial DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(&query.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(orders))
}

/// GET /api/purchase-orders/:id
pub async fn get(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<PurchaseOrder>, ApiError> {
    ctx.require(Resource::PurchaseOrders, Permission::View)?;
    let order = fetch_order(&ctx, id).await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/purchase-orders - allocates the next PO number inside the insert tx
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreatePurchaseOrder>,
) -> Result<ApiResponse<PurchaseOrder>, ApiError> {
    ctx.require(Resource::PurchaseOrders, Permission::Create)?;

    if payload.supplier_name.trim().is_empty() {
        return Err(ApiError::bad_request("Supplier name is required"));
    }

    let total = subtotal(&payload.line_items);

    let mut tx = ctx.pool.begin().await?;
    let serial = next_serial(&mut tx, SerialTable::PurchaseOrders).await?;
    let number = purchase_order_number(serial);

    let order = sqlx::query_as::<_, PurchaseOrder>(
        "INSERT INTO purchase_orders
            (number, serial, supplier_name, supplier_address, line_items, total, expected_date, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(&number)
    .bind(serial)
    .bind(payload.supplier_name.trim())
    .bind(&payload.supplier_address)
    .bind(SqlJson(&payload.line_items))
    .bind(total)
    .bind(payload.expected_date)
    .bind(ctx.auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    ctx.audit()
        .record(AuditAction::Create, Resource::PurchaseOrders, Some(order.id), None, snapshot(&order))
        .await;

    Ok(ApiResponse::created(order))
}

/// PUT /api/purchase-orders/:id - merges changes and recomputes the total
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseOrder>,
) -> Result<ApiResponse<PurchaseOrder>, ApiError> {
    ctx.require(Resource::PurchaseOrders, Permission::Edit)?;

    if let Some(status) = &payload.status {
        validate_choice("status", status, PURCHASE_ORDER_STATUSES)?;
    }

    let before = fetch_order(&ctx, id).await?;

    let line_items = payload.line_items.unwrap_or_else(|| before.line_items.0.clone());
    let total = subtotal(&line_items);

    let order = sqlx::query_as::<_, PurchaseOrder>(
        "UPDATE purchase_orders SET
            supplier_name = COALESCE($2, supplier_name),
            supplier_address = COALESCE($3, supplier_address),
            line_items = $4,
            total = $5,
            status = COALESCE($6, status),
            expected_date = COALESCE($7, expected_date),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&payload.supplier_name)
    .bind(&payload.supplier_address)
    .bind(SqlJson(&line_items))
    .bind(total)
    .bind(&payload.status)
    .bind(payload.expected_date)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Update, Resource::PurchaseOrders, Some(id), snapshot(&before), snapshot(&order))
        .await;

    Ok(ApiResponse::success(order))
}

/// DELETE /api/purchase-orders/:id
pub async fn delete(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    ctx.require(Resource::PurchaseOrders, Permission::Delete)?;

    let before = fetch_order(&ctx, id).await?;

    sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await?;

    ctx.audit()
        .record(AuditAction::Delete, Resource::PurchaseOrders, Some(id), snapshot(&before), None)
        .await;

    Ok(ApiResponse::no_content())
}

async fn fetch_order(ctx: &RequestContext, id: Uuid) -> Result<PurchaseOrder, ApiError> {
    sqlx::query_as::<_, PurchaseOrder>("SELECT * FROM purchase_orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Purchase order not found"))
}
