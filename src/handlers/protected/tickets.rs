use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::audit::AuditAction;
use crate::database::models::ticket::{
    Ticket, TicketComment, TicketRoute, TicketStatus, DEFAULT_DEPARTMENT, TICKET_PRIORITIES,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};
use crate::permissions::{Permission, Resource};

use super::{page_params, snapshot, validate_choice};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicket {
    pub subject: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicket {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpsertRoute {
    pub category: String,
    pub department: String,
}

/// GET /api/tickets
pub async fn list(
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<Ticket>>, ApiError> {
    ctx.require(Resource::Tickets, Permission::View)?;

    if let Some(status) = &query.status {
        status
            .parse::<TicketStatus>()
            .map_err(ApiError::bad_request)?;
    }
    let (limit, offset) = page_params(query.limit, query.offset);

    let tickets = sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets
         WHERE ($1::text IS NULL OR status = $1)
           AND ($2::text IS NULL OR category = $2)
         ORDER BY created_at DESC
         LIMIT $3 OFFSET $4",
    )
    .bind(&query.status)
    .bind(&query.category)
    .bind(limit)
    .bind(offset)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(tickets))
}

/// GET /api/tickets/:id
pub async fn get(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Ticket>, ApiError> {
    ctx.require(Resource::Tickets, Permission::View)?;
    let ticket = fetch_ticket(&ctx, id).await?;
    Ok(ApiResponse::success(ticket))
}

/// POST /api/tickets - category routes the ticket to a department
pub async fn create(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateTicket>,
) -> Result<ApiResponse<Ticket>, ApiError> {
    ctx.require(Resource::Tickets, Permission::Create)?;

    if payload.subject.trim().is_empty() {
        return Err(ApiError::bad_request("Ticket subject is required"));
    }
    let priority = payload.priority.unwrap_or_else(|| "normal".to_string());
    validate_choice("priority", &priority, TICKET_PRIORITIES)?;

    let category = payload.category.unwrap_or_else(|| "general".to_string());
    let department = route_department(&ctx, &category).await?;

    let ticket = sqlx::query_as::<_, Ticket>(
        "INSERT INTO tickets (subject, description, category, department, priority, opened_by)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(payload.subject.trim())
    .bind(&payload.description)
    .bind(&category)
    .bind(&department)
    .bind(&priority)
    .bind(ctx.auth.user_id)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Create, Resource::Tickets, Some(ticket.id), None, snapshot(&ticket))
        .await;

    Ok(ApiResponse::created(ticket))
}

/// PUT /api/tickets/:id - a category change re-routes the department
pub async fn update(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicket>,
) -> Result<ApiResponse<Ticket>, ApiError> {
    ctx.require(Resource::Tickets, Permission::Edit)?;

    if let Some(priority) = &payload.priority {
        validate_choice("priority", priority, TICKET_PRIORITIES)?;
    }

    let before = fetch_ticket(&ctx, id).await?;

    let department = match &payload.category {
        Some(category) if *category != before.category => Some(route_department(&ctx, category).await?),
        _ => None,
    };

    let ticket = sqlx::query_as::<_, Ticket>(
        "UPDATE tickets SET
            subject = COALESCE($2, subject),
            description = COALESCE($3, description),
            category = COALESCE($4, category),
            department = COALESCE($5, department),
            priority = COALESCE($6, priority),
            assignee_id = COALESCE($7, assignee_id),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&payload.subject)
    .bind(&payload.description)
    .bind(&payload.category)
    .bind(&department)
    .bind(&payload.priority)
    .bind(payload.assignee_id)
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Update, Resource::Tickets, Some(id), snapshot(&before), snapshot(&ticket))
        .await;

    Ok(ApiResponse::success(ticket))
}

/// PUT /api/tickets/:id/status - validates the workflow transition
pub async fn change_status(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChange>,
) -> Result<ApiResponse<Ticket>, ApiError> {
    ctx.require(Resource::Tickets, Permission::Edit)?;

    let next: TicketStatus = payload.status.parse().map_err(ApiError::bad_request)?;

    let before = fetch_ticket(&ctx, id).await?;
    let current: TicketStatus = before
        .status
        .parse()
        .map_err(|e: String| ApiError::internal_server_error(e))?;

    if !current.can_transition(next) {
        return Err(ApiError::conflict(format!(
            "Cannot transition ticket from {} to {}",
            current, next
        )));
    }

    let ticket = sqlx::query_as::<_, Ticket>(
        "UPDATE tickets SET
            status = $2,
            resolved_at = CASE WHEN $2 = 'resolved' THEN now() ELSE resolved_at END,
            closed_at = CASE WHEN $2 = 'closed' THEN now() ELSE closed_at END,
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(next.as_str())
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(
            AuditAction::StatusChange,
            Resource::Tickets,
            Some(id),
            Some(json!({ "status": current.as_str() })),
            Some(json!({ "status": next.as_str() })),
        )
        .await;

    Ok(ApiResponse::success(ticket))
}

/// GET /api/tickets/:id/comments
pub async fn list_comments(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Vec<TicketComment>>, ApiError> {
    ctx.require(Resource::Tickets, Permission::View)?;

    // 404 on unknown ticket rather than an empty list
    fetch_ticket(&ctx, id).await?;

    let comments = sqlx::query_as::<_, TicketComment>(
        "SELECT * FROM ticket_comments WHERE ticket_id = $1 ORDER BY created_at",
    )
    .bind(id)
    .fetch_all(&ctx.pool)
    .await?;

    Ok(ApiResponse::success(comments))
}

/// POST /api/tickets/:id/comments - closed tickets reject new comments
pub async fn create_comment(
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateComment>,
) -> Result<ApiResponse<TicketComment>, ApiError> {
    ctx.require(Resource::Tickets, Permission::Create)?;

    if payload.body.trim().is_empty() {
        return Err(ApiError::bad_request("Comment body is required"));
    }

    let ticket = fetch_ticket(&ctx, id).await?;
    let status: TicketStatus = ticket
        .status
        .parse()
        .map_err(|e: String| ApiError::internal_server_error(e))?;
    if status.is_closed() {
        return Err(ApiError::conflict("Cannot comment on a closed ticket"));
    }

    let comment = sqlx::query_as::<_, TicketComment>(
        "INSERT INTO ticket_comments (ticket_id, author_id, body)
         VALUES ($1, $2, $3)
         RETURNING *",
    )
    .bind(id)
    .bind(ctx.auth.user_id)
    .bind(payload.body.trim())
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(AuditAction::Create, Resource::Tickets, Some(id), None, snapshot(&comment))
        .await;

    Ok(ApiResponse::created(comment))
}

/// GET /api/tickets/routes - the category -> department routing table
pub async fn list_routes(
    Extension(ctx): Extension<RequestContext>,
) -> Result<ApiResponse<Vec<TicketRoute>>, ApiError> {
    ctx.require(Resource::Tickets, Permission::View)?;

    let routes = sqlx::query_as::<_, TicketRoute>("SELECT * FROM ticket_routes ORDER BY category")
        .fetch_all(&ctx.pool)
        .await?;

    Ok(ApiResponse::success(routes))
}

/// PUT /api/tickets/routes - upsert one routing row
pub async fn upsert_route(
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<UpsertRoute>,
) -> Result<ApiResponse<TicketRoute>, ApiError> {
    ctx.require(Resource::Tickets, Permission::Edit)?;

    if payload.category.trim().is_empty() || payload.department.trim().is_empty() {
        return Err(ApiError::bad_request("Category and department are required"));
    }

    let before: Option<TicketRoute> =
        sqlx::query_as("SELECT * FROM ticket_routes WHERE category = $1")
            .bind(payload.category.trim())
            .fetch_optional(&ctx.pool)
            .await?;

    let route = sqlx::query_as::<_, TicketRoute>(
        "INSERT INTO ticket_routes (category, department)
         VALUES ($1, $2)
         ON CONFLICT (category) DO UPDATE SET department = EXCLUDED.department
         RETURNING *",
    )
    .bind(payload.category.trim())
    .bind(payload.department.trim())
    .fetch_one(&ctx.pool)
    .await?;

    ctx.audit()
        .record(
            AuditAction::Update,
            Resource::Tickets,
            Some(route.id),
            before.as_ref().and_then(|r| snapshot(r)),
            snapshot(&route),
        )
        .await;

    Ok(ApiResponse::success(route))
}

/// Department for a category; unrouted categories land in the default
async fn route_department(ctx: &RequestContext, category: &str) -> Result<String, ApiError> {
    let department: Option<String> =
        sqlx::query_scalar("SELECT department FROM ticket_routes WHERE category = $1")
            .bind(category)
            .fetch_optional(&ctx.pool)
            .await?;
    Ok(department.unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()))
}

async fn fetch_ticket(ctx: &RequestContext, id: Uuid) -> Result<Ticket, ApiError> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(&ctx.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))
}
