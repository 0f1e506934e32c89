use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::{auth::jwt_auth_middleware, context::resolve_request_context};

pub fn app() -> Router {
    let protected_api = Router::new()
        .merge(auth_routes())
        .merge(leads_routes())
        .merge(proposals_routes())
        .merge(projects_routes())
        .merge(purchase_orders_routes())
        .merge(cash_vouchers_routes())
        .merge(tickets_routes())
        .merge(holidays_routes())
        .merge(attendance_routes())
        .merge(users_routes())
        .merge(roles_routes())
        .merge(audit_routes())
        // Layers run top-down per request: JWT first, then context resolution
        .route_layer(from_fn(resolve_request_context))
        .route_layer(from_fn(jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(public::auth::login))
        // Protected API
        .merge(protected_api)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/permissions", get(auth::permissions))
}

fn leads_routes() -> Router {
    use protected::leads;

    Router::new()
        .route("/api/leads", get(leads::list).post(leads::create))
        .route(
            "/api/leads/:id",
            get(leads::get).put(leads::update).delete(leads::delete),
        )
}

fn proposals_routes() -> Router {
    use protected::proposals;

    Router::new()
        .route("/api/proposals", get(proposals::list).post(proposals::create))
        .route(
            "/api/proposals/:id",
            get(proposals::get)
                .put(proposals::update)
                .delete(proposals::delete),
        )
        .route("/api/proposals/:id/document", get(proposals::document))
}

fn projects_routes() -> Router {
    use protected::projects;

    Router::new()
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/:id",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
}

fn purchase_orders_routes() -> Router {
    use protected::purchase_orders;

    Router::new()
        .route(
            "/api/purchase-orders",
            get(purchase_orders::list).post(purchase_orders::create),
        )
        .route(
            "/api/purchase-orders/:id",
            get(purchase_orders::get)
                .put(purchase_orders::update)
                .delete(purchase_orders::delete),
        )
}

fn cash_vouchers_routes() -> Router {
    use protected::cash_vouchers;

    Router::new()
        .route(
            "/api/cash-vouchers",
            get(cash_vouchers::list).post(cash_vouchers::create),
        )
        .route(
            "/api/cash-vouchers/:id",
            get(cash_vouchers::get)
                .put(cash_vouchers::update)
                .delete(cash_vouchers::delete),
        )
        .route("/api/cash-vouchers/:id/document", get(cash_vouchers::document))
        .route("/api/cash-vouchers/:id/pdf", get(cash_vouchers::pdf))
}

fn tickets_routes() -> Router {
    use protected::tickets;

    Router::new()
        .route("/api/tickets", get(tickets::list).post(tickets::create))
        .route(
            "/api/tickets/routes",
            get(tickets::list_routes).put(tickets::upsert_route),
        )
        .route("/api/tickets/:id", get(tickets::get).put(tickets::update))
        .route("/api/tickets/:id/status", put(tickets::change_status))
        .route(
            "/api/tickets/:id/comments",
            get(tickets::list_comments).post(tickets::create_comment),
        )
}

fn holidays_routes() -> Router {
    use protected::holidays;

    Router::new()
        .route("/api/holidays", get(holidays::list).post(holidays::create))
        .route(
            "/api/holidays/:id",
            put(holidays::update).delete(holidays::delete),
        )
}

fn attendance_routes() -> Router {
    use protected::attendance;

    Router::new()
        .route("/api/attendance", get(attendance::list))
        .route("/api/attendance/check-in", post(attendance::check_in))
        .route("/api/attendance/check-out", post(attendance::check_out))
}

fn users_routes() -> Router {
    use protected::users;

    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route(
            "/api/users/:id",
            get(users::get).put(users::update).delete(users::deactivate),
        )
        .route(
            "/api/users/:id/permissions",
            get(users::list_overrides).put(users::replace_overrides),
        )
}

fn roles_routes() -> Router {
    use protected::roles;

    Router::new()
        .route("/api/roles", get(roles::list).post(roles::create))
        .route(
            "/api/roles/:id",
            get(roles::get).put(roles::update).delete(roles::delete),
        )
}

fn audit_routes() -> Router {
    use protected::audit;

    Router::new().route("/api/audit", get(audit::list))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "OpsDesk API",
            "version": version,
            "description": "Multi-tenant business management API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "login": "/auth/login (public - token acquisition)",
                "auth": "/api/auth/* (protected)",
                "leads": "/api/leads[/:id] (protected)",
                "proposals": "/api/proposals[/:id[/document]] (protected)",
                "projects": "/api/projects[/:id] (protected)",
                "purchase_orders": "/api/purchase-orders[/:id] (protected)",
                "cash_vouchers": "/api/cash-vouchers[/:id[/document|/pdf]] (protected)",
                "tickets": "/api/tickets[/:id[/status|/comments]], /api/tickets/routes (protected)",
                "holidays": "/api/holidays[/:id] (protected)",
                "attendance": "/api/attendance[/check-in|/check-out] (protected)",
                "users": "/api/users[/:id[/permissions]] (protected)",
                "roles": "/api/roles[/:id] (protected)",
                "audit": "/api/audit (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

/// Bind and serve until the process is stopped
pub async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let port = port
        .or_else(|| {
            std::env::var("OPSDESK_PORT")
                .ok()
                .or_else(|| std::env::var("PORT").ok())
                .and_then(|s| s.parse::<u16>().ok())
        })
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("OpsDesk API listening on http://{}", bind_addr);

    axum::serve(listener, app()).await?;
    Ok(())
}
