use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;

use crate::audit::AuditLogger;
use crate::database::manager::DatabaseManager;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::permissions::{resolve, EffectivePermissions, Permission, PermissionOverride, Resource};

use super::auth::AuthUser;

/// Per-request context: authenticated identity, effective permissions,
/// tenant pool, and client info for the audit trail. Inserted by
/// [`resolve_request_context`] after the JWT middleware has run.
#[derive(Clone)]
pub struct RequestContext {
    pub auth: AuthUser,
    pub permissions: EffectivePermissions,
    pub pool: PgPool,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Route guard: 403 unless the effective set allows the pair
    pub fn require(&self, resource: Resource, permission: Permission) -> Result<(), ApiError> {
        if self.permissions.can(resource, permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Missing permission: {}:{}",
                resource, permission
            )))
        }
    }

    /// Audit writer bound to this request's actor and client info
    pub fn audit(&self) -> AuditLogger {
        AuditLogger::new(
            self.pool.clone(),
            self.auth.user_id,
            self.auth.user.clone(),
            self.ip.clone(),
            self.user_agent.clone(),
        )
    }
}

/// Load the user's row, role, grants, and overrides from the tenant database
/// and compute the effective permission set for this request.
pub async fn resolve_request_context(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Missing authentication context"))?;

    let pool = DatabaseManager::tenant_pool(&auth.database).await?;

    // Token may outlive the user row; treat a vanished or deactivated user
    // as unauthenticated
    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

    if !user.is_active {
        return Err(ApiError::unauthorized("User account is deactivated"));
    }

    let permissions = load_permissions(&pool, &user).await?;

    let ip = client_ip(&headers);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    request.extensions_mut().insert(RequestContext {
        auth,
        permissions,
        pool,
        ip,
        user_agent,
    });

    Ok(next.run(request).await)
}

/// Merge hierarchy defaults, role grants, and user overrides for one user
pub async fn load_permissions(pool: &PgPool, user: &User) -> Result<EffectivePermissions, ApiError> {
    let role_level: Option<i32> = match user.role_id {
        Some(role_id) => {
            sqlx::query_scalar("SELECT hierarchy_level FROM roles WHERE id = $1")
                .bind(role_id)
                .fetch_optional(pool)
                .await?
        }
        None => None,
    };

    let role_rows: Vec<(String, String)> = match user.role_id {
        Some(role_id) => {
            sqlx::query_as("SELECT resource, permission FROM role_permissions WHERE role_id = $1")
                .bind(role_id)
                .fetch_all(pool)
                .await?
        }
        None => Vec::new(),
    };

    // Rows written before a resource/verb was retired simply stop matching
    let role_grants: Vec<(Resource, Permission)> = role_rows
        .iter()
        .filter_map(|(resource, permission)| {
            Some((resource.parse().ok()?, permission.parse().ok()?))
        })
        .collect();

    let override_rows: Vec<(String, String, bool)> =
        sqlx::query_as("SELECT resource, permission, granted FROM user_permissions WHERE user_id = $1")
            .bind(user.id)
            .fetch_all(pool)
            .await?;

    let overrides: Vec<PermissionOverride> = override_rows
        .iter()
        .filter_map(|(resource, permission, granted)| {
            Some(PermissionOverride {
                resource: resource.parse().ok()?,
                permission: permission.parse().ok()?,
                granted: *granted,
            })
        })
        .collect();

    Ok(resolve(role_level, &role_grants, &overrides))
}

/// First address in X-Forwarded-For, if present
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_ip_takes_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), Some("203.0.113.9".to_string()));
    }

    #[test]
    fn client_ip_absent_without_header() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
