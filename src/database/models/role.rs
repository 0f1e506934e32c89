use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub hierarchy_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One explicit grant attached to a role
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RolePermissionRow {
    pub id: Uuid,
    pub role_id: Uuid,
    pub resource: String,
    pub permission: String,
}

/// One per-user override: granted=true adds, granted=false revokes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPermissionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource: String,
    pub permission: String,
    pub granted: bool,
}
