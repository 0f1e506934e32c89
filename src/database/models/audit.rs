use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only audit trail entry; before/after hold full-row JSON snapshots
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: i64,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub action: String,
    pub resource: String,
    pub record_id: Option<Uuid>,
    pub before_data: Option<Value>,
    pub after_data: Option<Value>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
