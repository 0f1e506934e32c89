//! Side-channel audit trail.
//!
//! Every mutating handler records an entry with before/after snapshots of the
//! touched row. Audit writes must never fail the request they describe:
//! failures are logged and swallowed.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use crate::permissions::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    PermissionChange,
    StatusChange,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::PermissionChange => "permission_change",
            AuditAction::StatusChange => "status_change",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub actor_id: Uuid,
    pub actor_name: String,
    pub action: AuditAction,
    pub resource: Resource,
    pub record_id: Option<Uuid>,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Destination for audit entries. The Postgres sink is the production one;
/// tests substitute an in-memory capture.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn write(&self, entry: &AuditEntry) -> Result<(), sqlx::Error>;
}

pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn write(&self, entry: &AuditEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO audit_logs
             (actor_id, actor_name, action, resource, record_id, before_data, after_data, ip, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(entry.actor_id)
        .bind(&entry.actor_name)
        .bind(entry.action.as_str())
        .bind(entry.resource.as_str())
        .bind(entry.record_id)
        .bind(&entry.before)
        .bind(&entry.after)
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Per-request audit writer carrying the actor identity and client info
pub struct AuditLogger {
    sink: Box<dyn AuditSink>,
    actor_id: Uuid,
    actor_name: String,
    ip: Option<String>,
    user_agent: Option<String>,
}

impl AuditLogger {
    pub fn new(
        pool: PgPool,
        actor_id: Uuid,
        actor_name: String,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            sink: Box::new(PgAuditSink::new(pool)),
            actor_id,
            actor_name,
            ip,
            user_agent,
        }
    }

    #[cfg(test)]
    fn with_sink(sink: Box<dyn AuditSink>, actor_id: Uuid, actor_name: String) -> Self {
        Self { sink, actor_id, actor_name, ip: None, user_agent: None }
    }

    /// Record one mutating action. Failures are logged, never propagated.
    pub async fn record(
        &self,
        action: AuditAction,
        resource: Resource,
        record_id: Option<Uuid>,
        before: Option<Value>,
        after: Option<Value>,
    ) {
        let entry = AuditEntry {
            actor_id: self.actor_id,
            actor_name: self.actor_name.clone(),
            action,
            resource,
            record_id,
            before,
            after,
            ip: self.ip.clone(),
            user_agent: self.user_agent.clone(),
        };

        if let Err(e) = self.sink.write(&entry).await {
            tracing::warn!(
                action = %action,
                resource = %resource,
                "audit write failed: {}",
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Resource;
    use serde_json::json;
    use std::sync::Mutex;

    struct CaptureSink {
        entries: std::sync::Arc<Mutex<Vec<AuditEntry>>>,
    }

    #[async_trait]
    impl AuditSink for CaptureSink {
        async fn write(&self, entry: &AuditEntry) -> Result<(), sqlx::Error> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn write(&self, _entry: &AuditEntry) -> Result<(), sqlx::Error> {
            Err(sqlx::Error::PoolClosed)
        }
    }

    #[tokio::test]
    async fn records_entry_with_actor_and_snapshots() {
        let captured = std::sync::Arc::new(Mutex::new(Vec::new()));
        let actor = Uuid::new_v4();
        let record = Uuid::new_v4();
        let logger = AuditLogger::with_sink(
            Box::new(CaptureSink { entries: captured.clone() }),
            actor,
            "admin".into(),
        );

        logger
            .record(
                AuditAction::Update,
                Resource::Leads,
                Some(record),
                Some(json!({"status": "new"})),
                Some(json!({"status": "contacted"})),
            )
            .await;

        let entries = captured.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor_id, actor);
        assert_eq!(entries[0].actor_name, "admin");
        assert_eq!(entries[0].action, AuditAction::Update);
        assert_eq!(entries[0].record_id, Some(record));
        assert_eq!(entries[0].before, Some(json!({"status": "new"})));
    }

    #[tokio::test]
    async fn sink_failure_does_not_panic_or_error() {
        let logger = AuditLogger::with_sink(Box::new(FailingSink), Uuid::new_v4(), "admin".into());
        logger
            .record(AuditAction::Delete, Resource::Tickets, None, None, None)
            .await;
    }
}
