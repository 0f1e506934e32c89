use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::migrate;
use crate::database::models::tenant::Tenant;

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("Tenant already exists: {0}")]
    AlreadyExists(String),
    #[error("Tenant not found: {0}")]
    NotFound(String),
    #[error("Invalid tenant name: {0}")]
    InvalidName(String),
}

pub struct TenantService {
    main_pool: PgPool,
}

impl TenantService {
    pub async fn new() -> Result<Self, TenantError> {
        let main_pool = DatabaseManager::main_pool().await?;
        Ok(Self { main_pool })
    }

    /// Provision a new tenant: create its database, run migrations, register it
    pub async fn create_tenant(&self, tenant_name: &str) -> Result<Tenant, TenantError> {
        Self::validate_tenant_name(tenant_name)?;

        let tenant_db = Self::hash_tenant_name(tenant_name);

        if self.tenant_exists(tenant_name).await? {
            return Err(TenantError::AlreadyExists(tenant_name.to_string()));
        }

        DatabaseManager::create_database(&tenant_db).await?;

        let pool = DatabaseManager::tenant_pool(&tenant_db).await?;
        migrate::migrate_tenant(&pool).await?;

        let tenant = self.register_tenant(tenant_name, &tenant_db).await?;
        Ok(tenant)
    }

    /// Look up an active tenant by its public name (login path)
    pub async fn find_active(&self, tenant_name: &str) -> Result<Tenant, TenantError> {
        sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE name = $1 AND is_active = TRUE",
        )
        .bind(tenant_name)
        .fetch_optional(&self.main_pool)
        .await?
        .ok_or_else(|| TenantError::NotFound(tenant_name.to_string()))
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, TenantError> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY name")
            .fetch_all(&self.main_pool)
            .await?;
        Ok(tenants)
    }

    /// Hash tenant name to consistent database name
    fn hash_tenant_name(name: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        let hash = hasher.finalize();
        let hash_str = format!("{:x}", hash);

        // Use first 16 characters of hash for reasonable DB name length
        format!("tenant_{}", &hash_str[..16])
    }

    /// Validate tenant name follows rules
    fn validate_tenant_name(name: &str) -> Result<(), TenantError> {
        if name.len() < 2 {
            return Err(TenantError::InvalidName(
                "Tenant name must be at least 2 characters".to_string(),
            ));
        }

        if name.len() > 100 {
            return Err(TenantError::InvalidName(
                "Tenant name must be less than 100 characters".to_string(),
            ));
        }

        // Only allow alphanumeric, hyphens, and underscores
        if !name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            return Err(TenantError::InvalidName(
                "Tenant name can only contain letters, numbers, hyphens, and underscores".to_string(),
            ));
        }

        Ok(())
    }

    async fn tenant_exists(&self, tenant_name: &str) -> Result<bool, TenantError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tenants WHERE name = $1")
            .bind(tenant_name)
            .fetch_one(&self.main_pool)
            .await?;
        Ok(count.0 > 0)
    }

    async fn register_tenant(&self, tenant_name: &str, tenant_db: &str) -> Result<Tenant, TenantError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name, database) VALUES ($1, $2) RETURNING *",
        )
        .bind(tenant_name)
        .bind(tenant_db)
        .fetch_one(&self.main_pool)
        .await?;
        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_names_are_stable_and_valid() {
        let a = TenantService::hash_tenant_name("acme");
        let b = TenantService::hash_tenant_name("acme");
        assert_eq!(a, b);
        assert!(a.starts_with("tenant_"));
        assert_eq!(a.len(), "tenant_".len() + 16);
    }

    #[test]
    fn different_tenants_hash_differently() {
        assert_ne!(
            TenantService::hash_tenant_name("acme"),
            TenantService::hash_tenant_name("globex")
        );
    }

    #[test]
    fn rejects_bad_tenant_names() {
        assert!(TenantService::validate_tenant_name("a").is_err());
        assert!(TenantService::validate_tenant_name("with space").is_err());
        assert!(TenantService::validate_tenant_name("drop;table").is_err());
        assert!(TenantService::validate_tenant_name("acme-corp_1").is_ok());
    }
}
