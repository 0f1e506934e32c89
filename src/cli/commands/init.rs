use crate::database::manager::DatabaseManager;
use crate::database::migrate;

/// `opsdesk init` - create/upgrade the system registry schema, then bring
/// every registered tenant database up to date.
pub async fn run() -> anyhow::Result<()> {
    let main_pool = DatabaseManager::main_pool().await?;
    migrate::migrate_system(&main_pool).await?;
    println!("System database initialized");

    let tenants: Vec<(String, String)> =
        sqlx::query_as("SELECT name, database FROM tenants WHERE is_active = TRUE")
            .fetch_all(&main_pool)
            .await?;

    for (name, database) in tenants {
        let pool = DatabaseManager::tenant_pool(&database).await?;
        migrate::migrate_tenant(&pool).await?;
        println!("Tenant '{}' migrated", name);
    }

    Ok(())
}
