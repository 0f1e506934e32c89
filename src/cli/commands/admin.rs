use anyhow::Context;
use clap::Subcommand;

use crate::auth::hash_password;
use crate::database::manager::DatabaseManager;
use crate::services::TenantService;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an administrator user inside a tenant")]
    Create {
        #[arg(long, help = "Tenant name")]
        tenant: String,
        #[arg(long, help = "Username for the new administrator")]
        username: String,
        #[arg(long, help = "Login password (minimum 8 characters)")]
        password: String,
        #[arg(long, help = "Display name; defaults to the username")]
        display_name: Option<String>,
        #[arg(long, help = "Contact email")]
        email: Option<String>,
    },
}

pub async fn run(cmd: AdminCommands) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Create {
            tenant,
            username,
            password,
            display_name,
            email,
        } => {
            anyhow::ensure!(password.len() >= 8, "password must be at least 8 characters");

            let service = TenantService::new().await?;
            let tenant = service
                .find_active(&tenant)
                .await
                .context("tenant lookup failed")?;

            let pool = DatabaseManager::tenant_pool(&tenant.database).await?;

            let role_id: uuid::Uuid =
                sqlx::query_scalar("SELECT id FROM roles WHERE name = 'administrator'")
                    .fetch_one(&pool)
                    .await
                    .context("administrator role missing - run `opsdesk init` first")?;

            let password_hash =
                hash_password(&password).map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;

            let username = username.trim().to_lowercase();
            let display_name = display_name.unwrap_or_else(|| username.clone());

            sqlx::query(
                "INSERT INTO users (username, display_name, email, password_hash, role_id)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&username)
            .bind(&display_name)
            .bind(&email)
            .bind(&password_hash)
            .bind(role_id)
            .execute(&pool)
            .await
            .context("user insert failed (username taken?)")?;

            println!("Created administrator '{}' in tenant '{}'", username, tenant.name);
        }
    }

    Ok(())
}
