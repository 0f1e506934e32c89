use clap::Subcommand;

use crate::services::TenantService;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "Provision a new tenant (database + schema + registry row)")]
    Create {
        #[arg(help = "Tenant name (letters, numbers, hyphens, underscores)")]
        name: String,
    },

    #[command(about = "List registered tenants")]
    List,
}

pub async fn run(cmd: TenantCommands) -> anyhow::Result<()> {
    let service = TenantService::new().await?;

    match cmd {
        TenantCommands::Create { name } => {
            let tenant = service.create_tenant(&name).await?;
            println!("Created tenant '{}' -> database '{}'", tenant.name, tenant.database);
        }
        TenantCommands::List => {
            let tenants = service.list_tenants().await?;
            if tenants.is_empty() {
                println!("No tenants registered");
            }
            for tenant in tenants {
                let state = if tenant.is_active { "active" } else { "inactive" };
                println!("{}\t{}\t{}", tenant.name, tenant.database, state);
            }
        }
    }

    Ok(())
}
