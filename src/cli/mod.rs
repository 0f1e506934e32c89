pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "opsdesk")]
#[command(about = "OpsDesk CLI - local administration for the business management API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to OPSDESK_PORT or 3000)")]
        port: Option<u16>,
    },

    #[command(about = "Initialize or upgrade the system registry database")]
    Init,

    #[command(about = "Tenant provisioning and inspection")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "Administrative user management inside a tenant")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port } => crate::server::serve(port).await,
        Commands::Init => commands::init::run().await,
        Commands::Tenant { cmd } => commands::tenant::run(cmd).await,
        Commands::Admin { cmd } => commands::admin::run(cmd).await,
    }
}
