#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opsdesk_api=info,tower_http=info".into()),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = opsdesk_api::config::config();
    tracing::info!("Starting OpsDesk API in {:?} mode", config.environment);

    if let Err(e) = opsdesk_api::server::serve(None).await {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}
