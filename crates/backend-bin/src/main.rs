use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use opsgate_backend_lib::{
    config::Settings,
    db::Database,
    principal::SqlitePrincipalStore,
    router,
    AppState,
};

/// Opsgate admin backend
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Pool lifecycle: created here, disposed after the server stops
    let db = Database::connect(&settings).await?;
    db.migrate().await?;

    let state = Arc::new(AppState::new(db, SqlitePrincipalStore, settings));
    let app = router::create_router(state.clone());

    let bind_addr = state.settings.bind_addr;
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {bind_addr}");

    axum::serve(listener, app).await?;

    state.db.close().await;
    Ok(())
}
