use std::net::SocketAddr;

use talentpool_backend::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    repositories::{memory::MemoryStore, Repositories},
    routes, AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    init_config()?;
    let config = get_config()?;

    let repositories = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.database_max_connections).await?;
            run_migrations(&pool).await?;
            info!("Connected to PostgreSQL and applied migrations");
            Repositories::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; using the in-memory store, data will not survive a restart");
            Repositories::in_memory(MemoryStore::new())
        }
    };

    tokio::fs::create_dir_all(&config.uploads_dir).await?;

    let app = routes::app_router(AppState::new(config, repositories));

    let addr: SocketAddr = config.server_address.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("TalentPool API listening on {}", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
