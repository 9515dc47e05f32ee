use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxmeter::{config::Config, create_router, open_pool, AppState, PoolSettings, Store};

#[derive(Debug, Parser)]
#[command(name = "voxmeter", about = "Voice-agent usage metering and admin service")]
struct Cli {
    /// Config file path (extension resolved by the config loader)
    #[arg(long)]
    config: Option<String>,

    /// Override the SQLite database path
    #[arg(long)]
    db: Option<String>,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        cfg.database.path = db;
    }
    if let Some(bind) = cli.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = cli.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("database: {}", cfg.database.path);

    let pool = open_pool(
        &cfg.database.path,
        PoolSettings {
            max_size: cfg.database.pool_size,
            busy_timeout_ms: cfg.database.busy_timeout_ms,
        },
    )
    .context("failed to open database")?;

    let store = Store::new(pool);
    store.init_schema().context("failed to initialize schema")?;

    let state = AppState::new(store);
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("admin API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
