//! `wardend` — the Warden access-control server binary.
//!
//! Usage:
//!   wardend -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/warden/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use warden_core::Module;

use config::ServerConfig;

/// Warden access-control server.
#[derive(Parser, Debug)]
#[command(name = "wardend", about = "Warden access-control server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    server_config.verify()?;

    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let sql: Arc<dyn warden_sql::SqlStore> = Arc::new(
        warden_sql::SqliteStore::open(&data_dir.join("warden.db"))
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    let access_config = access::service::AccessConfig {
        jwt_secret: server_config.jwt.secret.clone(),
        token_ttl: server_config.jwt.expire_secs,
    };
    let access_module = access::AccessModule::new(Arc::clone(&sql), access_config)
        .map_err(|e| anyhow::anyhow!("failed to initialize access module: {}", e))?;
    info!("Access module initialized");

    let module_routes = vec![(access_module.name(), access_module.routes())];
    let app = routes::build_router(module_routes);

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Warden server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
