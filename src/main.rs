use anyhow::{Context, Result};
use axum::{Router, http::HeaderValue};
use file_vault::{
    config::AppConfig,
    db,
    routes::routes::{cors_layer, routes},
    services::{physical_store::PhysicalStore, tree_service::TreeService},
    state::AppState,
};
use std::{io::ErrorKind, path::Path, sync::Arc};
use tokio::{fs, net::TcpListener};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting file-vault with config: {:?}", cfg);

    // --- Ensure upload directory exists ---
    let upload_root = cfg.upload_root()?;
    fs::create_dir_all(&upload_root)
        .await
        .with_context(|| format!("creating upload directory {}", upload_root.display()))?;
    tracing::info!("Upload root at {}", upload_root.display());

    // --- Initialize SQLite connection ---
    let db_url = &cfg.database_url;
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");
    if !db_path.starts_with(":memory:") {
        if let Some(parent) = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating database directory {}", parent.display()))?;
        }
    }

    let pool = Arc::new(
        db::connect(db_url)
            .await
            .with_context(|| format!("connecting to {}", db_url))?,
    );

    db::run_migrations(&pool)
        .await
        .context("applying database schema")?;

    // --- Handle migration mode ---
    if migrate {
        tracing::info!("Database migration complete.");
        return Ok(());
    }

    // --- Initialize core services ---
    let tree = TreeService::new(pool, PhysicalStore::new(upload_root));
    let state = AppState::new(tree, cfg.public_base_url.clone());

    let origin = HeaderValue::from_str(&cfg.cors_origin)
        .with_context(|| format!("invalid CORS origin `{}`", cfg.cors_origin))?;

    // --- Build router ---
    let app: Router = routes()
        .with_state(state)
        .layer(cors_layer(origin))
        .layer(TraceLayer::new_for_http());

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
