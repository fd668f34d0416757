mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use sampah_api::auth::seed_admin;
use sampah_api::storage::{PUBLIC_PREFIX, Storage};
use sampah_api::{AppStateInner, router};
use sampah_db::Database;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sampah=debug,sampah_api=debug,tower_http=debug".into()),
        )
        .init();

    let cfg = match ServerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("FATAL: {:#}", e);
            std::process::exit(1);
        }
    };

    // Init database and storage
    let db = Database::open(&cfg.db_path)?;
    match &cfg.admin {
        Some(admin) => {
            if !seed_admin(&db, &admin.name, &admin.email, &admin.password)? {
                info!("Admin account {} already present", admin.email);
            }
        }
        None => warn!("SAMPAH_ADMIN_EMAIL/SAMPAH_ADMIN_PASSWORD unset; no admin account seeded"),
    }
    let storage = Storage::new(cfg.upload_dir.clone()).await?;

    let state = Arc::new(AppStateInner {
        db,
        storage,
        jwt_secret: cfg.jwt_secret.clone(),
        token_ttl: cfg.token_ttl,
        zone: cfg.zone,
    });

    let app = router(state, cfg.max_upload_bytes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&cfg.upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Sampah server listening on {}", cfg.addr);
    info!(
        "Timestamps rendered at UTC{}",
        cfg.zone.offset()
    );

    let listener = tokio::net::TcpListener::bind(cfg.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
