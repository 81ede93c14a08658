mod config;
mod ingest;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use chatdrop_api::{AppState, AppStateInner};
use chatdrop_store::Store;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chatdrop=debug,chatdrop_api=debug,chatdrop_store=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init storage
    let store = Store::open(&config.data_dir, config.current_user_id).await?;
    if config.seed_samples {
        let created = store.seed_samples().await?;
        if created > 0 {
            info!("Seeded {} sample conversations", created);
        }
    }
    store.write_inbox_template().await?;

    let state: AppState = Arc::new(AppStateInner { store });

    // Inbox watcher
    let inbox_state = state.clone();
    let settle = config.inbox_settle;
    tokio::spawn(async move {
        if let Err(e) = ingest::run(inbox_state, settle).await {
            error!("Inbox watcher stopped: {:#}", e);
        }
    });

    let app = chatdrop_api::router(state)
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.address().parse()?;
    info!("chatdrop listening on {}", addr);
    info!(
        "Data in {}, static files from {}",
        config.data_dir.display(),
        config.public_dir.display()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
