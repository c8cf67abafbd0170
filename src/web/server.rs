//! Web server using Axum.

use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::router::create_app_router;
use super::AppState;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::schedule;
use crate::store::Store;

/// Command lines are short; anything larger is rejected before parsing.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Run the web server, and the scheduled message processor when enabled.
pub async fn run_server(settings: Settings, store: Store) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

    if settings.scheduler.enabled {
        tokio::spawn(schedule::run_scheduler(store.clone(), settings.clone()));
    }

    let app = create_app_router(AppState::new(store, settings))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    tracing::info!("Starting web server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
