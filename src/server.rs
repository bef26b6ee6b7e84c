use axum::{routing::get, Router};
use log::{error, info};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use crate::handlers::http::{health, AppState};
use crate::handlers::ws::ws_handler;

/// Routes: health on `/`, WebSocket on `/ws`, any origin allowed
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Bind the configured address and serve until Ctrl-C
pub async fn start_server(app_state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let addr = app_state.config.bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => {
            info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind server to {}: {}", addr, e);
            return Err(e.into());
        }
    };

    serve(listener, app_state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes
pub async fn serve<F>(listener: TcpListener, app_state: AppState, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(app_state);
    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
    }
}
