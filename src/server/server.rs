/// Server implementation for rs_webterm
use std::future::Future;

use axum::{
    Router,
    http::Method,
    routing::{delete, get},
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{app_state::AppState, config::ServerConfig, handlers};

/// Build the application router with routes
pub fn build_router(state: AppState) -> Router {
    // Any origin may connect; no credentials are involved
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    // Unknown paths get the UI entry document so client-side routes resolve
    let static_dir = state.config.server.static_dir.clone();
    let static_files = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    // Socket.IO for the bundled UI, answered before routing
    let socketio = handlers::socketio::socketio_layer(state.sessions.clone());

    Router::new()
        .route("/health", get(handlers::rest::health_check))
        // WebSocket endpoints for terminal communication
        .route("/ws", get(handlers::websocket::websocket_handler))
        .route("/socket", get(handlers::websocket::websocket_handler))
        .nest("/api", api_routes())
        .fallback_service(static_files)
        .layer(socketio)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Build API routes for session management
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(handlers::rest::list_sessions))
        .route("/sessions/:session_id", delete(handlers::rest::close_session))
}

/// Serve `router` on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Run the HTTP server with graceful shutdown support
pub async fn run_server_with_graceful_shutdown(
    router: Router,
    config: &ServerConfig,
) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    info!("Server running on http://{}", local_addr);
    info!("WebSocket endpoint available at ws://{}/ws", local_addr);
    info!("Socket.IO endpoint available at http://{}/socket.io/", local_addr);
    info!("Serving static files from {}", config.static_dir.display());

    serve(listener, router, shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM signal, initiating graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
