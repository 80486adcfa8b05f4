use crate::{create_router, AppState};
use tracing::info;

/// API server configuration
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3030 }
    }
}

impl ApiConfig {
    /// Create a new API configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Start the API server with the given configuration
///
/// Runs until Ctrl-C. In-flight requests are drained on shutdown; a request
/// whose client disconnects is dropped together with its pending decision call.
pub async fn start_server_with_config(
    state: AppState,
    config: ApiConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = state.decision.name();
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {} (decision engine: {})", addr, engine);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
