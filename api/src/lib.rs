use authz::DecisionClient;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod gate;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod schema;
pub mod server;
pub mod store;

#[cfg(test)]
mod gate_tests;

// Re-export server functions for convenience
pub use server::{start_server_with_config, ApiConfig};

use gate::guarded;
use handlers::photo::{UploadPhoto, ViewPhoto};
use middleware_hooks::Identity;
use store::PhotoStore;

/// Process-wide settings, read-only after start-up.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Policy store the decision engine evaluates against
    pub policy_store_id: String,
    /// Identity attached to requests in place of an upstream authenticator
    pub identity: Identity,
    /// Base URL for photo links returned to clients
    pub photo_base_url: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub decision: Arc<dyn DecisionClient>,
    pub photos: Arc<dyn PhotoStore>,
    pub settings: Arc<GatewaySettings>,
}

/// Create the main API router with all routes and middleware
///
/// Protected routes are registered only through [`gate::guarded`].
pub fn create_router(state: AppState) -> Router {
    let view_photo = ViewPhoto::new(state.photos.clone(), state.settings.photo_base_url.clone());

    // API v1 routes
    let api_v1 = Router::new()
        .route("/photo/upload", post(guarded(UploadPhoto)))
        .route("/photo/:id", get(guarded(view_photo)))
        // Health check
        .route("/health", get(handlers::health::health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::identity_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::request_middleware,
        ));

    // Main router. The request id is set before the trace span opens so the
    // span can record it, and echoed back on the response.
    Router::new()
        .nest("/api/v1", api_v1)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    middleware_hooks::request_id_header(),
                    middleware_hooks::SequentialRequestId::default(),
                ))
                .layer(TraceLayer::new_for_http().make_span_with(middleware_hooks::request_span))
                .layer(PropagateRequestIdLayer::new(
                    middleware_hooks::request_id_header(),
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
