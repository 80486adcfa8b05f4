pub mod config;
pub mod logging;

use api::{middleware_hooks::Identity, store::InMemoryPhotoStore, AppState, GatewaySettings};
use authz::{
    cedar::CedarDecisionClient,
    remote::{HttpDecisionClient, RemoteEngineConfig},
    DecisionClient,
};
use config::{AppConfig, EngineKind};
use std::sync::Arc;

/// Policy set used by the local engine when `POLICY_PATH` is not set.
pub const BUNDLED_POLICIES: &str = include_str!("../policies/photoflash.cedar");

/// Build the decision client selected by the configuration
pub fn build_decision_client(
    config: &AppConfig,
) -> Result<Arc<dyn DecisionClient>, Box<dyn std::error::Error>> {
    match config.engine {
        EngineKind::Local => {
            let policies = match &config.policy_path {
                Some(path) => {
                    tracing::info!("Loading CEDAR policies from {:?}", path);
                    std::fs::read_to_string(path)?
                }
                None => {
                    tracing::info!("Using bundled CEDAR policies");
                    BUNDLED_POLICIES.to_string()
                }
            };
            Ok(Arc::new(CedarDecisionClient::from_policies(&policies)?))
        }
        EngineKind::Remote => {
            let remote = RemoteEngineConfig::new(
                config.decision_endpoint.clone(),
                &config.region,
                config.decision_timeout,
            );
            tracing::info!("Using remote decision engine at {}", remote.endpoint);
            Ok(Arc::new(HttpDecisionClient::new(remote)?))
        }
    }
}

/// Assemble the shared application state
pub fn build_state(config: &AppConfig, decision: Arc<dyn DecisionClient>) -> AppState {
    AppState {
        decision,
        photos: Arc::new(InMemoryPhotoStore::seeded()),
        settings: Arc::new(GatewaySettings {
            policy_store_id: config.policy_store_id.clone(),
            identity: Identity::new(&config.user_id, &config.account_id),
            photo_base_url: config.photo_base_url.clone(),
        }),
    }
}
