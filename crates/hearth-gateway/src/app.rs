use axum::{
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;

use hearth_auth::{BridgeCredential, CredentialStore, IngressGate};
use hearth_core::config::{BridgeConfig, HubConfig};

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: HubConfig,
    pub gate: Arc<IngressGate>,
}

impl AppState {
    pub fn new(config: HubConfig, gate: Arc<IngressGate>) -> Self {
        Self { config, gate }
    }
}

/// Resolves bridge credentials from the `[[bridges]]` config table.
pub struct ConfigCredentialStore {
    psks: HashMap<String, String>,
}

impl ConfigCredentialStore {
    pub fn new(bridges: &[BridgeConfig]) -> Self {
        Self {
            psks: bridges
                .iter()
                .map(|b| (b.id.clone(), b.psk.clone()))
                .collect(),
        }
    }
}

impl CredentialStore for ConfigCredentialStore {
    fn find_bridge_credential(&self, bridge_id: &str) -> Option<BridgeCredential> {
        self.psks.get(bridge_id).map(|psk| BridgeCredential {
            bridge_id: bridge_id.to_string(),
            psk: psk.clone(),
        })
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/bridge/ingress",
            post(crate::http::ingress::ingress_handler),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
