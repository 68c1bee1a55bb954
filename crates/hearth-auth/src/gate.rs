//! The authenticated ingress gate.
//!
//! Consulted by the transport layer on every inbound bridge call,
//! independently of daemon execution. The gate owns the [`ReplayCache`];
//! there is no module-level shared state.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::warn;

use hearth_core::config::AuthConfig;

use crate::replay::{ParamToken, ReplayCache};
use crate::types::{AuthFailure, AuthResult, CredentialStore, IngressRequest};

/// Lowercase hex SHA-256 over `body + timestamp + psk + nonce`.
pub fn expected_signature(body: &str, timestamp_ms: i64, psk: &str, nonce: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher.update(timestamp_ms.to_string().as_bytes());
    hasher.update(psk.as_bytes());
    hasher.update(nonce.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct IngressGate {
    credentials: Arc<dyn CredentialStore>,
    replay: ReplayCache,
}

impl IngressGate {
    pub fn new(credentials: Arc<dyn CredentialStore>, cfg: &AuthConfig) -> Self {
        Self {
            credentials,
            replay: ReplayCache::new(
                Duration::seconds(cfg.freshness_window_secs as i64),
                Duration::seconds(cfg.replay_retention_secs as i64),
            ),
        }
    }

    /// Validate one inbound request against the wall clock.
    pub fn validate(&self, request: &IngressRequest<'_>) -> AuthResult {
        self.validate_at(request, Utc::now())
    }

    /// Validate one inbound request at an explicit instant, fast-failing:
    ///
    /// 1. extract signature, timestamp, bridge id, nonce (`Illegal*`);
    /// 2. resolve the bridge's pre-shared key (`UnauthorizedBridge`);
    /// 3. consume `{timestamp, nonce}` in the replay cache (`StaleAuth`,
    ///    `AlreadyConsumed`) — before any signature comparison, so probing
    ///    with a replayed token always burns it;
    /// 4. compare the provided signature against the recomputed one, exact
    ///    and case-sensitive (`InvalidAuthorization`).
    pub fn validate_at(&self, request: &IngressRequest<'_>, now: DateTime<Utc>) -> AuthResult {
        let signature = request
            .signature
            .filter(|s| !s.is_empty())
            .ok_or(AuthFailure::IllegalSignature)?;
        let timestamp_ms: i64 = request
            .timestamp
            .and_then(|t| t.parse().ok())
            .ok_or(AuthFailure::IllegalTimestamp)?;
        let bridge_id = request
            .bridge_id
            .filter(|s| !s.is_empty())
            .ok_or(AuthFailure::IllegalBridgeId)?;
        let nonce = request
            .nonce
            .filter(|s| !s.is_empty())
            .ok_or(AuthFailure::IllegalNonce)?;

        let credential = self
            .credentials
            .find_bridge_credential(bridge_id)
            .ok_or_else(|| {
                warn!(bridge = %bridge_id, "unknown bridge id");
                AuthFailure::UnauthorizedBridge
            })?;

        let expected = expected_signature(
            request.body.unwrap_or(""),
            timestamp_ms,
            &credential.psk,
            nonce,
        );

        self.replay.consume(
            ParamToken {
                timestamp_ms,
                nonce: nonce.to_string(),
            },
            now,
        )?;

        if signature != expected {
            warn!(bridge = %bridge_id, "signature mismatch");
            return Err(AuthFailure::InvalidAuthorization);
        }
        Ok(())
    }

    /// Tokens currently held by the replay cache.
    pub fn replay_cache_len(&self) -> usize {
        self.replay.len()
    }
}
