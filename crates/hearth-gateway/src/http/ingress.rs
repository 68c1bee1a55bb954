//! Bridge ingress endpoint — POST /bridge/ingress.
//!
//! Accepts event pushes from external bridges. Authentication lives entirely
//! in [`hearth_auth::IngressGate`]; this handler only extracts the request
//! fields and maps each failure kind to a status code.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use hearth_auth::{AuthFailure, IngressRequest};

use crate::app::AppState;

/// POST /bridge/ingress
///
/// Consumes `X-Signature`, `X-Timestamp` (epoch ms), `X-Bridge-Id`, and
/// `X-Nonce` headers plus the raw body. Returns 202 with a receipt on
/// success; a rejected request has no side effects beyond the gate's replay
/// bookkeeping.
pub async fn ingress_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let body_str = std::str::from_utf8(&body).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "body must be UTF-8"})),
        )
    })?;

    let bridge_id = header(&headers, "x-bridge-id");
    let request = IngressRequest {
        signature: header(&headers, "x-signature"),
        timestamp: header(&headers, "x-timestamp"),
        bridge_id,
        nonce: header(&headers, "x-nonce"),
        body: Some(body_str),
    };

    match state.gate.validate(&request) {
        Ok(()) => {
            info!(
                bridge = bridge_id.unwrap_or("<unknown>"),
                bytes = body.len(),
                "bridge event accepted"
            );
            Ok((StatusCode::ACCEPTED, Json(json!({"ok": true}))))
        }
        Err(failure) => {
            warn!(
                bridge = bridge_id.unwrap_or("<unknown>"),
                code = failure.code(),
                "bridge request rejected"
            );
            Err((
                status_for(failure),
                Json(json!({"error": failure.to_string(), "code": failure.code()})),
            ))
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn status_for(failure: AuthFailure) -> StatusCode {
    match failure {
        AuthFailure::IllegalSignature
        | AuthFailure::IllegalTimestamp
        | AuthFailure::IllegalBridgeId
        | AuthFailure::IllegalNonce => StatusCode::BAD_REQUEST,
        AuthFailure::UnauthorizedBridge
        | AuthFailure::StaleAuth
        | AuthFailure::AlreadyConsumed
        | AuthFailure::InvalidAuthorization => StatusCode::UNAUTHORIZED,
    }
}
