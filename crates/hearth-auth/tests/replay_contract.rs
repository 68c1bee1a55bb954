// Verify the ingress auth contract bridges depend on: freshness window,
// replay semantics, eviction, and single-winner concurrency.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use hearth_auth::{
    expected_signature, AuthFailure, BridgeCredential, CredentialStore, IngressGate,
    IngressRequest, ParamToken, ReplayCache,
};
use hearth_core::config::AuthConfig;

struct MapStore(HashMap<String, String>);

impl CredentialStore for MapStore {
    fn find_bridge_credential(&self, bridge_id: &str) -> Option<BridgeCredential> {
        self.0.get(bridge_id).map(|psk| BridgeCredential {
            bridge_id: bridge_id.to_string(),
            psk: psk.clone(),
        })
    }
}

fn gate() -> Arc<IngressGate> {
    let mut creds = HashMap::new();
    creds.insert("notify-svc".to_string(), "s3cret".to_string());
    Arc::new(IngressGate::new(
        Arc::new(MapStore(creds)),
        &AuthConfig::default(),
    ))
}

#[test]
fn concurrent_requests_sharing_a_token_have_one_winner() {
    let gate = gate();
    let now = Utc::now();
    let ts = now.timestamp_millis();
    let ts_str = ts.to_string();
    let sig = expected_signature("", ts, "s3cret", "shared-nonce");

    let results: Vec<_> = (0..8)
        .map(|_| {
            let gate = Arc::clone(&gate);
            let ts_str = ts_str.clone();
            let sig = sig.clone();
            thread::spawn(move || {
                let req = IngressRequest {
                    signature: Some(&sig),
                    timestamp: Some(&ts_str),
                    bridge_id: Some("notify-svc"),
                    nonce: Some("shared-nonce"),
                    body: None,
                };
                gate.validate_at(&req, now)
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let replays = results
        .iter()
        .filter(|r| **r == Err(AuthFailure::AlreadyConsumed))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(replays, 7);
}

#[test]
fn evicted_token_fails_as_stale_not_consumed() {
    let cache = ReplayCache::new(Duration::minutes(1), Duration::minutes(5));
    let t0 = Utc::now();
    let token = ParamToken {
        timestamp_ms: t0.timestamp_millis(),
        nonce: "abc".to_string(),
    };
    assert_eq!(cache.consume(token.clone(), t0), Ok(()));

    // Past the retention horizon, an update evicts the member; the replayed
    // token then fails on its own age, not membership.
    let t1 = t0 + Duration::minutes(6);
    let newer = ParamToken {
        timestamp_ms: t1.timestamp_millis(),
        nonce: "def".to_string(),
    };
    assert_eq!(cache.consume(newer, t1), Ok(()));
    assert_eq!(cache.consume(token, t1), Err(AuthFailure::StaleAuth));
}

#[test]
fn full_pipeline_accepts_a_well_formed_bridge_push() {
    let gate = gate();
    let now = Utc::now();
    let ts = now.timestamp_millis();
    let ts_str = ts.to_string();
    let body = r#"{"device":"sump-pump","event":"leak"}"#;
    let sig = expected_signature(body, ts, "s3cret", "n-100");

    let req = IngressRequest {
        signature: Some(&sig),
        timestamp: Some(&ts_str),
        bridge_id: Some("notify-svc"),
        nonce: Some("n-100"),
        body: Some(body),
    };
    assert_eq!(gate.validate_at(&req, now), Ok(()));
    assert_eq!(gate.replay_cache_len(), 1);
}

#[test]
fn signature_is_sixty_four_lowercase_hex_chars() {
    let sig = expected_signature("", 1_700_000_000_000, "s3cret", "abc");
    assert_eq!(sig.len(), 64);
    assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}
