//! Replay protection.
//!
//! The cache holds every `{timestamp, nonce}` pair consumed within the
//! retention horizon. Consumption is one indivisible step — freshness check,
//! membership check, insert, prune — behind a single mutex, so two concurrent
//! requests sharing a pair cannot both succeed.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::types::AuthFailure;

/// Replay-cache key. The signature is deliberately excluded: duplicate
/// `{timestamp, nonce}` pairs are one logical attempt regardless of whether
/// their signatures were valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamToken {
    pub timestamp_ms: i64,
    pub nonce: String,
}

/// Set of consumed tokens, shared across the process lifetime.
///
/// Invariant: every member's timestamp is within `retention` of "now" as of
/// the last update; older members are pruned on every update.
pub struct ReplayCache {
    freshness: Duration,
    retention: Duration,
    consumed: Mutex<HashSet<ParamToken>>,
}

impl ReplayCache {
    pub fn new(freshness: Duration, retention: Duration) -> Self {
        Self {
            freshness,
            retention,
            consumed: Mutex::new(HashSet::new()),
        }
    }

    /// Attempt to consume `token` at instant `now`.
    ///
    /// - timestamp older than `now - freshness` → [`AuthFailure::StaleAuth`],
    ///   cache untouched;
    /// - already present → [`AuthFailure::AlreadyConsumed`];
    /// - otherwise insert, then prune members older than `now - retention`.
    pub fn consume(&self, token: ParamToken, now: DateTime<Utc>) -> Result<(), AuthFailure> {
        if token.timestamp_ms < (now - self.freshness).timestamp_millis() {
            return Err(AuthFailure::StaleAuth);
        }

        let mut consumed = self.consumed.lock().unwrap();
        if consumed.contains(&token) {
            return Err(AuthFailure::AlreadyConsumed);
        }
        consumed.insert(token);

        let horizon = (now - self.retention).timestamp_millis();
        consumed.retain(|t| t.timestamp_ms >= horizon);
        Ok(())
    }

    /// Number of tokens currently retained.
    pub fn len(&self) -> usize {
        self.consumed.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ReplayCache {
        ReplayCache::new(Duration::minutes(1), Duration::minutes(5))
    }

    fn token(timestamp_ms: i64, nonce: &str) -> ParamToken {
        ParamToken {
            timestamp_ms,
            nonce: nonce.to_string(),
        }
    }

    #[test]
    fn fresh_token_consumes_once() {
        let cache = cache();
        let now = Utc::now();
        let t = token(now.timestamp_millis(), "abc");

        assert_eq!(cache.consume(t.clone(), now), Ok(()));
        assert_eq!(cache.consume(t, now), Err(AuthFailure::AlreadyConsumed));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stale_token_leaves_cache_untouched() {
        let cache = cache();
        let now = Utc::now();
        let t = token((now - Duration::seconds(90)).timestamp_millis(), "abc");

        assert_eq!(cache.consume(t, now), Err(AuthFailure::StaleAuth));
        assert!(cache.is_empty());
    }

    #[test]
    fn boundary_timestamp_inside_window_is_accepted() {
        let cache = cache();
        let now = Utc::now();
        let t = token((now - Duration::seconds(59)).timestamp_millis(), "edge");
        assert_eq!(cache.consume(t, now), Ok(()));
    }

    #[test]
    fn same_nonce_different_timestamp_is_a_distinct_token() {
        let cache = cache();
        let now = Utc::now();
        let ms = now.timestamp_millis();

        assert_eq!(cache.consume(token(ms, "abc"), now), Ok(()));
        assert_eq!(cache.consume(token(ms + 1, "abc"), now), Ok(()));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn old_members_are_pruned_on_update() {
        let cache = cache();
        let t0 = Utc::now();
        let early = token(t0.timestamp_millis(), "early");
        assert_eq!(cache.consume(early.clone(), t0), Ok(()));

        // Six minutes later a new consumption prunes the earlier member...
        let t1 = t0 + Duration::minutes(6);
        assert_eq!(cache.consume(token(t1.timestamp_millis(), "late"), t1), Ok(()));
        assert_eq!(cache.len(), 1);

        // ...and resubmitting it now fails on freshness, not membership.
        assert_eq!(cache.consume(early, t1), Err(AuthFailure::StaleAuth));
    }
}
