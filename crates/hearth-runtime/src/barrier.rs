//! Named one-shot phase signals for ordered startup.
//!
//! Components `wait` for or `post` a [`Target`] instead of being hand-wired
//! into a startup sequence. Posting is idempotent; a target that is never
//! posted blocks its waiters forever — a stuck initializer should stall its
//! dependents rather than let them proceed unready.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{debug, info};

/// Opaque marker identifying a startup phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(Cow<'static, str>);

impl Target {
    /// Posted by the [`InitSequencer`](crate::InitSequencer) once every
    /// initialization routine has completed.
    pub const INIT_COMPLETE: Target = Target(Cow::Borrowed("init-complete"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One-shot latch per [`Target`], shared by all waiters.
///
/// Backed by a `watch` channel per target; the sender side lives in the map
/// for the barrier's lifetime, so waiters observe posts made before or after
/// they started waiting.
pub struct TargetBarrier {
    slots: Mutex<HashMap<Target, watch::Sender<bool>>>,
}

impl TargetBarrier {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, target: &Target) -> watch::Sender<bool> {
        let mut slots = self.slots.lock().unwrap();
        slots
            .entry(target.clone())
            .or_insert_with(|| watch::channel(false).0)
            .clone()
    }

    /// Post `target`, unblocking all current and future waiters.
    ///
    /// The first post wins; later posts are no-ops.
    pub fn post(&self, target: &Target) {
        let tx = self.slot(target);
        if *tx.borrow() {
            debug!(target = %target, "target already posted");
            return;
        }
        tx.send_replace(true);
        info!(target = %target, "target posted");
    }

    /// Suspend until `target` is posted; returns immediately if it already was.
    pub async fn wait(&self, target: &Target) {
        let mut rx = self.slot(target).subscribe();
        // The sender is retained in the map, so this can only fail if the
        // barrier itself is dropped while waiting.
        let _ = rx.wait_for(|posted| *posted).await;
    }

    pub fn is_posted(&self, target: &Target) -> bool {
        *self.slot(target).borrow()
    }
}

impl Default for TargetBarrier {
    fn default() -> Self {
        Self::new()
    }
}
