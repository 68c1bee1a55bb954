//! Daemon supervision.
//!
//! The [`Supervisor`] waits for [`Target::INIT_COMPLETE`], then launches
//! every registered daemon as an independent task under one root
//! [`CancellationToken`]. A daemon's failure never cancels siblings; the
//! failure policy decides per run whether to relaunch after a delay or to
//! cancel the entire tree (panic), so a crash-loop cannot masquerade as
//! "still running".

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::barrier::{Target, TargetBarrier};
use crate::plugin::Daemon;
use crate::policy::{FailurePolicy, RunAttempt, Verdict};

pub struct Supervisor {
    barrier: Arc<TargetBarrier>,
    policy: Arc<dyn FailurePolicy>,
    root: CancellationToken,
}

impl Supervisor {
    pub fn new(barrier: Arc<TargetBarrier>, policy: Arc<dyn FailurePolicy>) -> Self {
        Self::with_root(barrier, policy, CancellationToken::new())
    }

    /// Build a supervisor sharing an externally owned root token, so the
    /// transport layer and OS signal handling cancel the same tree.
    pub fn with_root(
        barrier: Arc<TargetBarrier>,
        policy: Arc<dyn FailurePolicy>,
        root: CancellationToken,
    ) -> Self {
        Self {
            barrier,
            policy,
            root,
        }
    }

    /// Token cancelled on panic; cancel it externally for graceful shutdown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// Supervise `daemons` until the root token is cancelled.
    ///
    /// Blocks on the barrier first: no daemon launches before initialization
    /// completes. Each daemon gets its own child token and supervision loop.
    pub async fn run(self, daemons: Vec<Arc<dyn Daemon>>) {
        // A stalled initializer blocks here forever by design; cancellation
        // still has to win so a stuck startup can be shut down.
        tokio::select! {
            _ = self.root.cancelled() => return,
            _ = self.barrier.wait(&Target::INIT_COMPLETE) => {}
        }
        info!(daemons = daemons.len(), "initialization complete — launching daemons");

        let mut set = JoinSet::new();
        for daemon in daemons {
            let policy = Arc::clone(&self.policy);
            let cancel = self.root.child_token();
            let root = self.root.clone();
            set.spawn(supervise(daemon, policy, cancel, root));
        }
        while set.join_next().await.is_some() {}
    }
}

/// Supervision loop for one daemon: run, record the attempt, act on the
/// policy verdict, repeat.
async fn supervise(
    daemon: Arc<dyn Daemon>,
    policy: Arc<dyn FailurePolicy>,
    cancel: CancellationToken,
    root: CancellationToken,
) {
    let mut attempts: Vec<RunAttempt> = Vec::new();
    loop {
        let started = Utc::now();
        info!(
            daemon = daemon.name(),
            attempt = attempts.len() + 1,
            "daemon starting"
        );

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(daemon = daemon.name(), "daemon cancelled");
                return;
            }
            r = daemon.run(cancel.clone()) => r,
        };
        if cancel.is_cancelled() {
            return;
        }

        let failed_at = match outcome {
            Ok(()) => {
                // Daemons are non-returning by contract; a clean exit is
                // unexpected but not a failure for rate purposes.
                warn!(daemon = daemon.name(), "daemon returned unexpectedly");
                None
            }
            Err(e) => {
                error!(daemon = daemon.name(), error = %e, "daemon failed");
                Some(Utc::now())
            }
        };
        attempts.push(RunAttempt { started, failed_at });

        match policy.verdict(&attempts, Utc::now()) {
            Verdict::Restart { delay } => {
                warn!(
                    daemon = daemon.name(),
                    delay_secs = delay.as_secs(),
                    "restarting daemon"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Verdict::Panic => {
                error!(
                    daemon = daemon.name(),
                    attempts = attempts.len(),
                    "failure threshold exceeded — shutting the hub down"
                );
                root.cancel();
                return;
            }
        }
    }
}
