//! Initialization sequencing.
//!
//! Runs every registered [`InitRoutine`] to completion, then posts
//! [`Target::INIT_COMPLETE`] on the barrier. Any routine failure is fatal to
//! startup: the target is never posted, so dependents stall rather than run
//! unready.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info};

use crate::barrier::{Target, TargetBarrier};
use crate::error::{Result, RuntimeError};
use crate::plugin::InitRoutine;

pub struct InitSequencer {
    barrier: Arc<TargetBarrier>,
}

impl InitSequencer {
    pub fn new(barrier: Arc<TargetBarrier>) -> Self {
        Self { barrier }
    }

    /// Run all routines concurrently to completion, then post
    /// [`Target::INIT_COMPLETE`].
    ///
    /// Routines may themselves wait on targets via the barrier they receive,
    /// so inter-routine ordering needs no hand-wiring here.
    pub async fn run(&self, routines: Vec<Arc<dyn InitRoutine>>) -> Result<()> {
        info!(routines = routines.len(), "running initialization routines");

        let mut set = JoinSet::new();
        for routine in routines {
            let barrier = Arc::clone(&self.barrier);
            set.spawn(async move {
                let name = routine.name().to_string();
                routine.run(barrier).await.map_err(|e| (name, e))
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err((routine, e))) => {
                    error!(routine = %routine, error = %e, "initialization routine failed — startup stalled");
                    return Err(RuntimeError::InitFailed {
                        routine,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(error = %e, "initialization routine panicked — startup stalled");
                    return Err(RuntimeError::InitPanicked {
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.barrier.post(&Target::INIT_COMPLETE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Routine {
        name: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl InitRoutine for Routine {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self, _barrier: Arc<TargetBarrier>) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("bootstrap error");
            }
            Ok(())
        }
    }

    /// Routine that waits for a target another routine posts.
    struct DependentRoutine {
        depends_on: Target,
    }

    #[async_trait]
    impl InitRoutine for DependentRoutine {
        fn name(&self) -> &str {
            "dependent"
        }

        async fn run(&self, barrier: Arc<TargetBarrier>) -> anyhow::Result<()> {
            barrier.wait(&self.depends_on).await;
            Ok(())
        }
    }

    struct PostingRoutine {
        posts: Target,
    }

    #[async_trait]
    impl InitRoutine for PostingRoutine {
        fn name(&self) -> &str {
            "posting"
        }

        async fn run(&self, barrier: Arc<TargetBarrier>) -> anyhow::Result<()> {
            barrier.post(&self.posts);
            Ok(())
        }
    }

    #[tokio::test]
    async fn success_posts_init_complete() {
        let barrier = Arc::new(TargetBarrier::new());
        let sequencer = InitSequencer::new(Arc::clone(&barrier));

        sequencer
            .run(vec![Arc::new(Routine {
                name: "crypto-bootstrap",
                fail: false,
            })])
            .await
            .unwrap();

        assert!(barrier.is_posted(&Target::INIT_COMPLETE));
    }

    #[tokio::test]
    async fn failure_never_posts_init_complete() {
        let barrier = Arc::new(TargetBarrier::new());
        let sequencer = InitSequencer::new(Arc::clone(&barrier));

        let err = sequencer
            .run(vec![
                Arc::new(Routine {
                    name: "ok",
                    fail: false,
                }),
                Arc::new(Routine {
                    name: "broken",
                    fail: true,
                }),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, RuntimeError::InitFailed { .. }));
        assert!(!barrier.is_posted(&Target::INIT_COMPLETE));
    }

    #[tokio::test]
    async fn routines_can_order_themselves_via_targets() {
        let barrier = Arc::new(TargetBarrier::new());
        let sequencer = InitSequencer::new(Arc::clone(&barrier));
        let phase = Target::new("keys-loaded");

        sequencer
            .run(vec![
                Arc::new(DependentRoutine {
                    depends_on: phase.clone(),
                }),
                Arc::new(PostingRoutine {
                    posts: phase.clone(),
                }),
            ])
            .await
            .unwrap();

        assert!(barrier.is_posted(&phase));
        assert!(barrier.is_posted(&Target::INIT_COMPLETE));
    }

    #[tokio::test]
    async fn empty_routine_list_still_posts() {
        let barrier = Arc::new(TargetBarrier::new());
        let sequencer = InitSequencer::new(Arc::clone(&barrier));
        sequencer.run(Vec::new()).await.unwrap();
        assert!(barrier.is_posted(&Target::INIT_COMPLETE));
    }
}
