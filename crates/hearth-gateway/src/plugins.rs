//! Built-in housekeeping plugin.
//!
//! Integrations ship their own plugins; this one exists so a bare hub still
//! exercises the full startup sequence: one init routine (signature
//! primitive self-check) and one hourly heartbeat cron job.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use hearth_auth::expected_signature;
use hearth_runtime::{CronJob, CronSchedule, InitRoutine, Plugin, TargetBarrier};

pub struct HousekeepingPlugin;

impl Plugin for HousekeepingPlugin {
    fn name(&self) -> &str {
        "housekeeping"
    }

    fn cron_jobs(&self) -> Vec<Arc<dyn CronJob>> {
        vec![Arc::new(HeartbeatJob {
            started: Utc::now(),
        })]
    }

    fn init_routines(&self) -> Vec<Arc<dyn InitRoutine>> {
        vec![Arc::new(SignatureSelfCheck)]
    }
}

/// Verifies the signature primitive before any bridge traffic is admitted.
struct SignatureSelfCheck;

#[async_trait]
impl InitRoutine for SignatureSelfCheck {
    fn name(&self) -> &str {
        "signature-self-check"
    }

    async fn run(&self, _barrier: Arc<TargetBarrier>) -> anyhow::Result<()> {
        let digest = expected_signature("", 1_700_000_000_000, "s3cret", "abc");
        anyhow::ensure!(
            digest == "226e4517bb3e5b78b55938de0fd1161b004a64daf6e433c01eb95f46179d5481",
            "SHA-256 self-check produced an unexpected digest"
        );
        info!("signature primitive verified");
        Ok(())
    }
}

/// Logs hub uptime at the top of every hour.
struct HeartbeatJob {
    started: chrono::DateTime<Utc>,
}

#[async_trait]
impl CronJob for HeartbeatJob {
    fn name(&self) -> &str {
        "heartbeat"
    }

    fn schedule(&self) -> CronSchedule {
        CronSchedule::new().at_minutes([0])
    }

    async fn run(&self) -> anyhow::Result<()> {
        let uptime = Utc::now() - self.started;
        info!(uptime_mins = uptime.num_minutes(), "hub heartbeat");
        Ok(())
    }
}
