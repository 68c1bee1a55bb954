//! Boundary traits by which integrations contribute work to the runtime.
//!
//! A [`Plugin`] bundles the daemons, cron jobs, and initialization routines
//! one integration (leak alerts, lock timers, a bridge adapter) registers
//! with the hub. The runtime defines no business behavior itself — it only
//! supervises what plugins hand it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::barrier::TargetBarrier;
use crate::cron::CronSchedule;

/// A long-running supervised background task.
#[async_trait]
pub trait Daemon: Send + Sync {
    fn name(&self) -> &str;

    /// Entry point, expected to run for the life of the process.
    ///
    /// Returning at all ends the run: `Err` is a failure, `Ok` an unexpected
    /// clean exit. Either way the supervisor records the attempt and consults
    /// its failure policy. Implementations must watch `cancel` at suspension
    /// points and return promptly once it fires.
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// A handler invoked on wall-clock minutes matching its [`CronSchedule`].
#[async_trait]
pub trait CronJob: Send + Sync {
    fn name(&self) -> &str;

    fn schedule(&self) -> CronSchedule;

    async fn run(&self) -> anyhow::Result<()>;
}

/// A one-shot setup routine run to completion before any daemon launches.
///
/// A routine may itself wait on a [`Target`](crate::Target) it depends on via
/// the barrier it receives.
#[async_trait]
pub trait InitRoutine: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, barrier: Arc<TargetBarrier>) -> anyhow::Result<()>;
}

/// One integration's contribution to the hub.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn daemons(&self) -> Vec<Arc<dyn Daemon>> {
        Vec::new()
    }

    fn cron_jobs(&self) -> Vec<Arc<dyn CronJob>> {
        Vec::new()
    }

    fn init_routines(&self) -> Vec<Arc<dyn InitRoutine>> {
        Vec::new()
    }
}

/// Aggregates registered plugins for the sequencer and supervisor.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        info!(plugin = plugin.name(), "plugin registered");
        self.plugins.push(plugin);
    }

    pub fn daemons(&self) -> Vec<Arc<dyn Daemon>> {
        self.plugins.iter().flat_map(|p| p.daemons()).collect()
    }

    pub fn cron_jobs(&self) -> Vec<Arc<dyn CronJob>> {
        self.plugins.iter().flat_map(|p| p.cron_jobs()).collect()
    }

    pub fn init_routines(&self) -> Vec<Arc<dyn InitRoutine>> {
        self.plugins.iter().flat_map(|p| p.init_routines()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
