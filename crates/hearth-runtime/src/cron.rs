//! Minute-granular cron scheduling.
//!
//! [`CronSchedule`] is four integer sets — minutes, hours, days-of-month,
//! months — and a tick matches iff all four current components are members.
//! [`CronScheduler`] is a [`Daemon`] that polls roughly every second,
//! collapses to one logical tick per wall-clock minute, and runs every
//! matching job sequentially, isolating job failures from each other.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::plugin::{CronJob, Daemon};

/// When a job runs: minutes (0–59), hours (0–23), days-of-month (1–31),
/// months (1–12). Defaults are full ranges, so `CronSchedule::default()`
/// matches every minute.
///
/// Each field filters independently. Day sets containing 29–31 simply never
/// fire in shorter months; that is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    days_of_month: BTreeSet<u32>,
    months: BTreeSet<u32>,
}

impl Default for CronSchedule {
    fn default() -> Self {
        Self {
            minutes: (0..60).collect(),
            hours: (0..24).collect(),
            days_of_month: (1..=31).collect(),
            months: (1..=12).collect(),
        }
    }
}

impl CronSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_minutes(mut self, minutes: impl IntoIterator<Item = u32>) -> Self {
        self.minutes = minutes.into_iter().collect();
        self
    }

    pub fn at_hours(mut self, hours: impl IntoIterator<Item = u32>) -> Self {
        self.hours = hours.into_iter().collect();
        self
    }

    pub fn on_days_of_month(mut self, days: impl IntoIterator<Item = u32>) -> Self {
        self.days_of_month = days.into_iter().collect();
        self
    }

    pub fn in_months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.months = months.into_iter().collect();
        self
    }

    /// True iff every component of `now` is a member of its set.
    pub fn matches<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.minutes.contains(&now.minute())
            && self.hours.contains(&now.hour())
            && self.days_of_month.contains(&now.day())
            && self.months.contains(&now.month())
    }
}

/// Daemon that drives all registered [`CronJob`]s.
pub struct CronScheduler {
    jobs: Vec<Arc<dyn CronJob>>,
}

impl CronScheduler {
    pub fn new(jobs: Vec<Arc<dyn CronJob>>) -> Self {
        Self { jobs }
    }

    /// Run every job whose schedule matches `now`, sequentially.
    ///
    /// A failing handler is logged and never propagates, so one job cannot
    /// block the tick's others.
    async fn run_due<Tz: TimeZone>(&self, now: &DateTime<Tz>) {
        for job in &self.jobs {
            if !job.schedule().matches(now) {
                continue;
            }
            debug!(job = job.name(), "cron job firing");
            if let Err(e) = job.run().await {
                error!(job = job.name(), error = %e, "cron job failed");
            }
        }
    }
}

#[async_trait]
impl Daemon for CronScheduler {
    fn name(&self) -> &str {
        "cron-scheduler"
    }

    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        info!(jobs = self.jobs.len(), "cron scheduler started");
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // Collapse the ~1 s ticks to one logical tick per wall-clock minute.
        let mut last_minute: Option<u32> = None;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("cron scheduler shutting down");
                    return Ok(());
                }
                _ = interval.tick() => {}
            }
            let now = Local::now();
            if last_minute == Some(now.minute()) {
                continue;
            }
            last_minute = Some(now.minute());
            self.run_due(&now).await;
        }
    }
}
