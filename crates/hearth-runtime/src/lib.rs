//! `hearth-runtime` — the hub's runtime substrate.
//!
//! # Overview
//!
//! Keeps a set of background daemons and time-scheduled jobs alive and
//! supervised, sequencing startup into ordered phases:
//!
//! | Component          | Responsibility                                        |
//! |--------------------|-------------------------------------------------------|
//! | [`TargetBarrier`]  | Named one-shot phase signals for ordered startup      |
//! | [`InitSequencer`]  | Runs setup routines, posts "initialization complete"  |
//! | [`CronScheduler`]  | Minute-granular schedule matching over a 1 s tick     |
//! | [`Supervisor`]     | Launches daemons, restarts or panics per policy       |
//!
//! At startup the sequencer runs first; the supervisor waits on
//! [`Target::INIT_COMPLETE`] and only then launches the cron scheduler and
//! every other daemon. A daemon crash-looping past the
//! [`ThrottledFailurePolicy`] threshold cancels the whole task tree
//! cooperatively.

pub mod barrier;
pub mod cron;
pub mod error;
pub mod init;
pub mod plugin;
pub mod policy;
pub mod supervisor;

pub use barrier::{Target, TargetBarrier};
pub use cron::{CronSchedule, CronScheduler};
pub use error::{Result, RuntimeError};
pub use init::InitSequencer;
pub use plugin::{CronJob, Daemon, InitRoutine, Plugin, PluginRegistry};
pub use policy::{FailurePolicy, RunAttempt, ThrottledFailurePolicy, Verdict};
pub use supervisor::Supervisor;
