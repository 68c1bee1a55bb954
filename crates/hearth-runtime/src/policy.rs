//! Failure policies for supervised daemons.
//!
//! The supervisor records one [`RunAttempt`] per daemon run and hands the
//! full history to a [`FailurePolicy`] for a verdict: relaunch after a delay,
//! or cancel the whole process's task tree.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

use hearth_core::config::SupervisorConfig;

/// Immutable record of one supervised run. Append-only; written only by the
/// supervisor, read-only to policies.
#[derive(Debug, Clone)]
pub struct RunAttempt {
    pub started: DateTime<Utc>,
    /// Set when the run ended in failure.
    pub failed_at: Option<DateTime<Utc>>,
}

/// What the supervisor should do after a daemon run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Relaunch the same daemon after the delay.
    Restart { delay: Duration },
    /// Stop supervising and cancel the entire task tree.
    Panic,
}

pub trait FailurePolicy: Send + Sync {
    fn verdict(&self, attempts: &[RunAttempt], now: DateTime<Utc>) -> Verdict;
}

/// Default policy: an occasionally-failing daemon self-heals quietly; one
/// crash-looping faster than the configured rate signals a systemic problem
/// a restart cannot fix.
///
/// Failures within the last `window` are inspected; with at least
/// `min_attempts` of them and a failure rate above `max_per_min`, the verdict
/// is [`Verdict::Panic`]. Otherwise [`Verdict::Restart`] after
/// `restart_delay`.
#[derive(Debug, Clone)]
pub struct ThrottledFailurePolicy {
    pub window: ChronoDuration,
    pub min_attempts: usize,
    pub max_per_min: f64,
    pub restart_delay: Duration,
}

impl Default for ThrottledFailurePolicy {
    fn default() -> Self {
        Self {
            window: ChronoDuration::minutes(20),
            min_attempts: 5,
            max_per_min: 1.0,
            restart_delay: Duration::from_secs(30),
        }
    }
}

impl ThrottledFailurePolicy {
    pub fn from_config(cfg: &SupervisorConfig) -> Self {
        Self {
            window: ChronoDuration::minutes(cfg.failure_window_mins as i64),
            min_attempts: cfg.failure_min_attempts,
            max_per_min: cfg.failure_max_per_min,
            restart_delay: Duration::from_secs(cfg.restart_delay_secs),
        }
    }
}

impl FailurePolicy for ThrottledFailurePolicy {
    fn verdict(&self, attempts: &[RunAttempt], now: DateTime<Utc>) -> Verdict {
        let cutoff = now - self.window;
        let recent: Vec<&RunAttempt> = attempts
            .iter()
            .filter(|a| a.failed_at.is_some_and(|t| t > cutoff))
            .collect();

        if recent.len() >= self.min_attempts {
            // Span from the earliest recent *failure* to now, floored at one
            // second so simultaneous failures keep the rate finite. Anchoring
            // at failure time, not start time, keeps one long-lived run from
            // diluting the rate of the crash-loop that follows it.
            if let Some(earliest) = recent.iter().filter_map(|a| a.failed_at).min() {
                let span_secs = ((now - earliest).num_milliseconds() as f64 / 1000.0).max(1.0);
                let rate = recent.len() as f64 / (span_secs / 60.0);
                if rate > self.max_per_min {
                    return Verdict::Panic;
                }
            }
        }

        Verdict::Restart {
            delay: self.restart_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_attempt(now: DateTime<Utc>, mins_ago: i64) -> RunAttempt {
        let t = now - ChronoDuration::minutes(mins_ago);
        RunAttempt {
            started: t,
            failed_at: Some(t),
        }
    }

    #[test]
    fn five_fast_failures_panic() {
        let now = Utc::now();
        let policy = ThrottledFailurePolicy::default();
        // 5 failures over the last 2 minutes: rate 2.5/min.
        let attempts: Vec<_> = (0..5).map(|i| failed_attempt(now, i.min(2))).collect();
        assert_eq!(policy.verdict(&attempts, now), Verdict::Panic);
    }

    #[test]
    fn four_failures_restart() {
        let now = Utc::now();
        let policy = ThrottledFailurePolicy::default();
        let attempts: Vec<_> = (0..4).map(|_| failed_attempt(now, 1)).collect();
        assert_eq!(
            policy.verdict(&attempts, now),
            Verdict::Restart {
                delay: Duration::from_secs(30)
            }
        );
    }

    #[test]
    fn long_run_then_crash_loop_panics() {
        let now = Utc::now();
        let policy = ThrottledFailurePolicy::default();
        // One run that was stable for half an hour before failing, followed
        // by four instant failures: five failures inside two minutes. The
        // old start time must not dilute the rate.
        let mut attempts = vec![RunAttempt {
            started: now - ChronoDuration::minutes(30),
            failed_at: Some(now - ChronoDuration::minutes(2)),
        }];
        attempts.extend([90, 60, 30, 1].iter().map(|&s| {
            let t = now - ChronoDuration::seconds(s);
            RunAttempt {
                started: t,
                failed_at: Some(t),
            }
        }));
        assert_eq!(policy.verdict(&attempts, now), Verdict::Panic);
    }

    #[test]
    fn five_slow_failures_restart() {
        let now = Utc::now();
        let policy = ThrottledFailurePolicy::default();
        // 5 failures spread over 19 minutes: rate ~0.26/min.
        let attempts: Vec<_> = [19, 15, 10, 5, 1]
            .iter()
            .map(|&m| failed_attempt(now, m))
            .collect();
        assert_eq!(
            policy.verdict(&attempts, now),
            Verdict::Restart {
                delay: Duration::from_secs(30)
            }
        );
    }

    #[test]
    fn old_failures_fall_out_of_the_window() {
        let now = Utc::now();
        let policy = ThrottledFailurePolicy::default();
        // 5 failures, but only 2 inside the 20-minute window.
        let attempts: Vec<_> = [90, 60, 40, 2, 1]
            .iter()
            .map(|&m| failed_attempt(now, m))
            .collect();
        assert_eq!(
            policy.verdict(&attempts, now),
            Verdict::Restart {
                delay: Duration::from_secs(30)
            }
        );
    }

    #[test]
    fn clean_exits_do_not_count_toward_panic() {
        let now = Utc::now();
        let policy = ThrottledFailurePolicy::default();
        let attempts: Vec<_> = (0..10)
            .map(|i| RunAttempt {
                started: now - ChronoDuration::minutes(i),
                failed_at: None,
            })
            .collect();
        assert_eq!(
            policy.verdict(&attempts, now),
            Verdict::Restart {
                delay: Duration::from_secs(30)
            }
        );
    }

    #[test]
    fn config_overrides_apply() {
        let cfg = SupervisorConfig {
            restart_delay_secs: 5,
            failure_window_mins: 10,
            failure_min_attempts: 2,
            failure_max_per_min: 0.5,
        };
        let policy = ThrottledFailurePolicy::from_config(&cfg);
        let now = Utc::now();
        let attempts: Vec<_> = (0..2).map(|_| failed_attempt(now, 1)).collect();
        assert_eq!(policy.verdict(&attempts, now), Verdict::Panic);
    }
}
