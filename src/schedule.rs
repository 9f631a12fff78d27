//! Fixed-interval repetition of the tracking cycle
//!
//! The first cycle runs immediately. Afterwards the loop idles on a short
//! polling tick and starts a new cycle once the interval has elapsed since the
//! previous one finished. A shutdown signal ends the loop at any point, even
//! mid-cycle; rows already written stay written.

use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::tracker::{self, CycleReport};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

/// Intervals below this many hours ask the operator for confirmation first
pub const CONFIRM_BELOW_HOURS: f64 = 1.0;

/// Timing for a scheduled run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub interval: Duration,
    pub poll: Duration,
}

impl ScheduleSettings {
    /// Build settings from an interval in hours
    pub fn from_hours(interval_hours: f64, poll_secs: u64) -> Result<Self> {
        if !interval_hours.is_finite() || interval_hours <= 0.0 {
            return Err(Error::Validation(format!(
                "interval must be a positive number of hours, got {}",
                interval_hours
            )));
        }
        if poll_secs == 0 {
            return Err(Error::Validation("poll interval must be positive".to_string()));
        }
        Ok(Self {
            interval: Duration::from_secs_f64(interval_hours * 3600.0),
            poll: Duration::from_secs(poll_secs),
        })
    }
}

/// Whether an interval is short enough to risk being blocked
pub fn needs_confirmation(interval_hours: f64) -> bool {
    interval_hours < CONFIRM_BELOW_HOURS
}

/// Tracks when the next cycle is due
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    interval: Duration,
    next_run: Instant,
}

impl Schedule {
    /// A schedule whose first run is due at `now`
    pub fn starting_at(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_run: now,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_run
    }

    /// Record a finished run
    pub fn completed_at(&mut self, now: Instant) {
        self.next_run = now + self.interval;
    }

    pub fn next_run(&self) -> Instant {
        self.next_run
    }
}

/// Totals for a scheduled run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchSummary {
    pub cycles_completed: usize,
    pub cycles_failed: usize,
}

/// Repeat tracking cycles until Ctrl-C
pub async fn run_forever<C>(
    ctx: &AppContext,
    settings: ScheduleSettings,
    on_cycle: C,
) -> Result<WatchSummary>
where
    C: FnMut(&CycleReport),
{
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    run_until(ctx, settings, shutdown, on_cycle).await
}

/// Repeat tracking cycles until `shutdown` resolves
pub async fn run_until<S, C>(
    ctx: &AppContext,
    settings: ScheduleSettings,
    shutdown: S,
    mut on_cycle: C,
) -> Result<WatchSummary>
where
    S: Future<Output = ()>,
    C: FnMut(&CycleReport),
{
    tokio::pin!(shutdown);

    let mut summary = WatchSummary::default();
    let mut schedule = Schedule::starting_at(settings.interval, Instant::now());
    let mut ticker = tokio::time::interval(settings.poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if schedule.is_due(Instant::now()) {
            info!(
                "===== Price Tracking Job: {} =====",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Price tracker stopped during a cycle");
                    break;
                }
                result = tracker::run_once(ctx) => {
                    match result {
                        Ok(report) => {
                            summary.cycles_completed += 1;
                            on_cycle(&report);
                            info!("=== Tracking complete ===");
                        }
                        Err(e) => {
                            summary.cycles_failed += 1;
                            error!("Tracking cycle failed: {}", e);
                        }
                    }
                }
            }

            schedule.completed_at(Instant::now());
            continue;
        }

        tokio::select! {
            _ = &mut shutdown => {
                info!("Price tracker stopped");
                break;
            }
            _ = ticker.tick() => {}
        }
    }

    Ok(summary)
}
