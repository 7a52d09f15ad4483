//! Recurring Scheduler: fires an auto-apply pass once shortly after launch and
//! then on a fixed interval, never letting two passes overlap.
//!
//! Every trigger runs on its own task. A trigger that arrives while a pass is in
//! flight is dropped, not queued. A failed pass is logged and the schedule keeps
//! going.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::auto_apply::service::PassSummary;
use crate::errors::PassError;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(30);

/// Anything that can run one full pass.
#[async_trait]
pub trait PassRunner: Send + Sync {
    async fn run_pass(&self) -> Result<PassSummary, PassError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub interval: Duration,
    pub startup_delay: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            startup_delay: DEFAULT_STARTUP_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Startup,
    Interval,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSource::Startup => write!(f, "startup"),
            TriggerSource::Interval => write!(f, "interval"),
        }
    }
}

#[derive(Debug)]
pub enum TriggerOutcome {
    Completed(PassSummary),
    Failed(String),
    /// Another pass held the running flag.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassRecord {
    Completed { summary: PassSummary },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct LastPass {
    pub source: TriggerSource,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: PassRecord,
}

/// Point-in-time view for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerSnapshot {
    pub state: RunState,
    pub started: bool,
    pub interval_secs: u64,
    pub startup_delay_secs: u64,
    pub passes_run: u64,
    pub passes_skipped: u64,
    pub last_pass: Option<LastPass>,
}

struct SchedulerState {
    run_state: RunState,
    passes_run: u64,
    passes_skipped: u64,
    last_pass: Option<LastPass>,
}

struct SchedulerInner {
    runner: Arc<dyn PassRunner>,
    config: ScheduleConfig,
    state: Mutex<SchedulerState>,
    /// Present while started; cancelling it stops both timers.
    timers: Mutex<Option<CancellationToken>>,
}

/// Cheap to clone; clones share one schedule and one running flag.
#[derive(Clone)]
pub struct AutoApplyScheduler {
    inner: Arc<SchedulerInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds the running flag; dropping it always returns the scheduler to idle.
struct RunningGuard<'a> {
    inner: &'a SchedulerInner,
}

impl<'a> RunningGuard<'a> {
    fn acquire(inner: &'a SchedulerInner) -> Option<Self> {
        let mut state = lock(&inner.state);
        if state.run_state == RunState::Running {
            return None;
        }
        state.run_state = RunState::Running;
        Some(Self { inner })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        lock(&self.inner.state).run_state = RunState::Idle;
    }
}

impl AutoApplyScheduler {
    pub fn new(runner: Arc<dyn PassRunner>, config: ScheduleConfig) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                runner,
                config,
                state: Mutex::new(SchedulerState {
                    run_state: RunState::Idle,
                    passes_run: 0,
                    passes_skipped: 0,
                    last_pass: None,
                }),
                timers: Mutex::new(None),
            }),
        }
    }

    /// Arms the startup trigger and the recurring interval.
    ///
    /// Returns `false` without side effects when already started. Must be
    /// called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut timers = lock(&self.inner.timers);
        if timers.is_some() {
            debug!("Auto-apply scheduler already started");
            return false;
        }

        let cancel = CancellationToken::new();
        tokio::spawn(run_startup_timer(self.clone(), cancel.clone()));
        tokio::spawn(run_interval_timer(self.clone(), cancel.clone()));
        *timers = Some(cancel);

        info!(
            "Auto-apply scheduler started: first pass in {}s, then every {}s",
            self.inner.config.startup_delay.as_secs(),
            self.inner.config.interval.as_secs()
        );
        true
    }

    /// Cancels the recurring interval and any pending startup trigger.
    ///
    /// A pass already in flight runs to completion. Returns `false` when the
    /// scheduler was not started.
    pub fn stop(&self) -> bool {
        match lock(&self.inner.timers).take() {
            Some(cancel) => {
                cancel.cancel();
                info!("Auto-apply scheduler stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_started(&self) -> bool {
        lock(&self.inner.timers).is_some()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.state).run_state == RunState::Running
    }

    /// Runs one pass unless another is in flight.
    pub async fn trigger(&self, source: TriggerSource) -> TriggerOutcome {
        let Some(_guard) = RunningGuard::acquire(&self.inner) else {
            info!("Auto-apply pass already running, skipping {source} trigger");
            lock(&self.inner.state).passes_skipped += 1;
            return TriggerOutcome::Skipped;
        };

        info!("Auto-apply pass triggered by {source}");
        let result = self.inner.runner.run_pass().await;

        let (outcome, record) = match result {
            Ok(summary) => (
                TriggerOutcome::Completed(summary.clone()),
                PassRecord::Completed { summary },
            ),
            Err(e) => {
                error!("Auto-apply pass ({source}) failed: {e}");
                let message = e.to_string();
                (
                    TriggerOutcome::Failed(message.clone()),
                    PassRecord::Failed { error: message },
                )
            }
        };

        {
            let mut state = lock(&self.inner.state);
            state.passes_run += 1;
            state.last_pass = Some(LastPass {
                source,
                finished_at: Utc::now(),
                record,
            });
        }

        outcome
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let started = self.is_started();
        let state = lock(&self.inner.state);
        SchedulerSnapshot {
            state: state.run_state,
            started,
            interval_secs: self.inner.config.interval.as_secs(),
            startup_delay_secs: self.inner.config.startup_delay.as_secs(),
            passes_run: state.passes_run,
            passes_skipped: state.passes_skipped,
            last_pass: state.last_pass.clone(),
        }
    }

    fn spawn_trigger(&self, source: TriggerSource) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            match scheduler.trigger(source).await {
                TriggerOutcome::Completed(summary) => {
                    debug!("Scheduled {source} pass {} recorded", summary.run_id)
                }
                TriggerOutcome::Failed(message) => {
                    debug!("Scheduled {source} pass recorded as failed: {message}")
                }
                TriggerOutcome::Skipped => {}
            }
        });
    }
}

async fn run_startup_timer(scheduler: AutoApplyScheduler, cancel: CancellationToken) {
    let delay = scheduler.inner.config.startup_delay;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Startup trigger cancelled");
        }
        _ = tokio::time::sleep(delay) => {
            scheduler.spawn_trigger(TriggerSource::Startup);
        }
    }
}

async fn run_interval_timer(scheduler: AutoApplyScheduler, cancel: CancellationToken) {
    let period = scheduler.inner.config.interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Interval trigger cancelled");
                break;
            }
            _ = ticker.tick() => {
                scheduler.spawn_trigger(TriggerSource::Interval);
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
