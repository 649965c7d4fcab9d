//! Recurring execution of a batch job on a wall-clock cadence.
//!
//! One background tokio task per started scheduler. It runs the job once
//! immediately, then wakes up every `tick` and runs the job again once the
//! scheduled time has passed. Runs never overlap and a failing run never
//! stops the loop.

use std::{
    fmt,
    future::Future,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TICK: Duration = Duration::from_secs(60);
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(1);

/// A typed unit of recurring work
pub trait BatchJob {
    const NAME: &'static str;

    type Output: fmt::Display + Send;

    fn execute(&self) -> impl Future<Output = anyhow::Result<Self::Output>> + Send;
}

#[derive(Debug, Clone)]
pub enum Cadence {
    Every(Duration),
    Cron {
        expression: String,
        schedule: Box<cron::Schedule>,
    },
}

impl Cadence {
    pub fn hours(hours: u64) -> Self {
        Cadence::Every(Duration::from_secs(hours.saturating_mul(60 * 60)))
    }

    pub fn cron(expression: &str) -> Result<Self, cron::error::Error> {
        let schedule = cron::Schedule::from_str(expression)?;
        Ok(Cadence::Cron {
            expression: expression.to_string(),
            schedule: Box::new(schedule),
        })
    }

    /// Next run time after `now`; `None` once a cron schedule is exhausted
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Cadence::Every(interval) => chrono::Duration::from_std(*interval)
                .ok()
                .and_then(|interval| now.checked_add_signed(interval)),
            Cadence::Cron { schedule, .. } => schedule.after(&now).next(),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Every(interval) => write!(f, "every {}s", interval.as_secs()),
            Cadence::Cron { expression, .. } => write!(f, "cron '{expression}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LastRun {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: String,
    pub succeeded: bool,
}

/// Point-in-time snapshot of a scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleStatus {
    pub running: bool,
    pub cadence: String,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<LastRun>,
}

#[derive(Debug, Default)]
struct ScheduleState {
    running: bool,
    /// Bumped on every start so a detached loop from an earlier start
    /// cannot overwrite the state of the current one
    generation: u64,
    next_run: Option<DateTime<Utc>>,
    last_run: Option<LastRun>,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<ScheduleState>>,
    run_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ScheduleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.lock();
        state.running && state.generation == generation
    }
}

pub struct Scheduler {
    cadence: Cadence,
    tick: Duration,
    stop_grace: Duration,
    shared: Shared,
}

impl Scheduler {
    pub fn new(cadence: Cadence) -> Self {
        tracing::info!(%cadence, "Scheduler initialized");
        Self {
            cadence,
            tick: DEFAULT_TICK,
            stop_grace: DEFAULT_STOP_GRACE,
            shared: Shared {
                state: Arc::new(Mutex::new(ScheduleState::default())),
                run_lock: Arc::new(tokio::sync::Mutex::new(())),
            },
        }
    }

    /// How often the background loop checks whether a run is due
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Upper bound on how long [`Scheduler::stop`] waits for the loop to exit
    pub fn with_stop_grace(mut self, stop_grace: Duration) -> Self {
        self.stop_grace = stop_grace;
        self
    }

    /// Starts the background loop. Returns `false` if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<J>(&self, job: Arc<J>) -> bool
    where
        J: BatchJob + Send + Sync + 'static,
    {
        let mut state = self.shared.lock();
        if state.running {
            tracing::warn!("Scheduler is already running");
            return false;
        }

        let cancel = CancellationToken::new();
        state.running = true;
        state.generation += 1;
        state.next_run = Some(Utc::now());
        state.cancel = Some(cancel.clone());

        let handle = tokio::spawn(run_loop(
            job,
            self.cadence.clone(),
            self.tick,
            self.shared.clone(),
            state.generation,
            cancel,
        ));
        state.handle = Some(handle);

        tracing::info!(job = J::NAME, cadence = %self.cadence, "Scheduler started");
        true
    }

    /// Stops the background loop. Returns `false` if not running.
    ///
    /// A run already in progress is not interrupted; this waits up to the
    /// stop grace period for it and then detaches.
    pub async fn stop(&self) -> bool {
        let (cancel, handle) = {
            let mut state = self.shared.lock();
            if !state.running {
                tracing::warn!("Scheduler is not running");
                return false;
            }
            state.running = false;
            (state.cancel.take(), state.handle.take())
        };

        if let Some(cancel) = cancel {
            cancel.cancel();
        }

        if let Some(mut handle) = handle {
            if tokio::time::timeout(self.stop_grace, &mut handle)
                .await
                .is_err()
            {
                tracing::warn!("Scheduler loop still busy with a run, detaching");
            }
        }

        tracing::info!("Scheduler stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    /// Scheduled time of the next run, `None` when stopped
    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        let state = self.shared.lock();
        if !state.running {
            return None;
        }
        state.next_run
    }

    pub fn status(&self) -> ScheduleStatus {
        let state = self.shared.lock();
        ScheduleStatus {
            running: state.running,
            cadence: self.cadence.to_string(),
            next_run: state.next_run,
            last_run: state.last_run.clone(),
        }
    }
}

async fn run_loop<J>(
    job: Arc<J>,
    cadence: Cadence,
    tick: Duration,
    shared: Shared,
    generation: u64,
    cancel: CancellationToken,
) where
    J: BatchJob + Send + Sync + 'static,
{
    tracing::info!(job = J::NAME, "Scheduler loop started");

    execute(job.as_ref(), &shared, generation).await;
    let mut next_run = cadence.next_after(Utc::now());
    set_next_run(&shared, generation, next_run);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(tick) => {}
        }

        if !shared.is_current(generation) {
            break;
        }

        let Some(due) = next_run else {
            tracing::warn!(%cadence, "Schedule has no upcoming run, stopping loop");
            let mut state = shared.lock();
            if state.generation == generation {
                state.running = false;
                state.next_run = None;
            }
            break;
        };

        let now = Utc::now();
        if now >= due {
            execute(job.as_ref(), &shared, generation).await;
            next_run = cadence.next_after(now);
            set_next_run(&shared, generation, next_run);
            if let Some(next_run) = next_run {
                tracing::info!(%next_run, "Next run scheduled");
            }
        }
    }

    tracing::info!(job = J::NAME, "Scheduler loop exited");
}

async fn execute<J>(job: &J, shared: &Shared, generation: u64)
where
    J: BatchJob + Send + Sync + 'static,
{
    let _guard = shared.run_lock.lock().await;
    let started_at = Utc::now();
    tracing::info!(job = J::NAME, "Executing scheduled job");

    let (outcome, succeeded) = match job.execute().await {
        Ok(output) => {
            tracing::info!(job = J::NAME, %output, "Scheduled job completed");
            (output.to_string(), true)
        }
        Err(e) => {
            tracing::error!(job = J::NAME, error = ?e, "Error executing scheduled job");
            (format!("error: {e:#}"), false)
        }
    };

    let mut state = shared.lock();
    if state.generation == generation {
        state.last_run = Some(LastRun {
            started_at,
            finished_at: Utc::now(),
            outcome,
            succeeded,
        });
    }
}

fn set_next_run(shared: &Shared, generation: u64, next_run: Option<DateTime<Utc>>) {
    let mut state = shared.lock();
    if state.generation == generation {
        state.next_run = next_run;
    }
}
