//! Tracks one remote job to a terminal state.
//!
//! A session is a single tokio task running query, settle, sleep in sequence,
//! so at most one status query per session is ever in flight. Callbacks are
//! delivered only while holding the session's observer lock and only while
//! the session is still polling; `cancel` flips the state and then takes that
//! lock to drop the observer, so nothing is delivered after `cancel` returns.

use crate::api::{QueryError, StatusSource};
use crate::cache::{JobCacheRecord, SlotKey, TtlCache};
use crate::config;
use crate::errors::Error;
use crate::estimate;
use crate::job::{Job, JobStatus, StatusGroup};
use crate::logging::*;
use std::result::Result;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;
use thiserror::Error as ThisError;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, sleep, sleep_until};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
    pub max_wait: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
            max_consecutive_errors: 10,
            max_wait: Duration::from_secs(5 * 60),
        }
    }
}

impl PollerConfig {
    /// [`PollerConfig::default`] with any `POLL_*` settings applied.
    pub fn from_config() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            interval: config::get_duration_or("POLL_INTERVAL", defaults.interval)?,
            max_attempts: config::get_parsed_or("POLL_MAX_ATTEMPTS", defaults.max_attempts)?,
            max_consecutive_errors: config::get_parsed_or(
                "POLL_MAX_CONSECUTIVE_ERRORS",
                defaults.max_consecutive_errors,
            )?,
            max_wait: config::get_duration_or("POLL_MAX_WAIT", defaults.max_wait)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        self != PollState::Polling
    }
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum FailureReason {
    /// The service reported a failure status. Never retried.
    #[error("{message}")]
    Remote { status: JobStatus, message: String },
    #[error(
        "unable to get video status: {consecutive_errors} consecutive checks failed (last error: {last_error})"
    )]
    Connectivity {
        consecutive_errors: u32,
        last_error: QueryError,
    },
    /// Attempt cap or wall-clock ceiling reached while the job was still running.
    #[error("exceeded wait time: job not finished after {attempts} status checks in {elapsed_secs}s")]
    TimedOut { attempts: u32, elapsed_secs: u64 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl FailureReason {
    /// True when the session gave up waiting rather than the job failing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FailureReason::TimedOut { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { result_url: Option<String> },
    Failure(FailureReason),
    Cancelled,
}

impl Outcome {
    fn state(&self) -> PollState {
        match self {
            Outcome::Success { .. } => PollState::Completed,
            Outcome::Failure(reason) if reason.is_timeout() => PollState::TimedOut,
            Outcome::Failure(_) => PollState::Failed,
            Outcome::Cancelled => PollState::Cancelled,
        }
    }
}

/// Receives progress and the single terminal event of a session.
///
/// Callbacks run on the session's task. They may call back into the
/// [`PollHandle`] (`state`, `progress`, `cancel`); cancelling from
/// `on_update` suppresses every later callback.
pub trait PollObserver: Send + 'static {
    fn on_update(&mut self, percentage: u8);
    fn on_terminal(&mut self, outcome: &Outcome);
}

pub struct FnObserver<U, T> {
    on_update: U,
    on_terminal: T,
}

impl<U, T> PollObserver for FnObserver<U, T>
where
    U: FnMut(u8) + Send + 'static,
    T: FnMut(&Outcome) + Send + 'static,
{
    fn on_update(&mut self, percentage: u8) {
        (self.on_update)(percentage)
    }

    fn on_terminal(&mut self, outcome: &Outcome) {
        (self.on_terminal)(outcome)
    }
}

pub fn observer<U, T>(on_update: U, on_terminal: T) -> FnObserver<U, T>
where
    U: FnMut(u8) + Send + 'static,
    T: FnMut(&Outcome) + Send + 'static,
{
    FnObserver {
        on_update,
        on_terminal,
    }
}

struct Shared {
    state: Mutex<PollState>,
    progress: AtomicU8,
    /// Held for the whole of every callback.
    observer: Mutex<Option<Box<dyn PollObserver>>>,
    /// Thread currently inside a callback, so `cancel` from within one does
    /// not wait on the observer lock it already holds.
    dispatcher: Mutex<Option<ThreadId>>,
    cancelled: Notify,
}

// a panicking observer must not wedge the session
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears the dispatching thread even if the callback panics.
struct DispatcherReset<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for DispatcherReset<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

impl Shared {
    fn new(observer: Box<dyn PollObserver>) -> Self {
        Self {
            state: Mutex::new(PollState::Polling),
            progress: AtomicU8::new(0),
            observer: Mutex::new(Some(observer)),
            dispatcher: Mutex::new(None),
            cancelled: Notify::new(),
        }
    }

    fn state(&self) -> PollState {
        *lock(&self.state)
    }

    fn progress(&self) -> u8 {
        self.progress.load(Ordering::SeqCst)
    }

    fn dispatch(&self, observer: &mut dyn PollObserver, deliver: impl FnOnce(&mut dyn PollObserver)) {
        *lock(&self.dispatcher) = Some(thread::current().id());
        let _reset = DispatcherReset(&self.dispatcher);
        deliver(observer);
    }

    /// Delivers a progress update unless the session already ended.
    fn update(&self, percentage: u8) -> bool {
        let mut observer = lock(&self.observer);
        if self.state() != PollState::Polling {
            return false;
        }
        self.progress.store(percentage, Ordering::SeqCst);
        if let Some(observer) = observer.as_mut() {
            self.dispatch(&mut **observer, |o| o.on_update(percentage));
        }
        if self.state() != PollState::Polling {
            // cancelled from inside the callback
            observer.take();
        }
        true
    }

    /// Ends the session with `outcome` unless it already ended, in which case
    /// the outcome that won is returned.
    fn finish(&self, outcome: Outcome) -> Outcome {
        let mut observer = lock(&self.observer);
        {
            let mut state = lock(&self.state);
            if *state != PollState::Polling {
                observer.take();
                return Outcome::Cancelled;
            }
            *state = outcome.state();
        }
        if let Some(mut observer) = observer.take() {
            self.dispatch(&mut *observer, |o| o.on_terminal(&outcome));
        }
        outcome
    }

    fn cancel(&self) -> bool {
        {
            let mut state = lock(&self.state);
            if *state != PollState::Polling {
                return false;
            }
            *state = PollState::Cancelled;
        }
        self.cancelled.notify_one();
        // waits out a callback running on another thread; from inside a
        // callback the state change alone stops further delivery
        if *lock(&self.dispatcher) != Some(thread::current().id()) {
            lock(&self.observer).take();
        }
        true
    }
}

/// Handle to a running session. Dropping it leaves the session running.
pub struct PollHandle {
    job_id: String,
    shared: Arc<Shared>,
    task: JoinHandle<Outcome>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn state(&self) -> PollState {
        self.shared.state()
    }

    /// Highest percentage delivered so far.
    pub fn progress(&self) -> u8 {
        self.shared.progress()
    }

    /// Stops the session. No callback fires once this returns; a query in
    /// flight is abandoned and its result discarded. Idempotent.
    pub fn cancel(&self) {
        if self.shared.cancel() {
            debug!(DEFAULT, "poll session cancelled"; "job_id" => &self.job_id);
        }
    }

    pub async fn wait(self) -> Result<Outcome, JoinError> {
        self.task.await
    }

    /// Waits for the session to end, cancelling it first if `stop` resolves.
    pub async fn wait_or_cancel<F>(mut self, stop: F) -> Result<Outcome, JoinError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            outcome = &mut self.task => return outcome,
            _ = stop => self.cancel(),
        }
        self.task.await
    }
}

/// Client-side bookkeeping for one tracking attempt.
struct PollSession {
    job_id: String,
    slot: Option<SlotKey>,
    started_at: Instant,
    expected_duration_secs: f64,
    attempt_count: u32,
    consecutive_errors: u32,
    last_known_progress: u8,
}

impl PollSession {
    fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

pub struct JobStatusPoller {
    source: Arc<dyn StatusSource>,
    config: PollerConfig,
    cache: Option<TtlCache>,
}

impl JobStatusPoller {
    pub fn new(source: Arc<dyn StatusSource>, config: PollerConfig) -> Self {
        Self {
            source,
            config,
            cache: None,
        }
    }

    /// Sessions bound to a slot record every observed status in `cache`.
    pub fn with_cache(mut self, cache: TtlCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn start<O: PollObserver>(
        &self,
        job_id: &str,
        expected_duration_secs: f64,
        observer: O,
    ) -> Result<PollHandle, Error> {
        self.spawn(job_id, None, expected_duration_secs, Box::new(observer))
    }

    pub fn start_for_slot<O: PollObserver>(
        &self,
        slot: SlotKey,
        job_id: &str,
        expected_duration_secs: f64,
        observer: O,
    ) -> Result<PollHandle, Error> {
        self.spawn(job_id, Some(slot), expected_duration_secs, Box::new(observer))
    }

    fn spawn(
        &self,
        job_id: &str,
        slot: Option<SlotKey>,
        expected_duration_secs: f64,
        mut observer: Box<dyn PollObserver>,
    ) -> Result<PollHandle, Error> {
        let invalid = if job_id.trim().is_empty() {
            Some("job id is empty".to_string())
        } else if !(expected_duration_secs.is_finite() && expected_duration_secs > 0.0) {
            Some(format!(
                "expected duration must be positive, got {}",
                expected_duration_secs
            ))
        } else {
            None
        };
        if let Some(msg) = invalid {
            observer.on_terminal(&Outcome::Failure(FailureReason::InvalidInput(msg.clone())));
            return Err(Error::InvalidInput(msg));
        }

        let shared = Arc::new(Shared::new(observer));
        let session = PollSession {
            job_id: job_id.to_string(),
            slot,
            started_at: Instant::now(),
            expected_duration_secs,
            attempt_count: 0,
            consecutive_errors: 0,
            last_known_progress: 0,
        };
        let runner = Runner {
            source: Arc::clone(&self.source),
            config: self.config.clone(),
            cache: self.cache.clone(),
            shared: Arc::clone(&shared),
        };
        let task = tokio::spawn(runner.run(session));

        Ok(PollHandle {
            job_id: job_id.to_string(),
            shared,
            task,
        })
    }
}

struct Runner {
    source: Arc<dyn StatusSource>,
    config: PollerConfig,
    cache: Option<TtlCache>,
    shared: Arc<Shared>,
}

enum Tick {
    Continue,
    Done(Outcome),
}

impl Runner {
    async fn run(self, mut session: PollSession) -> Outcome {
        let log = DEFAULT.new(o!(
            "function" => "poller::run",
            "job_id" => session.job_id.clone(),
            "expected_secs" => session.expected_duration_secs,
        ));
        info!(log, "polling started");

        // the ceiling holds even while a query hangs
        let deadline = session.started_at + self.config.max_wait;
        loop {
            tokio::select! {
                biased;
                _ = self.shared.cancelled.notified() => return Outcome::Cancelled,
                _ = sleep(self.config.interval) => {}
                _ = sleep_until(deadline) => return self.finish(&log, self.timed_out(&session)),
            }

            session.attempt_count += 1;
            let result = tokio::select! {
                biased;
                _ = self.shared.cancelled.notified() => return Outcome::Cancelled,
                result = self.source.fetch_status(&session.job_id) => result,
                _ = sleep_until(deadline) => {
                    warn!(log, "status query still pending at the wait ceiling");
                    return self.finish(&log, self.timed_out(&session));
                }
            };

            let tick = match result {
                Ok(job) => self.on_status(&log, &mut session, job).await,
                Err(err) => self.on_query_error(&log, &mut session, err),
            };
            if let Tick::Done(outcome) = tick {
                return self.finish(&log, outcome);
            }

            if session.attempt_count >= self.config.max_attempts
                || session.elapsed() >= self.config.max_wait
            {
                return self.finish(&log, self.timed_out(&session));
            }
        }
    }

    fn finish(&self, log: &Logger, outcome: Outcome) -> Outcome {
        let outcome = self.shared.finish(outcome);
        match &outcome {
            Outcome::Success { result_url } => {
                info!(log, "job completed"; "result_url" => ?result_url)
            }
            Outcome::Failure(reason) => warn!(log, "job failed"; "reason" => %reason),
            Outcome::Cancelled => debug!(log, "session cancelled"),
        }
        outcome
    }

    fn timed_out(&self, session: &PollSession) -> Outcome {
        Outcome::Failure(FailureReason::TimedOut {
            attempts: session.attempt_count,
            elapsed_secs: session.elapsed().as_secs(),
        })
    }

    fn on_query_error(&self, log: &Logger, session: &mut PollSession, err: QueryError) -> Tick {
        session.consecutive_errors += 1;
        warn!(log, "status query failed";
            "attempt" => session.attempt_count,
            "consecutive_errors" => session.consecutive_errors,
            "error" => %err,
        );
        if session.consecutive_errors >= self.config.max_consecutive_errors {
            return Tick::Done(Outcome::Failure(FailureReason::Connectivity {
                consecutive_errors: session.consecutive_errors,
                last_error: err,
            }));
        }
        Tick::Continue
    }

    async fn on_status(&self, log: &Logger, session: &mut PollSession, job: Job) -> Tick {
        session.consecutive_errors = 0;

        let group = job.status.group();
        let percentage = match group {
            StatusGroup::Succeeded => 100,
            StatusGroup::Failed => session.last_known_progress,
            StatusGroup::Queued | StatusGroup::Active | StatusGroup::Unrecognized => {
                estimate::estimate(
                    &job.status,
                    session.elapsed().as_secs_f64(),
                    session.expected_duration_secs,
                    job.reported_progress,
                )
            }
        };
        session.last_known_progress = session.last_known_progress.max(percentage);
        debug!(log, "status";
            "attempt" => session.attempt_count,
            "status" => job.status.as_str(),
            "progress" => session.last_known_progress,
        );

        self.record(log, session, &job).await;

        match group {
            StatusGroup::Succeeded => {
                self.shared.update(100);
                Tick::Done(Outcome::Success {
                    result_url: job.result_url,
                })
            }
            StatusGroup::Failed => Tick::Done(Outcome::Failure(FailureReason::Remote {
                message: job.failure_message(),
                status: job.status,
            })),
            StatusGroup::Queued | StatusGroup::Active | StatusGroup::Unrecognized => {
                if group == StatusGroup::Unrecognized {
                    warn!(log, "unrecognized status, still polling"; "status" => job.status.as_str());
                }
                self.shared.update(session.last_known_progress);
                Tick::Continue
            }
        }
    }

    async fn record(&self, log: &Logger, session: &PollSession, job: &Job) {
        let (Some(cache), Some(slot)) = (&self.cache, &session.slot) else {
            return;
        };
        let record = JobCacheRecord::from_job(job, session.last_known_progress);
        if let Err(err) = cache.save_job_record(slot, &record).await {
            warn!(log, "failed to cache job status"; "slot" => slot.to_string(), "error" => %err);
        }
    }
}
