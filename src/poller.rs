//! Waiting for a run to reach a terminal state.
//!
//! The loop is cooperative: cancellation is checked immediately before each
//! status fetch and never during the sleep, so a cancel request is honoured
//! within one poll interval. Fetch errors are never retried here; the
//! transport already retries transient failures before giving up.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::{HexError, Result};
use crate::models::{RunStatus, RunStatusRecord};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Called with the fetched record whenever the status differs from the
/// previous tick, and once more with the terminal record.
pub type StatusCallback = Box<dyn Fn(&RunStatusRecord) + Send + Sync>;

/// Polling config for `wait_for_run` / [`poll_until_terminal`].
pub struct PollOptions {
    /// Default: 5s. Must be non-zero.
    pub poll_interval: Duration,
    /// Give up with [`HexError::Timeout`] after this long. Default: no limit.
    pub max_duration: Option<Duration>,
    pub on_status_change: Option<StatusCallback>,
    /// Cancelling the token ends the wait with [`PollOutcome::Cancelled`].
    pub cancel: Option<CancellationToken>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_duration: None,
            on_status_change: None,
            cancel: None,
        }
    }
}

impl PollOptions {
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_duration(mut self, max: Duration) -> Self {
        self.max_duration = Some(max);
        self
    }

    #[must_use]
    pub fn on_status_change(mut self, cb: impl Fn(&RunStatusRecord) + Send + Sync + 'static) -> Self {
        self.on_status_change = Some(Box::new(cb));
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn notify(&self, record: &RunStatusRecord) {
        if let Some(ref cb) = self.on_status_change {
            cb(record);
        }
    }
}

impl fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOptions")
            .field("poll_interval", &self.poll_interval)
            .field("max_duration", &self.max_duration)
            .field("on_status_change", &self.on_status_change.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// How a wait ended when no error occurred.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The run reached a terminal status. Runs that ended `FAILED`, `ERRORED`
    /// or `KILLED` land here too, with `error` populated when the API sent one.
    Finished(RunStatusRecord),
    /// The caller cancelled before the run finished.
    Cancelled { last_status: Option<RunStatus> },
}

impl PollOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PollOutcome::Cancelled { .. })
    }
}

/// Per-invocation bookkeeping, dropped when the loop exits.
struct PollState {
    last_status: Option<RunStatus>,
    attempts: u32,
    started: Instant,
}

/// Call `fetch` every `poll_interval` until it yields a terminal status.
///
/// Any error from `fetch` ends the wait and is returned as-is.
///
/// # Errors
///
/// - [`HexError::InvalidInput`] if `poll_interval` is zero.
/// - [`HexError::Timeout`] if `max_duration` is set and exceeded.
/// - Whatever `fetch` returns.
pub async fn poll_until_terminal<F, Fut>(mut fetch: F, opts: &PollOptions) -> Result<PollOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RunStatusRecord>>,
{
    if opts.poll_interval.is_zero() {
        return Err(HexError::InvalidInput(
            "poll interval must be greater than zero".into(),
        ));
    }

    let mut state = PollState {
        last_status: None,
        attempts: 0,
        started: Instant::now(),
    };

    loop {
        if opts.is_cancelled() {
            tracing::info!(attempts = state.attempts, "polling cancelled");
            return Ok(PollOutcome::Cancelled {
                last_status: state.last_status,
            });
        }

        if let Some(max) = opts.max_duration {
            if state.started.elapsed() >= max {
                return Err(HexError::Timeout(max));
            }
        }

        let record = fetch().await?;
        state.attempts += 1;

        let changed = state.last_status != Some(record.status);
        state.last_status = Some(record.status);
        tracing::debug!(attempt = state.attempts, status = %record.status, changed, "poll tick");

        if record.status.is_terminal() {
            tracing::info!(run_id = %record.run_id, status = %record.status, "run finished");
            opts.notify(&record);
            return Ok(PollOutcome::Finished(record));
        }

        if changed {
            opts.notify(&record);
        }

        tokio::time::sleep(opts.poll_interval).await;
    }
}
