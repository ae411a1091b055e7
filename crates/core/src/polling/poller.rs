//! Await-and-reschedule status polling
//!
//! One status check is outstanding at a time: the loop sleeps for the
//! interval, awaits the check, and only then schedules the next one, so slow
//! responses never overlap.

use std::future::Future;
use std::time::Duration;

use kompete_domain::constants::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_CONSECUTIVE_ERRORS, DEFAULT_POLL_MAX_DURATION_SECS,
    GENERATION_FAILED_MESSAGE,
};
use kompete_domain::{JobStatus, JobStatusResponse, KompeteError, PollingConfig, Result};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Cadence and ceilings of a poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Wall-clock ceiling measured from the start of the loop.
    pub max_duration: Duration,
    /// Consecutive failed checks tolerated before giving up.
    pub max_consecutive_errors: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_duration: Duration::from_secs(DEFAULT_POLL_MAX_DURATION_SECS),
            max_consecutive_errors: DEFAULT_POLL_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

impl From<&PollingConfig> for PollerConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_duration: Duration::from_secs(config.max_duration_secs),
            max_consecutive_errors: config.max_consecutive_errors.max(1),
        }
    }
}

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// Job succeeded and its data was fetched.
    Succeeded(T),
    /// Job reported `failed`; carries the backend message or a generic one.
    Failed(String),
    /// The wall-clock ceiling elapsed before a terminal status.
    TimedOut,
    /// Too many consecutive checks failed.
    Unreachable { last_error: KompeteError },
    /// A non-transient error (authentication, or the final data fetch).
    Errored(KompeteError),
    Cancelled,
}

impl<T> PollOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Polls a job's status endpoint until it reaches a terminal state
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPoller {
    config: PollerConfig,
}

impl StatusPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Run the loop.
    ///
    /// `on_status` observes every successfully checked status, terminal ones
    /// included. On `success`, `fetch` is invoked exactly once; on `failed`
    /// it is never invoked.
    pub async fn poll<T, C, CFut, F, FFut, S>(
        &self,
        mut check: C,
        fetch: F,
        mut on_status: S,
        cancel: &CancellationToken,
    ) -> PollOutcome<T>
    where
        C: FnMut() -> CFut,
        CFut: Future<Output = Result<JobStatusResponse>>,
        F: FnOnce() -> FFut,
        FFut: Future<Output = Result<T>>,
        S: FnMut(JobStatus),
    {
        let started = Instant::now();
        let mut consecutive_errors = 0u32;
        let mut ticks = 0u32;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            if started.elapsed() >= self.config.max_duration {
                warn!(
                    ticks,
                    elapsed_secs = started.elapsed().as_secs(),
                    "status polling exceeded its time limit"
                );
                return PollOutcome::TimedOut;
            }

            ticks += 1;
            let checked = tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                checked = check() => checked,
            };

            let response = match checked {
                Ok(response) => response,
                Err(err) if !err.is_transient() => {
                    warn!(ticks, error = %err, kind = err.label(), "status polling aborted");
                    return PollOutcome::Errored(err);
                }
                Err(err) => {
                    consecutive_errors += 1;
                    warn!(
                        ticks,
                        consecutive_errors,
                        error = %err,
                        kind = err.label(),
                        "status check failed, retrying"
                    );
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        return PollOutcome::Unreachable { last_error: err };
                    }
                    continue;
                }
            };

            consecutive_errors = 0;
            debug!(ticks, status = %response.status, "status checked");
            on_status(response.status);

            match response.status {
                JobStatus::Success => {
                    return tokio::select! {
                        _ = cancel.cancelled() => PollOutcome::Cancelled,
                        fetched = fetch() => match fetched {
                            Ok(data) => PollOutcome::Succeeded(data),
                            Err(err) => PollOutcome::Errored(err),
                        },
                    };
                }
                JobStatus::Failed => {
                    let message = response
                        .error_message
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| GENERATION_FAILED_MESSAGE.to_string());
                    return PollOutcome::Failed(message);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    fn fast() -> StatusPoller {
        StatusPoller::new(PollerConfig {
            interval: Duration::from_millis(3000),
            max_duration: Duration::from_secs(60),
            max_consecutive_errors: 3,
        })
    }

    fn scripted(
        script: Vec<Result<JobStatusResponse>>,
    ) -> (Arc<AtomicUsize>, impl FnMut() -> futures::future::Ready<Result<JobStatusResponse>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let queue = Arc::new(Mutex::new(VecDeque::from(script)));
        let counter = calls.clone();
        let check = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let next = queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(JobStatusResponse::new(JobStatus::Generating)));
            futures::future::ready(next)
        };
        (calls, check)
    }

    #[tokio::test(start_paused = true)]
    async fn failed_without_message_uses_generic_text() {
        let (_, check) = scripted(vec![Ok(JobStatusResponse::new(JobStatus::Failed))]);
        let outcome = fast()
            .poll(check, || async { Ok(()) }, |_| {}, &CancellationToken::new())
            .await;
        assert_eq!(outcome, PollOutcome::Failed(GENERATION_FAILED_MESSAGE.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_then_reset() {
        let (calls, check) = scripted(vec![
            Err(KompeteError::Network("reset".into())),
            Err(KompeteError::Network("reset".into())),
            Ok(JobStatusResponse::new(JobStatus::Comparing)),
            Err(KompeteError::Network("reset".into())),
            Ok(JobStatusResponse::new(JobStatus::Success)),
        ]);
        let outcome = fast().poll(check, || async { Ok(7) }, |_| {}, &CancellationToken::new()).await;
        assert_eq!(outcome, PollOutcome::Succeeded(7));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_errors_stop_the_loop() {
        let (calls, check) = scripted(
            (0..10).map(|_| Err(KompeteError::Backend("Request failed".into()))).collect(),
        );
        let outcome = fast().poll(check, || async { Ok(()) }, |_| {}, &CancellationToken::new()).await;
        assert!(matches!(outcome, PollOutcome::Unreachable { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_error_aborts_immediately() {
        let (calls, check) = scripted(vec![Err(KompeteError::Auth("expired".into()))]);
        let outcome = fast().poll(check, || async { Ok(()) }, |_| {}, &CancellationToken::new()).await;
        assert!(matches!(outcome, PollOutcome::Errored(ref e) if e.is_auth()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn never_terminal_job_times_out() {
        let (calls, check) = scripted(Vec::new());
        let outcome = fast().poll(check, || async { Ok(()) }, |_| {}, &CancellationToken::new()).await;
        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(calls.load(Ordering::SeqCst), 19);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_between_ticks() {
        let (calls, check) = scripted(Vec::new());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(7000)).await;
            trigger.cancel();
        });

        let outcome = fast().poll(check, || async { Ok(()) }, |_| {}, &cancel).await;
        assert!(outcome.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_checks_never_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let starts = Arc::new(Mutex::new(Vec::new()));
        let check = {
            let (in_flight, peak, starts) = (in_flight.clone(), peak.clone(), starts.clone());
            move || {
                let (in_flight, peak, starts) = (in_flight.clone(), peak.clone(), starts.clone());
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    starts.lock().push(Instant::now());
                    tokio::time::sleep(Duration::from_millis(5000)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    let status = if starts.lock().len() == 4 {
                        JobStatus::Success
                    } else {
                        JobStatus::Comparing
                    };
                    Ok(JobStatusResponse::new(status))
                }
            }
        };

        let outcome = fast().poll(check, || async { Ok(()) }, |_| {}, &CancellationToken::new()).await;

        assert_eq!(outcome, PollOutcome::Succeeded(()));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        let starts = starts.lock().clone();
        assert_eq!(starts.len(), 4);
        for pair in starts.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_millis(8000));
        }
    }

    #[test]
    fn config_conversion_clamps_error_ceiling() {
        let config = PollerConfig::from(&PollingConfig {
            interval_ms: 500,
            max_duration_secs: 10,
            max_consecutive_errors: 0,
        });
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.max_consecutive_errors, 1);
    }
}
