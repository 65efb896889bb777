//! Fixed-interval progress polling for asynchronous batch jobs.
//!
//! Each submitted batch gets a [`BatchPoller`] that queries the job's
//! status every `interval` and publishes [`PollEvent`]s through a
//! `tokio::sync::mpsc` channel until the job completes or the poller is
//! stopped.  The returned [`PollHandle`] owns the loop's lifecycle: an
//! explicit [`stop`](PollHandle::stop), a drop of the handle, or job
//! completion all retire the loop, and a retired loop never schedules
//! another tick.
//!
//! A failed status query is not fatal: the tick is skipped with a
//! warning and polling continues at the next interval.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::models::progress::BatchProgress;
use crate::Result;

/// Events emitted by a batch poller for consumer handling.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// One polled observation of the job.
    Snapshot(BatchProgress),
    /// The job reached `completed`.  Emitted exactly once, last.
    Completed,
}

/// Query seam between the poller and the status endpoint.
///
/// Implemented by [`ApiClient`](crate::api::client::ApiClient) over HTTP
/// and by in-memory fakes in tests.
pub trait ProgressSource: Send + Sync {
    /// Fetch the current progress of `batch_id`.
    ///
    /// # Errors
    ///
    /// Any [`AppError`](crate::AppError); the poller treats every error
    /// as one skipped tick.
    fn fetch_progress(
        &self,
        batch_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<BatchProgress>> + Send + '_>>;
}

/// Builder for a batch progress poller.
///
/// Call [`spawn`](Self::spawn) to start the background polling task.
pub struct BatchPoller {
    batch_id: String,
    interval: Duration,
    source: Arc<dyn ProgressSource>,
    event_tx: mpsc::Sender<PollEvent>,
    cancel: CancellationToken,
}

impl BatchPoller {
    /// Construct a new poller (does not start the timer yet).
    #[must_use]
    pub fn new(
        batch_id: String,
        interval: Duration,
        source: Arc<dyn ProgressSource>,
        event_tx: mpsc::Sender<PollEvent>,
    ) -> Self {
        Self {
            batch_id,
            interval,
            source,
            event_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the background polling task and return its handle.
    #[must_use]
    pub fn spawn(self) -> PollHandle {
        let cancel_for_handle = self.cancel.clone();
        let batch_id = self.batch_id.clone();

        let task_handle = tokio::spawn(
            Self::run(
                self.batch_id,
                self.interval,
                self.source,
                self.event_tx,
                self.cancel,
            )
            .instrument(info_span!("batch_poller")),
        );

        PollHandle {
            batch_id,
            cancel: cancel_for_handle,
            join_handle: Some(task_handle),
        }
    }

    /// Core polling loop.
    async fn run(
        batch_id: String,
        interval: Duration,
        source: Arc<dyn ProgressSource>,
        event_tx: mpsc::Sender<PollEvent>,
        cancel: CancellationToken,
    ) {
        // First tick fires one full interval after spawn, matching the
        // fixed-interval contract of the status endpoint.
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        // A status query slower than the interval must not be followed
        // by a burst of catch-up queries.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!(batch_id, "batch poller: cancelled");
                    return;
                }

                _ = ticker.tick() => {}
            }

            let progress = tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!(batch_id, "batch poller: cancelled mid-query");
                    return;
                }

                fetched = source.fetch_progress(&batch_id) => match fetched {
                    Ok(progress) => progress,
                    Err(err) => {
                        warn!(batch_id, error = %err, "batch poller: status query failed, skipping tick");
                        continue;
                    }
                }
            };

            // stop() may have fired between query completion and now;
            // the in-flight observation is then discarded, never delivered.
            if cancel.is_cancelled() {
                debug!(batch_id, "batch poller: stopped with query in flight, discarding");
                return;
            }

            let completed = progress.is_completed();
            if event_tx.send(PollEvent::Snapshot(progress)).await.is_err() {
                debug!(batch_id, "batch poller: event_tx closed, stopping");
                return;
            }

            if completed {
                let _ = event_tx.send(PollEvent::Completed).await;
                debug!(batch_id, "batch poller: job completed, retiring");
                return;
            }
        }
    }
}

/// Handle returned from [`BatchPoller::spawn`], owning the loop's
/// lifecycle.
pub struct PollHandle {
    batch_id: String,
    cancel: CancellationToken,
    /// Task handle for the background polling loop.
    join_handle: Option<JoinHandle<()>>,
}

impl Drop for PollHandle {
    /// Cancel the background polling task when the handle is dropped.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl PollHandle {
    /// Stop the polling loop.  Idempotent: stopping a retired handle is
    /// a no-op.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has been told to stop or has already exited.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.cancel.is_cancelled()
            || self
                .join_handle
                .as_ref()
                .is_none_or(JoinHandle::is_finished)
    }

    /// The batch ID this handle polls.
    #[must_use]
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// Stop the loop and wait for the task to exit.
    pub async fn await_completion(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }
    }
}

/// One logical polling slot (e.g. "current batch job").
///
/// At most one active handle lives in a slot; installing a new one
/// retires any prior handle first, so a superseded poller can never keep
/// ticking behind its replacement.
#[derive(Default)]
pub struct PollSlot {
    active: Option<PollHandle>,
}

impl PollSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle`, stopping whichever handle occupied the slot.
    pub fn install(&mut self, handle: PollHandle) {
        if let Some(prior) = self.active.replace(handle) {
            prior.stop();
        }
    }

    /// Retire and remove the active handle, if any.
    pub fn clear(&mut self) {
        if let Some(prior) = self.active.take() {
            prior.stop();
        }
    }

    /// The currently installed handle.
    #[must_use]
    pub fn handle(&self) -> Option<&PollHandle> {
        self.active.as_ref()
    }
}
