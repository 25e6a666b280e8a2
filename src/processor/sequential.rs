//! The sequential delay processor.
//!
//! A run walks its input in order and, for every element, checks for
//! cancellation, validates the element, waits the configured delay, checks
//! for cancellation again and only then publishes the element. The
//! post-delay checkpoint is what guarantees that a cancelled run never
//! reveals the element it was waiting on.
//!
//! State lives in a [`ProgressTracker`] (latest snapshot over a watch
//! channel) and every lifecycle step is also broadcast as a [`RunEvent`], so
//! observers that need every publication do not depend on watch coalescing.
//!
//! Starting a second run while one is active is allowed. Both loops share the
//! state and the processor-wide cancellation, and their publications
//! interleave.

use super::cancellation::{RunCancellation, WaitDecision};
use super::error::ProcessError;
use super::input::RunInput;
use crate::runtime::config::{DelayConfig, ProcessorConfig};
use crate::runtime::events::{RunEvent, RunOutcome};
use crate::runtime::progress::{ProgressTracker, RunState};
use crate::runtime::telemetry::Telemetry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;


#[derive(Clone)]
pub struct SequentialDelayProcessor {
    inner: Arc<ProcessorInner>,
}

struct ProcessorInner {
    config: ProcessorConfig,
    progress: ProgressTracker,
    events: broadcast::Sender<RunEvent>,
    delay: Mutex<DelayConfig>,
    cancellation_root: Mutex<CancellationToken>,
    next_run_id: AtomicU64,
    telemetry: Arc<Telemetry>,
}

/// Marks the processor idle when a run ends, including when its future is dropped mid-flight.
struct StopGuard<'a> {
    progress: &'a ProgressTracker,
}

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        self.progress.mark_stopped();
    }
}

impl SequentialDelayProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity());
        Self {
            inner: Arc::new(ProcessorInner {
                delay: Mutex::new(config.delay()),
                config,
                progress: ProgressTracker::new(),
                events,
                cancellation_root: Mutex::new(CancellationToken::new()),
                next_run_id: AtomicU64::new(0),
                telemetry: Arc::new(Telemetry::default()),
            }),
        }
    }

    /// Returns the configuration the processor was built with.
    pub fn config(&self) -> &ProcessorConfig {
        &self.inner.config
    }

    /// Current snapshot of the observable state.
    pub fn state(&self) -> RunState {
        self.inner.progress.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.inner.progress.is_running()
    }

    /// Watches the latest state. Intermediate values may be coalesced.
    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.inner.progress.subscribe()
    }

    /// Receives every lifecycle event emitted after this call.
    pub fn subscribe_events(&self) -> broadcast::Receiver<RunEvent> {
        self.inner.events.subscribe()
    }

    /// Returns a clone of the telemetry handle for observability.
    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.inner.telemetry.clone()
    }

    /// Delay that the next started run will use.
    pub fn delay(&self) -> DelayConfig {
        *lock(&self.inner.delay)
    }

    /// Replaces the delay for runs started from now on. Runs already in flight keep theirs.
    pub fn set_delay(&self, delay: DelayConfig) {
        *lock(&self.inner.delay) = delay;
        tracing::debug!(delay_secs = delay.as_secs(), "delay updated for subsequent runs");
    }

    /// Applies user-entered delay text, reading its leading integer. Text with no
    /// leading positive integer is ignored.
    pub fn set_delay_from_input(&self, input: &str) -> bool {
        match DelayConfig::parse(input) {
            Ok(delay) => {
                self.set_delay(delay);
                true
            }
            Err(err) => {
                tracing::debug!(input, error = %err, "ignoring invalid delay input");
                false
            }
        }
    }

    /// Runs `input` to a terminal condition.
    ///
    /// Failures are never returned as errors: they are recorded in
    /// [`RunState::last_error`]. The returned [`RunOutcome`] only reports how the run ended.
    pub async fn start(&self, input: impl Into<RunInput>) -> RunOutcome {
        self.run(input.into(), None).await
    }

    /// Like [`Self::start`], but the run also stops when `token` is cancelled.
    ///
    /// Cancelling `token` affects only this run, whereas [`Self::cancel`] stops every active run.
    pub async fn start_with_token(
        &self,
        input: impl Into<RunInput>,
        token: CancellationToken,
    ) -> RunOutcome {
        self.run(input.into(), Some(token)).await
    }

    /// Requests cancellation of every active run and reports the processor idle immediately.
    ///
    /// Loops exit at their next checkpoint. A loop parked in its delay wakes up
    /// right away and exits without publishing.
    pub fn cancel(&self) {
        lock(&self.inner.cancellation_root).cancel();
        self.inner.progress.mark_stopped();
        tracing::info!("cancellation requested");
    }

    async fn run(&self, input: RunInput, external: Option<CancellationToken>) -> RunOutcome {
        let run_id = self.inner.next_run_id.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.delay();
        let cancellation = RunCancellation::new(self.reset_cancellation(), external);

        self.inner.progress.begin_run();
        let guard = StopGuard {
            progress: &self.inner.progress,
        };
        self.inner.telemetry.record_run_started();
        self.emit(RunEvent::Started {
            run_id,
            delay_secs: delay.as_secs(),
        });
        tracing::info!(
            run_id,
            items = input.len(),
            delay_secs = delay.as_secs(),
            "starting sequential run"
        );

        let outcome = self.drive(run_id, &input, delay, &cancellation).await;

        match &outcome {
            RunOutcome::Completed { published } => {
                tracing::info!(run_id, published, "sequential run completed");
            }
            RunOutcome::Cancelled { published } => {
                tracing::info!(run_id, published, "sequential run cancelled");
            }
            RunOutcome::Failed { published, error } => {
                tracing::warn!(run_id, published, error = %error, "sequential run failed");
                self.inner.progress.record_error(error.to_string());
            }
        }

        drop(guard);
        self.inner.telemetry.record_outcome(&outcome);
        self.emit(RunEvent::Finished {
            run_id,
            outcome: outcome.clone(),
        });
        outcome
    }

    async fn drive(
        &self,
        run_id: u64,
        input: &RunInput,
        delay: DelayConfig,
        cancellation: &RunCancellation,
    ) -> RunOutcome {
        let items = match input.validate() {
            Ok(items) => items,
            Err(error) => {
                if error == ProcessError::EmptyInput {
                    self.inner.progress.clear_current();
                }
                return RunOutcome::Failed {
                    published: 0,
                    error,
                };
            }
        };

        let mut published = 0;
        for (index, element) in items.into_iter().enumerate() {
            if cancellation.is_cancelled() {
                tracing::trace!(run_id, index, "cancellation observed before delay");
                return RunOutcome::Cancelled { published };
            }

            let Some(value) = element else {
                return RunOutcome::Failed {
                    published,
                    error: ProcessError::NonNumericElement { index },
                };
            };

            let decision = cancellation.sleep(delay.as_duration()).await;
            if decision == WaitDecision::Cancelled || cancellation.is_cancelled() {
                tracing::trace!(run_id, index, "cancellation observed after delay");
                return RunOutcome::Cancelled { published };
            }

            self.inner.progress.publish(index, value);
            self.inner.telemetry.record_published();
            self.emit(RunEvent::Published {
                run_id,
                index,
                value,
            });
            tracing::debug!(run_id, index, value, "published item");
            published += 1;
        }

        RunOutcome::Completed { published }
    }

    /// Derives the token for a new run, replacing the root first if an earlier `cancel` fired.
    fn reset_cancellation(&self) -> CancellationToken {
        let mut root = lock(&self.inner.cancellation_root);
        if root.is_cancelled() {
            *root = CancellationToken::new();
        }
        root.child_token()
    }

    fn emit(&self, event: RunEvent) {
        // No subscribers is not an error.
        let _ = self.inner.events.send(event);
    }
}

impl Default for SequentialDelayProcessor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

impl std::fmt::Debug for SequentialDelayProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialDelayProcessor")
            .field("config", &self.inner.config)
            .field("delay", &self.delay())
            .field("state", &self.state())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
