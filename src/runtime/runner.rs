use crate::processor::input::RunInput;
use crate::runtime::events::RunOutcome;
use crate::SequentialDelayProcessor;
use anyhow::{Context, Result};
use std::future::Future;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Drives one processor run at a time and cancels it on OS signals.
pub struct Runner {
    processor: SequentialDelayProcessor,
    shutdown: CancellationToken,
}

impl Runner {
    pub fn new(processor: SequentialDelayProcessor) -> Self {
        Self {
            processor,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn processor(&self) -> &SequentialDelayProcessor {
        &self.processor
    }

    /// Returns a clone of the shutdown token so external callers can stop the
    /// active run with their own signal handlers or cancellation strategies.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs `input` until it ends on its own or a Ctrl-C (SIGINT) is received.
    pub async fn run_until_ctrl_c(&mut self, input: impl Into<RunInput>) -> Result<RunOutcome> {
        self.run_until(input, async {
            signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")
        })
        .await
    }

    /// Runs `input` until it ends on its own or `stop` resolves.
    ///
    /// When `stop` resolves first the run is cancelled, even if it had not begun yet, and it is
    /// awaited so its final state is settled before returning. Only the run
    /// driven here is cancelled; runs started through other clones of the
    /// processor keep going. An error from `stop` is returned after the run has
    /// been cancelled and the shutdown token replaced, so the runner stays usable.
    pub async fn run_until<F>(&mut self, input: impl Into<RunInput>, stop: F) -> Result<RunOutcome>
    where
        F: Future<Output = Result<()>>,
    {
        let outcome = {
            let run = self
                .processor
                .start_with_token(input, self.shutdown.clone());
            tokio::pin!(run);
            tokio::pin!(stop);

            tokio::select! {
                outcome = &mut run => (outcome, Ok(())),
                stopped = &mut stop => {
                    tracing::info!("stop requested; cancelling active run");
                    self.shutdown.cancel();
                    (run.await, stopped)
                }
            }
        };
        let (outcome, stopped) = outcome;

        self.reinitialize_shutdown_token();
        stopped?;
        Ok(outcome)
    }

    fn reinitialize_shutdown_token(&mut self) {
        if self.shutdown.is_cancelled() {
            self.shutdown = CancellationToken::new();
        }
    }
}
