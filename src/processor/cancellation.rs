use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Outcome of a wait that can be interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitDecision {
    Elapsed,
    Cancelled,
}

/// Cancellation seen by a single run: the processor-wide token plus an optional
/// token owned by whoever started the run.
#[derive(Debug, Clone)]
pub(crate) struct RunCancellation {
    run: CancellationToken,
    external: Option<CancellationToken>,
}

impl RunCancellation {
    pub(crate) fn new(run: CancellationToken, external: Option<CancellationToken>) -> Self {
        Self { run, external }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.run.is_cancelled()
            || self
                .external
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
    }

    async fn cancelled(&self) {
        match &self.external {
            Some(external) => {
                tokio::select! {
                    _ = self.run.cancelled() => {}
                    _ = external.cancelled() => {}
                }
            }
            None => self.run.cancelled().await,
        }
    }

    /// Sleeps for `delay` unless cancelled first.
    pub(crate) async fn sleep(&self, delay: Duration) -> WaitDecision {
        tokio::select! {
            _ = self.cancelled() => WaitDecision::Cancelled,
            _ = sleep(delay) => WaitDecision::Elapsed,
        }
    }
}
