use crate::runtime::events::RunOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Crate events at `info`, everything else at `warn`.
pub const DEFAULT_LOG_DIRECTIVE: &str = "seqdelay=info,warn";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a compact tracing subscriber for processor runs, unless one is already active.
///
/// `RUST_LOG` takes precedence; without it [`DEFAULT_LOG_DIRECTIVE`] applies.
/// Repeated calls are no-ops.
pub fn init_tracing() {
    TRACING_INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .compact()
            .with_env_filter(log_filter())
            .with_target(false)
            .try_init();
    });
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// Lifetime counters for a processor instance.
#[derive(Default, Debug)]
pub struct Telemetry {
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    runs_cancelled: AtomicU64,
    runs_failed: AtomicU64,
    items_published: AtomicU64,
}

impl Telemetry {
    pub fn record_run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.items_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: &RunOutcome) {
        let counter = match outcome {
            RunOutcome::Completed { .. } => &self.runs_completed,
            RunOutcome::Cancelled { .. } => &self.runs_cancelled,
            RunOutcome::Failed { .. } => &self.runs_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_cancelled: self.runs_cancelled.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            items_published: self.items_published.load(Ordering::Relaxed),
        }
    }

    pub fn items_published(&self) -> u64 {
        self.items_published.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub runs_cancelled: u64,
    pub runs_failed: u64,
    pub items_published: u64,
}

impl TelemetrySnapshot {
    /// Runs that have started but not yet reported an outcome.
    pub fn runs_in_flight(&self) -> u64 {
        self.runs_started.saturating_sub(
            self.runs_completed + self.runs_cancelled + self.runs_failed,
        )
    }
}
