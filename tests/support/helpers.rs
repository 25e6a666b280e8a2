use std::time::Duration;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use seqdelay::{ProcessorConfig, RunEvent, RunOutcome, SequentialDelayProcessor};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing_subscriber::EnvFilter;

/// Run loops log at `debug`; `RUST_LOG` overrides. Output goes through the test harness capture.
static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("seqdelay=debug,warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

pub fn processor_with_delay(secs: u64) -> Result<SequentialDelayProcessor> {
    let config = ProcessorConfig::builder().delay_secs(secs).build()?;
    Ok(SequentialDelayProcessor::new(config))
}

/// A publication as seen by an observer, stamped with the time since recording began.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped {
    pub run_id: u64,
    pub index: usize,
    pub value: f64,
    pub at: Duration,
}

#[derive(Debug, Default)]
pub struct EventLog {
    pub published: Vec<Stamped>,
    pub outcomes: Vec<(u64, RunOutcome)>,
}

impl EventLog {
    pub fn values(&self) -> Vec<f64> {
        self.published.iter().map(|entry| entry.value).collect()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.published.iter().map(|entry| entry.index).collect()
    }
}

/// Records every event until `runs` runs have finished.
pub fn record_events(
    mut rx: broadcast::Receiver<RunEvent>,
    runs: usize,
) -> JoinHandle<Result<EventLog>> {
    let origin = Instant::now();
    tokio::spawn(async move {
        let mut log = EventLog::default();
        while log.outcomes.len() < runs {
            match rx.recv().await {
                Ok(RunEvent::Published {
                    run_id,
                    index,
                    value,
                }) => log.published.push(Stamped {
                    run_id,
                    index,
                    value,
                    at: origin.elapsed(),
                }),
                Ok(RunEvent::Finished { run_id, outcome }) => log.outcomes.push((run_id, outcome)),
                Ok(RunEvent::Started { .. }) => {}
                Err(RecvError::Lagged(skipped)) => bail!("event log lagged by {skipped} events"),
                Err(RecvError::Closed) => break,
            }
        }
        Ok(log)
    })
}

pub async fn wait_for_index(
    processor: &SequentialDelayProcessor,
    target: usize,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();
    loop {
        let state = processor.state();
        if state.current_value.is_some() && state.current_index >= target {
            return Ok(());
        }
        if start.elapsed() > timeout {
            bail!(
                "processor did not reach index {target} within {:?} (state: {state:?})",
                timeout
            );
        }
        sleep(Duration::from_millis(50)).await;
    }
}

pub fn assert_is_contiguous(indices: &[usize]) {
    for window in indices.windows(2) {
        if let [lhs, rhs] = window {
            assert_eq!(rhs, &(lhs + 1), "indices must increase one step at a time");
        }
    }
}
