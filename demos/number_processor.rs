use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use seqdelay::{
    DelayConfig, ProcessorConfig, RunEvent, RunInput, RunOutcome, Runner, SequentialDelayProcessor,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

const DEFAULT_DELAY_SECS: &str = "1";
const DEFAULT_ITEMS: &str = "[1, 8, 3, 4, 5]";
const DEFAULT_LOG_DIRECTIVE: &str = "warn";

#[tokio::main]
async fn main() -> Result<()> {
    init_example_tracing();

    let args = ExampleArgs::from_env()?;
    let total = args.items.len();
    let bar = build_progress_bar(total);
    bar.println(format!(
        "Processing {} every {} (Ctrl-C to cancel)",
        args.items.to_json(),
        args.delay
    ));

    let config = ProcessorConfig::builder().delay(args.delay).build()?;
    let processor = SequentialDelayProcessor::new(config);
    let renderer = spawn_renderer(&processor, bar.clone(), total);

    let mut runner = Runner::new(processor);
    let outcome = runner.run_until_ctrl_c(args.items).await?;
    if let Err(err) = renderer.await {
        bar.println(format!("renderer task failed: {err}"));
    }

    let state = runner.processor().state();
    match &outcome {
        RunOutcome::Completed { .. } => bar.finish_with_message("done"),
        RunOutcome::Cancelled { .. } => bar.abandon_with_message("cancelled"),
        RunOutcome::Failed { .. } => bar.abandon_with_message("failed"),
    }
    bar.println(state.to_string());
    if let Some(error) = state.last_error {
        bar.println(format!("Error: {error}"));
    }

    Ok(())
}

fn init_example_tracing() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", DEFAULT_LOG_DIRECTIVE);
    }
    seqdelay::init_tracing();
}

fn build_progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(
        Some(total.max(1) as u64),
        ProgressDrawTarget::stdout_with_hz(12),
    );
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .expect("valid progress bar template")
    .progress_chars("=>-");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Mirrors lifecycle events onto the progress bar until the run finishes.
fn spawn_renderer(
    processor: &SequentialDelayProcessor,
    bar: ProgressBar,
    total: usize,
) -> JoinHandle<()> {
    let mut events = processor.subscribe_events();
    let state = processor.subscribe_state();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(RunEvent::Published { index, value, .. }) => {
                    let percent = state.borrow().progress_percent(total);
                    bar.set_position(index as u64 + 1);
                    bar.set_message(format!("current {value} ({percent:.0}%)"));
                }
                Ok(RunEvent::Started { .. }) => bar.set_message("waiting"),
                Ok(RunEvent::Finished { .. }) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(_)) => {}
            }
        }
    })
}

struct ExampleArgs {
    delay: DelayConfig,
    items: RunInput,
}

impl ExampleArgs {
    fn from_env() -> Result<Self> {
        let delay_text = read_env_or_default("SEQDELAY_DELAY_SECS", DEFAULT_DELAY_SECS);
        let delay = DelayConfig::parse(&delay_text).context("invalid SEQDELAY_DELAY_SECS")?;

        let items_text = read_env_or_default("SEQDELAY_ITEMS", DEFAULT_ITEMS);
        let items = RunInput::from_str(&items_text).context("SEQDELAY_ITEMS must be JSON")?;

        Ok(Self { delay, items })
    }
}

fn read_env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_owned(),
    }
}
