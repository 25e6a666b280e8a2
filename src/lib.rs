pub mod processor;
pub mod runtime;

pub use processor::error::ProcessError;
pub use processor::input::RunInput;
pub use processor::sequential::SequentialDelayProcessor;
pub use runtime::config::{
    DelayConfig, ProcessorConfig, ProcessorConfigBuilder, ProcessorConfigParams,
};
pub use runtime::events::{RunEvent, RunOutcome};
pub use runtime::progress::{ProgressTracker, RunState};
pub use runtime::runner::Runner;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use tokio_util::sync::CancellationToken;
