use serde::Serialize;
use std::fmt;
use tokio::sync::watch;

/// Externally observable state of a processor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunState {
    pub current_value: Option<f64>,
    pub current_index: usize,
    pub is_running: bool,
    pub last_error: Option<String>,
}

impl RunState {
    /// Share of `total` items revealed so far, in percent.
    ///
    /// Zero until a value has been published or when `total` is zero.
    pub fn progress_percent(&self, total: usize) -> f64 {
        match self.current_value {
            Some(_) if total > 0 => (self.current_index + 1) as f64 / total as f64 * 100.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.current_value {
            Some(value) => write!(f, "Current: {value}"),
            None => f.write_str("Current: N/A"),
        }
    }
}

/// Owns the single [`RunState`] of a processor and fans it out to watchers.
#[derive(Debug)]
pub struct ProgressTracker {
    state: watch::Sender<RunState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunState::default());
        Self { state }
    }

    pub fn snapshot(&self) -> RunState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }

    /// Entry side effects of a run: running, no error.
    pub fn begin_run(&self) {
        self.state.send_modify(|state| {
            state.is_running = true;
            state.last_error = None;
        });
    }

    pub fn clear_current(&self) {
        self.state.send_modify(|state| {
            state.current_value = None;
            state.current_index = 0;
        });
    }

    pub fn publish(&self, index: usize, value: f64) {
        self.state.send_modify(|state| {
            state.current_value = Some(value);
            state.current_index = index;
        });
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|state| state.last_error = Some(message));
    }

    pub fn mark_stopped(&self) {
        self.state.send_if_modified(|state| {
            let was_running = state.is_running;
            state.is_running = false;
            was_running
        });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
