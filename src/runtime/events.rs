use crate::processor::error::ProcessError;
use serde::Serialize;

/// Terminal condition of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { published: usize },
    Cancelled { published: usize },
    Failed { published: usize, error: ProcessError },
}

impl RunOutcome {
    /// Number of items this run revealed before it ended.
    pub fn published(&self) -> usize {
        match self {
            RunOutcome::Completed { published }
            | RunOutcome::Cancelled { published }
            | RunOutcome::Failed { published, .. } => *published,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled { .. })
    }

    pub fn error(&self) -> Option<&ProcessError> {
        match self {
            RunOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Lifecycle notifications broadcast by a processor, in the order they happen.
///
/// Runs started concurrently on the same processor interleave; `run_id` tells them apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Started {
        run_id: u64,
        delay_secs: u64,
    },
    Published {
        run_id: u64,
        index: usize,
        value: f64,
    },
    Finished {
        run_id: u64,
        outcome: RunOutcome,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> u64 {
        match self {
            RunEvent::Started { run_id, .. }
            | RunEvent::Published { run_id, .. }
            | RunEvent::Finished { run_id, .. } => *run_id,
        }
    }
}
