//! Runtime glue that wires configs, run state, lifecycle events, telemetry, and
//! runner orchestration.

pub mod config;
pub mod events;
pub mod progress;
pub mod runner;
pub mod telemetry;
