//! The sequential processor: input validation, cancellation checkpoints, and
//! the run loop itself.

pub mod cancellation;
pub mod error;
pub mod input;
pub mod sequential;
