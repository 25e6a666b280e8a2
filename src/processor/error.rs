use serde::{Serialize, Serializer};

/// Reasons a run ends early with a recorded error.
///
/// Cancellation is not represented here; a cancelled run is a clean termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The input reported zero length. No item is visited.
    EmptyInput,
    /// The input was not a sequence.
    InvalidInput,
    /// The element at `index` is not a number. Earlier publications are kept.
    NonNumericElement { index: usize },
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessError::EmptyInput => write!(f, "Array is empty"),
            ProcessError::InvalidInput => write!(f, "Input is not an array"),
            ProcessError::NonNumericElement { .. } => {
                write!(f, "Array contains non-number elements")
            }
        }
    }
}

impl std::error::Error for ProcessError {}

impl Serialize for ProcessError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
