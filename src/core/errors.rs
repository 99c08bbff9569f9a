use thiserror::Error;

/// Failure taxonomy surfaced by the assembly core.
///
/// Every fallible operation in the crate reports one of these kinds;
/// panics are reserved for programmer errors (violated `debug_assert!`
/// preconditions). A missed k-mer lookup during mapping is *not* an
/// error: it contributes nothing to the mapping path and is skipped
/// silently.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("invalid nucleotide {found:?} at position {position}")]
    InvalidNucleotide { found: char, position: usize },

    #[error("graph invariant violation: {message}")]
    GraphInvariantViolation { message: String },

    #[error(
        "inconsistent paired info between edges {first} and {second}: \
         observation at distance {distance} outside library bounds"
    )]
    InconsistentPairedInfo {
        first: u32,
        second: u32,
        distance: f64,
    },

    #[error("configuration out of range: {message}")]
    ConfigOutOfRange { message: String },
}

impl AssemblyError {
    pub fn invariant(message: impl Into<String>) -> Self {
        AssemblyError::GraphInvariantViolation {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AssemblyError::ConfigOutOfRange {
            message: message.into(),
        }
    }
}
