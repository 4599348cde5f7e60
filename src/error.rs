//! Error taxonomy. Every failure is fatal to the index instance: the caller
//! discards and rebuilds, nothing is retried internally.

use thiserror::Error;

/// Errors returned by the hash index and its collaborators.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Operation invalid for the current lifecycle phase
    /// (add-after-freeze, query-before-freeze, double-freeze).
    #[error("illegal state: {op} not permitted in phase {phase}")]
    IllegalState {
        /// Operation that was attempted.
        op: &'static str,
        /// Phase the index was in.
        phase: &'static str,
    },
    /// Declared capacity insufficient for the inserted volume, or a bucket
    /// received more entries in the placement pass than it was laid out for.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
    /// Rejected configuration or argument.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Position or index outside valid bounds on a positional accessor.
    #[error("position {pos} out of range (len {len})")]
    RangeViolation {
        /// Offending position.
        pos: u64,
        /// Valid length.
        len: u64,
    },
    /// I/O failure while loading external data (blacklist listings).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed line in an external listing.
    #[error("parse error: {0}")]
    Parse(String),
}
