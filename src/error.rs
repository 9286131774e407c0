//! Error type for precondition violations at the call boundary.
//!
//! Numerical degeneracies (zero weights, zero combined weight) are not
//! errors; they are handled in place by the kernels.

use thiserror::Error;

use crate::moments::Moments;

/// Errors reported by array-level operations before any work is done.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MomentsError {
    #[error("moment order {order} must be in 1..={max}")]
    InvalidOrder { order: usize, max: usize },

    #[error("buffer of length {len} does not hold whole accumulators of size {size}")]
    RaggedBuffer { len: usize, size: usize },

    #[error("{name}: expected length {expected}, got {actual}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("moments mismatch: {left:?} vs {right:?}")]
    MomentsMismatch { left: Moments, right: Moments },

    #[error("{operation} requires {expected} moments, got {actual:?}")]
    WrongMomentsKind {
        operation: &'static str,
        expected: &'static str,
        actual: Moments,
    },

    #[error("group id {group} out of range for {ngroup} groups")]
    GroupOutOfRange { group: i64, ngroup: usize },

    #[error("group {group}: range [{start}, {end}) invalid for {nindex} indices")]
    InvalidGroupRange {
        group: usize,
        start: usize,
        end: usize,
        nindex: usize,
    },

    #[error("sample index {index} out of range for {ndat} samples")]
    IndexOutOfRange { index: usize, ndat: usize },

    #[error("frequency table rows sum to different sample counts ({first} vs {other})")]
    InconsistentFrequencies { first: usize, other: usize },

    #[error("cannot draw {nsamp} samples without replacement from {ndat}")]
    TooManySamples { nsamp: usize, ndat: usize },

    #[error("window must be at least 1, got {0}")]
    InvalidWindow(usize),

    #[error("sample axis of a batched input must be non-empty")]
    EmptySampleAxis,

    #[error("block size must be at least 1")]
    InvalidBlockSize,

    #[error("invalid decay parameter {name}={value}")]
    InvalidDecay { name: &'static str, value: f64 },

    #[error("cannot subtract weight {removed} from accumulator of weight {total}")]
    NegativeWeight { removed: f64, total: f64 },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MomentsError>;
