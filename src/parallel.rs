//! Parallel iteration over independent accumulators.
//!
//! Work is split only across independent output accumulators; the fold
//! inside one accumulator always runs sequentially in a fixed order. With
//! the `parallel` feature (default) chunks are dispatched through rayon when
//! the [`Parallel`] policy resolves to `true`. Without the feature, or when
//! the policy resolves to `false`, the same closure runs over plain
//! `chunks_mut`. Results are identical either way.
//!
//! # Usage
//!
//! ```ignore
//! use crate::maybe_par_chunks_mut_enumerate;
//!
//! let parallel = policy.resolve("reduce_data", data.len());
//! maybe_par_chunks_mut_enumerate!(out, mom_size, parallel, |(b, acc)| {
//!     // fold batch element `b` into `acc`
//! });
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::helpers::PARALLEL_MIN_ELEMENTS;

/// Macro for enumerated parallel/sequential chunks iteration.
///
/// `$parallel` is a runtime `bool`; it is ignored without the `parallel`
/// feature.
///
/// # Example
/// ```ignore
/// use crate::maybe_par_chunks_mut_enumerate;
///
/// maybe_par_chunks_mut_enumerate!(data, chunk_size, parallel, |(idx, chunk)| {
///     // process chunk at index idx
/// });
/// ```
#[macro_export]
macro_rules! maybe_par_chunks_mut_enumerate {
    ($slice:expr, $chunk_size:expr, $parallel:expr, $closure:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            if $parallel {
                $slice
                    .par_chunks_mut($chunk_size)
                    .enumerate()
                    .for_each($closure);
            } else {
                $slice
                    .chunks_mut($chunk_size)
                    .enumerate()
                    .for_each($closure);
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            let _ = $parallel;
            $slice
                .chunks_mut($chunk_size)
                .enumerate()
                .for_each($closure);
        }
    }};
}

pub use maybe_par_chunks_mut_enumerate;

/// Threading policy for batched operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parallel {
    /// Parallel when more than [`PARALLEL_MIN_ELEMENTS`] scalars are touched.
    #[default]
    Auto,
    Always,
    Never,
}

impl Parallel {
    /// Decide whether an operation touching `size` scalars runs on rayon.
    ///
    /// Always `false` without the `parallel` feature.
    pub fn resolve(self, operation: &'static str, size: usize) -> bool {
        let wanted = match self {
            Parallel::Auto => size > PARALLEL_MIN_ELEMENTS,
            Parallel::Always => true,
            Parallel::Never => false,
        };
        let decision = wanted && cfg!(feature = "parallel");
        tracing::debug!(
            operation,
            size,
            policy = ?self,
            parallel = decision,
            "resolved parallel policy"
        );
        decision
    }
}

impl From<bool> for Parallel {
    fn from(parallel: bool) -> Self {
        if parallel {
            Parallel::Always
        } else {
            Parallel::Never
        }
    }
}

impl From<Option<bool>> for Parallel {
    fn from(parallel: Option<bool>) -> Self {
        parallel.map_or(Parallel::Auto, Parallel::from)
    }
}
