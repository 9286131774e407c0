//! # central-moments
//!
//! Weighted central moments and co-moments that can be pushed, merged,
//! subtracted, and resampled without revisiting the original samples.
//!
//! This crate provides:
//! - Single-sample push and scaled merge of moment accumulators (univariate and bivariate)
//! - Raw <-> central moment conversion
//! - Batched, cumulative, grouped and indexed reductions
//! - Bootstrap resampling from frequency tables and jackknife (leave-one-out) accumulators
//! - Sliding-window and exponentially weighted moving moments
//!
//! ## Data Layout
//!
//! An accumulator is a contiguous slice:
//! - univariate order `M`: `[weight, mean, m2, ..., mM]`, length `M + 1`
//! - bivariate orders `(M0, M1)`: an `(M0 + 1) x (M1 + 1)` row-major grid,
//!   cell `(i, j)` at `i * (M1 + 1) + j`; `(0, 0)` is the weight, `(1, 0)`
//!   and `(0, 1)` the means
//!
//! Batches of accumulators ([`MomentArray`]) are flat and row-major, so
//! accumulator `b` occupies `b * size..(b + 1) * size`. Batched sample inputs
//! ([`Samples`]) are batch-major: sample `s` of series `b` is at
//! `b * nsamp + s`.
//!
//! ## Example
//!
//! ```
//! use central_moments::{merge, reduce_vals, Moments, Samples};
//!
//! let mom = Moments::univariate(3).unwrap();
//! let mut left = reduce_vals(mom, &Samples::unweighted(&[1.0f64, 2.0])).unwrap();
//! let right = reduce_vals(mom, &Samples::unweighted(&[3.0, 4.0])).unwrap();
//! merge(mom, &right, &mut left);
//! assert_eq!(left[0], 4.0);
//! assert_eq!(left[1], 2.5);
//! assert!((left[2] - 1.25).abs() < 1e-12);
//! ```

#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

pub mod parallel;

pub mod binomial;
pub mod convert;
pub mod error;
pub mod float;
pub mod grouped;
pub mod helpers;
pub mod kernel;
pub mod matrix;
pub mod moments;
pub mod push;
pub mod push_cov;
pub mod reduction;
pub mod resample;
pub mod rolling;
pub mod samples;

// Re-export commonly used items
pub use error::{MomentsError, Result};
pub use float::MomentFloat;
pub use helpers::{allclose, MAX_ORDER, PARALLEL_MIN_ELEMENTS};
pub use matrix::MomentArray;
pub use moments::{Moments, MomentsType};
pub use parallel::Parallel;
pub use samples::Samples;

// Re-export kernels
pub use kernel::{copy_scaled, merge, merge_scaled, push_val, remove_val, subtract};

// Re-export conversions and statistics
pub use convert::{
    central_to_raw, cmom, convert, correlation, covariance, excess_kurtosis, mean,
    moments_to_comoments, raw_to_central, rmom, skewness, std_dev, variance, weight,
};

// Re-export reductions
pub use grouped::{
    factor_by_to_index, reduce_data_grouped, reduce_data_indexed_fromzero, IndexedGroups,
};
pub use reduction::{cumulative, cumulative_inverse, reduce_data, reduce_vals, reduce_vals_batch};

// Re-export resampling types
pub use resample::{
    freq_to_indices, indices_to_freq, jackknife_data, jackknife_freq, jackknife_vals, random_freq,
    random_indices, resample_data, resample_vals, FreqTable, IndexTable,
};

// Re-export moving-window types
pub use rolling::{
    rolling_data, rolling_exp_data, rolling_exp_vals, rolling_vals, EwmConfig, EwmDecay,
    RollingConfig,
};
