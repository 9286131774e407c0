//! Shared constants and small numeric helpers.

use crate::float::MomentFloat;

/// Largest moment order supported by the binomial coefficient table.
pub const MAX_ORDER: usize = 20;

/// Element count above which [`Parallel::Auto`](crate::parallel::Parallel::Auto)
/// switches to multi-threaded execution.
pub const PARALLEL_MIN_ELEMENTS: usize = 10_000;

/// Default relative tolerance for comparing accumulators.
pub const DEFAULT_RTOL: f64 = 1e-8;

/// Default absolute tolerance for comparing accumulators.
pub const DEFAULT_ATOL: f64 = 1e-12;

/// Convert an `f64` constant into the working float type.
///
/// Both supported widths represent every `f64` (possibly rounded), so the
/// fallback is never hit in practice.
#[inline(always)]
pub fn cast<T: MomentFloat>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Convert a count into the working float type.
#[inline(always)]
pub fn cast_usize<T: MomentFloat>(value: usize) -> T {
    T::from_usize(value).unwrap_or_else(T::nan)
}

/// Overwrite every element with NaN (the "not enough data" sentinel).
#[inline]
pub fn fill_nan<T: MomentFloat>(values: &mut [T]) {
    values.iter_mut().for_each(|v| *v = T::nan());
}

/// Overwrite every element with zero.
#[inline]
pub fn fill_zero<T: MomentFloat>(values: &mut [T]) {
    values.iter_mut().for_each(|v| *v = T::zero());
}

/// Elementwise closeness with `|a - b| <= atol + rtol * |b|`.
///
/// NaN compares equal to NaN so that gated (sentinel) accumulators can be
/// compared directly.
pub fn allclose<T: MomentFloat>(a: &[T], b: &[T], rtol: f64, atol: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let rtol: T = cast(rtol);
    let atol: T = cast(atol);
    a.iter().zip(b.iter()).all(|(&x, &y)| {
        if x.is_nan() || y.is_nan() {
            x.is_nan() && y.is_nan()
        } else {
            (x - y).abs() <= atol + rtol * y.abs()
        }
    })
}
