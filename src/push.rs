//! Univariate moment kernels.
//!
//! Every kernel works in place on one accumulator slice of length `M + 1`
//! (see [`Moments`](crate::moments::Moments) for the layout). All of them are
//! specialisations of one pooled-moment update: merging a group `b` of weight
//! `w_b`, mean `mu_b` and normalised central moments `m_b[k]` into `a`,
//!
//! ```text
//! W      = w_a + w_b,    alpha = w_a / W,    beta = w_b / W,    d = mu_b - mu_a
//! m[n]   = sum_{k=0..n} C(n, k) d^k ( alpha (-beta)^k m_a[n-k] + beta alpha^k m_b[n-k] )
//! mu     = mu_a + d beta
//! ```
//!
//! with `m[0] = 1` and `m[1] = 0` for both groups. Orders are updated from
//! `M` down to 2 so that lower orders are still the old values when read.
//! A single sample is a group whose central moments are all zero.

use crate::binomial::coefficient;
use crate::float::MomentFloat;
use crate::helpers::fill_zero;

/// Pool a group into `acc`. Returns `false`, leaving `acc` untouched, when
/// the combined weight is exactly zero.
#[inline(always)]
fn pool<T, F>(acc: &mut [T], weight: T, mean: T, central: F) -> bool
where
    T: MomentFloat,
    F: Fn(usize) -> T,
{
    let order = acc.len() - 1;
    let w_old = acc[0];
    let w_new = w_old + weight;
    if w_new == T::zero() {
        return false;
    }

    let alpha = w_old / w_new;
    let beta = weight / w_new;
    let delta = mean - acc[1];

    for n in (2..=order).rev() {
        let mut total = T::zero();
        let mut delta_k = T::one();
        let mut minus_beta_k = T::one();
        let mut alpha_k = T::one();
        for k in 0..=n {
            let m = n - k;
            if m != 1 {
                let (ma, mb) = if m == 0 {
                    (T::one(), T::one())
                } else {
                    (acc[m], central(m))
                };
                total = total
                    + coefficient::<T>(n, k)
                        * delta_k
                        * (alpha * minus_beta_k * ma + beta * alpha_k * mb);
            }
            delta_k = delta_k * delta;
            minus_beta_k = minus_beta_k * -beta;
            alpha_k = alpha_k * alpha;
        }
        acc[n] = total;
    }

    acc[1] = acc[1] + delta * beta;
    acc[0] = w_new;
    true
}

/// Fold one weighted value into `acc`.
///
/// A zero weight is skipped. If the weight cancels the accumulator's total
/// weight exactly, `acc` is left unchanged.
#[inline]
pub fn push_val<T: MomentFloat>(acc: &mut [T], x: T, w: T) {
    debug_assert!(acc.len() >= 2, "accumulator needs at least weight and mean");
    if w == T::zero() {
        return;
    }
    pool(acc, w, x, |_| T::zero());
}

/// Remove one weighted value previously pushed into `acc`.
///
/// Unlike [`push_val`] with a negative weight, removing the last of the
/// weight leaves a zero accumulator.
#[inline]
pub fn remove_val<T: MomentFloat>(acc: &mut [T], x: T, w: T) {
    if w == T::zero() {
        return;
    }
    if !pool(acc, -w, x, |_| T::zero()) {
        fill_zero(acc);
    }
}

/// Fold a pre-computed statistic into `acc`.
///
/// `central[k]` holds the central moment of order `k + 2`; missing trailing
/// orders are taken as zero.
#[inline]
pub fn push_stat<T: MomentFloat>(acc: &mut [T], mean: T, central: &[T], w: T) {
    if w == T::zero() {
        return;
    }
    pool(acc, w, mean, |m| central.get(m - 2).copied().unwrap_or_else(T::zero));
}

/// Merge `src` into `dst` as if every sample behind `src` had its weight
/// multiplied by `scale`.
///
/// Negative scales subtract. A zero combined weight zeroes `dst`.
///
/// # Panics
/// Panics if the slices differ in length.
#[inline]
pub fn merge_scaled<T: MomentFloat>(src: &[T], scale: T, dst: &mut [T]) {
    assert_eq!(
        src.len(),
        dst.len(),
        "accumulator length mismatch: {} vs {}",
        src.len(),
        dst.len()
    );
    let weight = src[0] * scale;
    if weight == T::zero() {
        return;
    }
    if !pool(dst, weight, src[1], |m| src[m]) {
        fill_zero(dst);
    }
}

/// Merge `src` into `dst`.
#[inline]
pub fn merge<T: MomentFloat>(src: &[T], dst: &mut [T]) {
    merge_scaled(src, T::one(), dst);
}

/// Overwrite `dst` with `src`, its weight multiplied by `scale`.
///
/// Used to start an accumulator from its first contribution instead of
/// merging into zero.
#[inline]
pub fn copy_scaled<T: MomentFloat>(src: &[T], scale: T, dst: &mut [T]) {
    dst.copy_from_slice(src);
    dst[0] = dst[0] * scale;
}
