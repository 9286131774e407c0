//! Bivariate (co-moment) kernels.
//!
//! Accumulators are `(M0 + 1) x (M1 + 1)` grids stored row-major; `shape` is
//! the grid extent as returned by
//! [`Moments::shape`](crate::moments::Moments::shape). The update is the
//! two-variate form of the pooled formula in [`crate::push`]:
//!
//! ```text
//! m[i,j] = sum_{a<=i} sum_{b<=j} C(i,a) C(j,b) d0^a d1^b
//!              ( alpha (-beta)^(a+b) m_a[i-a, j-b] + beta alpha^(a+b) m_b[i-a, j-b] )
//! ```
//!
//! Cells are visited with `i` and then `j` descending, so every cell read
//! on the right-hand side still holds its old value.

use crate::binomial::coefficient;
use crate::float::MomentFloat;
use crate::helpers::fill_zero;

#[inline(always)]
fn pool<T, F>(
    acc: &mut [T],
    shape: (usize, usize),
    weight: T,
    mean0: T,
    mean1: T,
    central: F,
) -> bool
where
    T: MomentFloat,
    F: Fn(usize) -> T,
{
    let (nrow, ncol) = shape;
    debug_assert_eq!(acc.len(), nrow * ncol);

    let w_old = acc[0];
    let w_new = w_old + weight;
    if w_new == T::zero() {
        return false;
    }

    let alpha = w_old / w_new;
    let beta = weight / w_new;
    let d0 = mean0 - acc[ncol];
    let d1 = mean1 - acc[1];

    for i in (0..nrow).rev() {
        for j in (0..ncol).rev() {
            if i + j < 2 {
                continue;
            }
            let mut total = T::zero();
            let mut d0_a = T::one();
            for a in 0..=i {
                let mut d1_b = T::one();
                for b in 0..=j {
                    let (p, q) = (i - a, j - b);
                    if p + q != 1 {
                        let (ma, mb) = if p + q == 0 {
                            (T::one(), T::one())
                        } else {
                            let idx = p * ncol + q;
                            (acc[idx], central(idx))
                        };
                        let k = (a + b) as i32;
                        total = total
                            + coefficient::<T>(i, a)
                                * coefficient::<T>(j, b)
                                * d0_a
                                * d1_b
                                * (alpha * (-beta).powi(k) * ma + beta * alpha.powi(k) * mb);
                    }
                    d1_b = d1_b * d1;
                }
                d0_a = d0_a * d0;
            }
            acc[i * ncol + j] = total;
        }
    }

    acc[ncol] = acc[ncol] + d0 * beta;
    acc[1] = acc[1] + d1 * beta;
    acc[0] = w_new;
    true
}

/// Fold one weighted pair `(x0, x1)` into `acc`.
///
/// Zero weight is skipped; a weight cancelling the total leaves `acc`
/// unchanged.
#[inline]
pub fn push_val<T: MomentFloat>(acc: &mut [T], shape: (usize, usize), x0: T, x1: T, w: T) {
    if w == T::zero() {
        return;
    }
    pool(acc, shape, w, x0, x1, |_| T::zero());
}

/// Remove one weighted pair; removing the last of the weight zeroes `acc`.
#[inline]
pub fn remove_val<T: MomentFloat>(acc: &mut [T], shape: (usize, usize), x0: T, x1: T, w: T) {
    if w == T::zero() {
        return;
    }
    if !pool(acc, shape, -w, x0, x1, |_| T::zero()) {
        fill_zero(acc);
    }
}

/// Merge `src` into `dst` with `src`'s weight multiplied by `scale`.
///
/// A zero combined weight zeroes `dst`.
///
/// # Panics
/// Panics if the slices differ in length.
#[inline]
pub fn merge_scaled<T: MomentFloat>(src: &[T], shape: (usize, usize), scale: T, dst: &mut [T]) {
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
    let ncol = shape.1;
    if !pool(dst, shape, weight, src[ncol], src[1], |idx| src[idx]) {
        fill_zero(dst);
    }
}

/// Merge `src` into `dst`.
#[inline]
pub fn merge<T: MomentFloat>(src: &[T], shape: (usize, usize), dst: &mut [T]) {
    merge_scaled(src, shape, T::one(), dst);
}
