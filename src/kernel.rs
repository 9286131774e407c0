//! Kernel dispatch by [`Moments`].
//!
//! The batched layers only ever call [`push_val`] and [`merge_scaled`]
//! (plus the copy/remove helpers); this module routes them to the
//! univariate or bivariate implementation. Shapes are validated by the
//! caller once per batched call.

use crate::error::{MomentsError, Result};
use crate::float::MomentFloat;
use crate::moments::Moments;
use crate::{push, push_cov};

/// Fold one sample; `y` is ignored for univariate moments.
#[inline(always)]
pub fn push_val<T: MomentFloat>(mom: Moments, acc: &mut [T], x: T, y: T, w: T) {
    match mom {
        Moments::Univariate(_) => push::push_val(acc, x, w),
        Moments::Bivariate(..) => push_cov::push_val(acc, mom.shape(), x, y, w),
    }
}

/// Remove one sample; removing the last of the weight zeroes `acc`.
#[inline(always)]
pub fn remove_val<T: MomentFloat>(mom: Moments, acc: &mut [T], x: T, y: T, w: T) {
    match mom {
        Moments::Univariate(_) => push::remove_val(acc, x, w),
        Moments::Bivariate(..) => push_cov::remove_val(acc, mom.shape(), x, y, w),
    }
}

/// Merge `src` into `dst` with `src`'s weight multiplied by `scale`.
#[inline(always)]
pub fn merge_scaled<T: MomentFloat>(mom: Moments, src: &[T], scale: T, dst: &mut [T]) {
    match mom {
        Moments::Univariate(_) => push::merge_scaled(src, scale, dst),
        Moments::Bivariate(..) => push_cov::merge_scaled(src, mom.shape(), scale, dst),
    }
}

/// Merge `src` into `dst`.
#[inline(always)]
pub fn merge<T: MomentFloat>(mom: Moments, src: &[T], dst: &mut [T]) {
    merge_scaled(mom, src, T::one(), dst);
}

/// Overwrite `dst` with `src` scaled by `scale`; the weight sits at index 0
/// for both layouts.
#[inline(always)]
pub fn copy_scaled<T: MomentFloat>(src: &[T], scale: T, dst: &mut [T]) {
    push::copy_scaled(src, scale, dst);
}

/// Subtract `src` from `dst`, refusing to produce a negative weight.
pub fn subtract<T: MomentFloat>(mom: Moments, src: &[T], dst: &mut [T]) -> Result<()> {
    mom.check_len("src", src.len())?;
    mom.check_len("dst", dst.len())?;
    if src[0] > dst[0] {
        tracing::debug!(removed = ?src[0], total = ?dst[0], "rejected subtraction");
        return Err(MomentsError::NegativeWeight {
            removed: src[0].to_f64().unwrap_or(f64::NAN),
            total: dst[0].to_f64().unwrap_or(f64::NAN),
        });
    }
    merge_scaled(mom, src, -T::one(), dst);
    Ok(())
}

/// Multiply the weight of `acc` by `scale`.
#[inline]
pub fn scale_weight<T: MomentFloat>(acc: &mut [T], scale: T) {
    acc[0] = acc[0] * scale;
}
