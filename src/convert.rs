//! Conversions between central and raw moments, plus statistics accessors.
//!
//! Raw accumulators keep the same layout as central ones: weight at index
//! 0, mean(s) at the first-order position(s), and `<x^n>` (or `<x0^i x1^j>`)
//! in place of the central moments.

use crate::binomial::coefficient;
use crate::error::{MomentsError, Result};
use crate::float::MomentFloat;
use crate::helpers::{cast, cast_usize};
use crate::matrix::MomentArray;
use crate::maybe_par_chunks_mut_enumerate;
use crate::moments::{Moments, MomentsType};
use crate::parallel::Parallel;

/// Univariate central -> raw.
///
/// `raw[n] = sum_{i=0}^{n-2} C(n,i) central[n-i] mean^i + mean^n`
pub fn central_to_raw<T: MomentFloat>(central: &[T], raw: &mut [T]) {
    assert_eq!(central.len(), raw.len(), "central/raw length mismatch");
    let ave = central[1];
    raw[0] = central[0];
    raw[1] = ave;

    for n in 2..central.len() {
        let mut total = T::zero();
        let mut ave_i = T::one();
        for i in 0..n - 1 {
            total = total + central[n - i] * ave_i * coefficient::<T>(n, i);
            ave_i = ave_i * ave;
        }
        // i = n-1 vanishes (first central moment), i = n is mean^n
        raw[n] = total + ave_i * ave;
    }
}

/// Univariate raw -> central.
///
/// `central[n] = sum_{i=0}^{n-2} C(n,i) raw[n-i] (-mean)^i + mean (-mean)^(n-1) (n - 1)`
pub fn raw_to_central<T: MomentFloat>(raw: &[T], central: &mut [T]) {
    assert_eq!(central.len(), raw.len(), "central/raw length mismatch");
    let ave = raw[1];
    central[0] = raw[0];
    central[1] = ave;

    for n in 2..raw.len() {
        let mut total = T::zero();
        let mut ave_i = T::one();
        for i in 0..n - 1 {
            total = total + raw[n - i] * ave_i * coefficient::<T>(n, i);
            ave_i = ave_i * -ave;
        }
        // i = n-1 and i = n collapse to (n - 1) mean (-mean)^(n-1)
        central[n] = total + ave * ave_i * cast_usize::<T>(n - 1);
    }
}

/// Bivariate central -> raw on a row-major `shape` grid.
pub fn central_to_raw_cov<T: MomentFloat>(central: &[T], shape: (usize, usize), raw: &mut [T]) {
    comoment_transform(central, shape, raw, false);
}

/// Bivariate raw -> central on a row-major `shape` grid.
pub fn raw_to_central_cov<T: MomentFloat>(raw: &[T], shape: (usize, usize), central: &mut [T]) {
    comoment_transform(raw, shape, central, true);
}

/// Expand `<(x0 + s0)^i (x1 + s1)^j>` binomially in both variates.
///
/// Central -> raw shifts by `+mean` with `<x - mean>` terms vanishing;
/// raw -> central shifts by `-mean` with `<x>` terms equal to the mean.
fn comoment_transform<T: MomentFloat>(
    src: &[T],
    shape: (usize, usize),
    dst: &mut [T],
    to_central: bool,
) {
    let (nrow, ncol) = shape;
    assert_eq!(src.len(), nrow * ncol, "co-moment grid length mismatch");
    assert_eq!(src.len(), dst.len(), "co-moment grid length mismatch");

    let mean0 = src[ncol];
    let mean1 = src[1];
    let (shift0, shift1) = if to_central {
        (-mean0, -mean1)
    } else {
        (mean0, mean1)
    };

    let cell = |p: usize, q: usize| -> T {
        match (p, q) {
            (0, 0) => T::one(),
            (1, 0) if to_central => mean0,
            (0, 1) if to_central => mean1,
            (1, 0) | (0, 1) => T::zero(),
            _ => src[p * ncol + q],
        }
    };

    for i in 0..nrow {
        for j in 0..ncol {
            if i + j < 2 {
                dst[i * ncol + j] = src[i * ncol + j];
                continue;
            }
            let mut total = T::zero();
            let mut s0_a = T::one();
            for a in 0..=i {
                let mut s1_b = T::one();
                for b in 0..=j {
                    let c = coefficient::<T>(i, a) * coefficient::<T>(j, b);
                    total = total + c * s0_a * s1_b * cell(i - a, j - b);
                    s1_b = s1_b * shift1;
                }
                s0_a = s0_a * shift0;
            }
            dst[i * ncol + j] = total;
        }
    }
}

/// Convert one accumulator into `to` form, assuming it is in the other form.
pub fn convert_one<T: MomentFloat>(acc: &[T], mom: Moments, to: MomentsType, out: &mut [T]) {
    match (mom, to) {
        (Moments::Univariate(_), MomentsType::Raw) => central_to_raw(acc, out),
        (Moments::Univariate(_), MomentsType::Central) => raw_to_central(acc, out),
        (Moments::Bivariate(..), MomentsType::Raw) => central_to_raw_cov(acc, mom.shape(), out),
        (Moments::Bivariate(..), MomentsType::Central) => raw_to_central_cov(acc, mom.shape(), out),
    }
}

/// Convert every accumulator of `data` into `to` form.
pub fn convert<T: MomentFloat>(
    data: &MomentArray<T>,
    to: MomentsType,
    policy: Parallel,
) -> MomentArray<T> {
    let mom = data.mom();
    let size = mom.size();
    let mut out = MomentArray::zeroed(data.len(), mom);
    if data.is_empty() {
        return out;
    }
    let parallel = policy.resolve("convert", data.as_slice().len());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        size,
        parallel,
        |(i, acc): (usize, &mut [T])| {
            convert_one(&data[i], mom, to, acc);
        }
    );
    out
}

/// Central moments with weight set to 1 and means set to 0.
///
/// Cell `n` (or `(i, j)`) is then the plain central moment `<(x - mean)^n>`.
pub fn cmom<T: MomentFloat>(acc: &[T], mom: Moments) -> Vec<T> {
    let mut out = acc.to_vec();
    out[0] = T::one();
    match mom {
        Moments::Univariate(_) => out[1] = T::zero(),
        Moments::Bivariate(..) => {
            let ncol = mom.shape().1;
            out[1] = T::zero();
            out[ncol] = T::zero();
        }
    }
    out
}

/// Raw moments with the weight set to 1; cell `n` is `<x^n>`, so index 1
/// stays the mean.
pub fn rmom<T: MomentFloat>(acc: &[T], mom: Moments) -> Vec<T> {
    let mut out = vec![T::zero(); acc.len()];
    convert_one(acc, mom, MomentsType::Raw, &mut out);
    out[0] = T::one();
    out
}

/// Univariate moments of order `M >= m0 + m1` viewed as co-moments of the
/// variate with itself: cell `(i, j)` holds the moment of order `i + j`.
///
/// # Errors
///
/// [`MomentsError::WrongMomentsKind`] for bivariate `mom`,
/// [`MomentsError::LengthMismatch`] when `acc` does not match `mom`, or
/// [`MomentsError::InvalidOrder`] when `m0 + m1` exceeds the order of `acc`.
pub fn moments_to_comoments<T: MomentFloat>(
    acc: &[T],
    mom: Moments,
    target: (usize, usize),
) -> Result<Vec<T>> {
    let order = mom.require_univariate("moments_to_comoments")?;
    mom.check_len("acc", acc.len())?;
    let out_mom = Moments::bivariate(target.0, target.1)?;
    if target.0 + target.1 > order {
        return Err(MomentsError::InvalidOrder {
            order: target.0 + target.1,
            max: order,
        });
    }
    let ncol = out_mom.shape().1;
    let mut out = vec![T::zero(); out_mom.size()];
    for i in 0..=target.0 {
        for j in 0..=target.1 {
            // (1, 0) and (0, 1) both map to the mean
            out[i * ncol + j] = acc[i + j];
        }
    }
    Ok(out)
}

/// Total weight.
#[inline]
pub fn weight<T: MomentFloat>(acc: &[T]) -> T {
    acc[0]
}

/// Mean of a univariate accumulator, or of the first variate of a bivariate
/// one.
pub fn mean<T: MomentFloat>(acc: &[T], mom: Moments) -> T {
    match mom {
        Moments::Univariate(_) => acc[1],
        Moments::Bivariate(..) => acc[mom.shape().1],
    }
}

/// Population variance (`NaN` when order < 2).
pub fn variance<T: MomentFloat>(acc: &[T], mom: Moments) -> T {
    match mom {
        Moments::Univariate(m) if m >= 2 => acc[2],
        Moments::Bivariate(m0, _) if m0 >= 2 => acc[2 * mom.shape().1],
        _ => T::nan(),
    }
}

/// Population standard deviation.
pub fn std_dev<T: MomentFloat>(acc: &[T], mom: Moments) -> T {
    variance(acc, mom).sqrt()
}

/// `m3 / m2^(3/2)` of a univariate accumulator of order >= 3.
pub fn skewness<T: MomentFloat>(acc: &[T], mom: Moments) -> T {
    match mom {
        Moments::Univariate(m) if m >= 3 => acc[3] / acc[2].powf(cast::<T>(1.5)),
        _ => T::nan(),
    }
}

/// Excess kurtosis `m4 / m2^2 - 3` of a univariate accumulator of order >= 4.
pub fn excess_kurtosis<T: MomentFloat>(acc: &[T], mom: Moments) -> T {
    match mom {
        Moments::Univariate(m) if m >= 4 => acc[4] / (acc[2] * acc[2]) - cast_usize::<T>(3),
        _ => T::nan(),
    }
}

/// Population covariance, cell `(1, 1)` of a bivariate accumulator.
pub fn covariance<T: MomentFloat>(acc: &[T], mom: Moments) -> T {
    match mom {
        Moments::Bivariate(..) => acc[mom.shape().1 + 1],
        Moments::Univariate(_) => variance(acc, mom),
    }
}

/// Pearson correlation; needs second moments of both variates.
pub fn correlation<T: MomentFloat>(acc: &[T], mom: Moments) -> T {
    match mom {
        Moments::Bivariate(m0, m1) if m0 >= 2 && m1 >= 2 => {
            let ncol = mom.shape().1;
            acc[ncol + 1] / (acc[2 * ncol] * acc[2]).sqrt()
        }
        _ => T::nan(),
    }
}
