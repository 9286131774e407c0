//! Reductions along the sample axis.
//!
//! Single-series reductions fold strictly left to right. Batched variants
//! take batch-major input (`nbatch` rows of `nsamp` samples or
//! accumulators) and fold each row independently, possibly on rayon.

use crate::error::{MomentsError, Result};
use crate::float::MomentFloat;
use crate::kernel;
use crate::matrix::MomentArray;
use crate::maybe_par_chunks_mut_enumerate;
use crate::moments::Moments;
use crate::parallel::Parallel;
use crate::push;
use crate::samples::Samples;

fn batch_count(len: usize, nsamp: usize) -> Result<usize> {
    if nsamp == 0 {
        return if len == 0 {
            Ok(0)
        } else {
            Err(MomentsError::EmptySampleAxis)
        };
    }
    if len % nsamp != 0 {
        return Err(MomentsError::LengthMismatch {
            name: "batch",
            expected: (len / nsamp + 1) * nsamp,
            actual: len,
        });
    }
    Ok(len / nsamp)
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Fold `samples` into `out`, which may already hold data.
///
/// # Arguments
/// * `out` - Accumulator of shape `mom`, updated in place
/// * `mom` - Moment shape
/// * `samples` - Values (and weights) to fold, in order
///
/// # Errors
///
/// [`MomentsError::LengthMismatch`] when `out` does not match `mom`, or
/// [`MomentsError::WrongMomentsKind`] when `samples` carry the wrong number
/// of variates.
pub fn reduce_vals_into<T: MomentFloat>(
    out: &mut [T],
    mom: Moments,
    samples: &Samples<'_, T>,
) -> Result<()> {
    mom.check_len("out", out.len())?;
    samples.check_moments(mom)?;
    for i in 0..samples.len() {
        let (x, y, w) = samples.get(i);
        kernel::push_val(mom, out, x, y, w);
    }
    Ok(())
}

/// Reduce weighted values to a single accumulator.
///
/// # Examples
///
/// ```
/// use central_moments::moments::Moments;
/// use central_moments::reduction::reduce_vals;
/// use central_moments::samples::Samples;
///
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let acc = reduce_vals(Moments::Univariate(2), &Samples::unweighted(&x)).unwrap();
/// assert_eq!(acc, vec![4.0, 2.5, 1.25]);
/// ```
///
/// # Errors
///
/// [`MomentsError::InvalidOrder`] for an order outside `1..=MAX_ORDER`,
/// otherwise as [`reduce_vals_into`].
pub fn reduce_vals<T: MomentFloat>(mom: Moments, samples: &Samples<'_, T>) -> Result<Vec<T>> {
    let mom = mom.validate()?;
    let mut out = vec![T::zero(); mom.size()];
    reduce_vals_into(&mut out, mom, samples)?;
    Ok(out)
}

/// Two-pass reduction: weighted mean(s) first, then normalised central sums.
///
/// Independent of the streaming update, so it serves as a cross-check.
///
/// # Errors
///
/// As [`reduce_vals`].
pub fn reduce_vals_multipass<T: MomentFloat>(
    mom: Moments,
    samples: &Samples<'_, T>,
) -> Result<Vec<T>> {
    let mom = mom.validate()?;
    samples.check_moments(mom)?;
    let mut out = vec![T::zero(); mom.size()];

    let n = samples.len();
    let mut weight = T::zero();
    let mut sum0 = T::zero();
    let mut sum1 = T::zero();
    for i in 0..n {
        let (x, y, w) = samples.get(i);
        weight = weight + w;
        sum0 = sum0 + w * x;
        sum1 = sum1 + w * y;
    }
    if weight == T::zero() {
        return Ok(out);
    }
    let mean0 = sum0 / weight;
    let mean1 = sum1 / weight;

    match mom {
        Moments::Univariate(order) => {
            for i in 0..n {
                let (x, _, w) = samples.get(i);
                let dx = x - mean0;
                let mut p = w * dx;
                for k in 2..=order {
                    p = p * dx;
                    out[k] = out[k] + p;
                }
            }
            for v in out.iter_mut().skip(2) {
                *v = *v / weight;
            }
            out[1] = mean0;
        }
        Moments::Bivariate(..) => {
            let (nrow, ncol) = mom.shape();
            for s in 0..n {
                let (x, y, w) = samples.get(s);
                let (dx, dy) = (x - mean0, y - mean1);
                let mut px = w;
                for i in 0..nrow {
                    let mut p = px;
                    for j in 0..ncol {
                        if i + j >= 2 {
                            out[i * ncol + j] = out[i * ncol + j] + p;
                        }
                        p = p * dy;
                    }
                    px = px * dx;
                }
            }
            for (idx, v) in out.iter_mut().enumerate() {
                if idx / ncol + idx % ncol >= 2 {
                    *v = *v / weight;
                }
            }
            out[ncol] = mean0;
            out[1] = mean1;
        }
    }
    out[0] = weight;
    Ok(out)
}

/// Pool pre-computed univariate statistics.
///
/// `central` is row-major with `M - 1` columns holding the central moments
/// of orders `2..=M` for each statistic.
///
/// # Arguments
/// * `mom` - Univariate moment shape of the result
/// * `weights` - Weight of each statistic
/// * `means` - Mean of each statistic
/// * `central` - Central moments of orders `2..=M`, one row per statistic
///
/// # Errors
///
/// [`MomentsError::InvalidOrder`], [`MomentsError::WrongMomentsKind`] for
/// bivariate `mom`, or [`MomentsError::LengthMismatch`] when `means` or
/// `central` disagree with `weights`.
pub fn reduce_stats<T: MomentFloat>(
    mom: Moments,
    weights: &[T],
    means: &[T],
    central: &[T],
) -> Result<Vec<T>> {
    let order = mom.validate()?.require_univariate("reduce_stats")?;
    let n = weights.len();
    if means.len() != n {
        return Err(MomentsError::LengthMismatch {
            name: "means",
            expected: n,
            actual: means.len(),
        });
    }
    let stride = order - 1;
    if central.len() != n * stride {
        return Err(MomentsError::LengthMismatch {
            name: "central",
            expected: n * stride,
            actual: central.len(),
        });
    }
    let mut out = vec![T::zero(); order + 1];
    for k in 0..n {
        let stats = &central[k * stride..(k + 1) * stride];
        push::push_stat(&mut out, means[k], stats, weights[k]);
    }
    Ok(out)
}

/// Reduce `nbatch x nsamp` batch-major samples to `nbatch` accumulators.
///
/// # Arguments
/// * `samples` - Batch-major values, `nbatch * nsamp` long
/// * `nsamp` - Samples per batch row
/// * `mom` - Moment shape
/// * `policy` - Threading policy across batch rows
///
/// # Errors
///
/// As [`reduce_vals`], plus [`MomentsError::EmptySampleAxis`] or
/// [`MomentsError::LengthMismatch`] when the length is not a multiple of
/// `nsamp`.
pub fn reduce_vals_batch<T: MomentFloat>(
    samples: &Samples<'_, T>,
    nsamp: usize,
    mom: Moments,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    let mom = mom.validate()?;
    samples.check_moments(mom)?;
    let nbatch = batch_count(samples.len(), nsamp)?;
    let mut out = MomentArray::zeroed(nbatch, mom);
    if nbatch == 0 {
        return Ok(out);
    }

    let parallel = policy.resolve("reduce_vals_batch", samples.len() * mom.size());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        mom.size(),
        parallel,
        |(b, acc): (usize, &mut [T])| {
            let row = samples.slice(b * nsamp..(b + 1) * nsamp);
            for s in 0..nsamp {
                let (x, y, w) = row.get(s);
                kernel::push_val(mom, acc, x, y, w);
            }
        }
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Merge every accumulator of `data` into `out`, in order.
///
/// # Errors
///
/// [`MomentsError::LengthMismatch`] when `out` does not match `data`.
pub fn reduce_data_into<T: MomentFloat>(out: &mut [T], data: &MomentArray<T>) -> Result<()> {
    let mom = data.mom();
    mom.check_len("out", out.len())?;
    for acc in data.iter() {
        kernel::merge(mom, acc, out);
    }
    Ok(())
}

/// Merge all accumulators of `data` into one.
pub fn reduce_data<T: MomentFloat>(data: &MomentArray<T>) -> Vec<T> {
    let mom = data.mom();
    let mut out = vec![T::zero(); mom.size()];
    for acc in data.iter() {
        kernel::merge(mom, acc, &mut out);
    }
    out
}

/// Like [`reduce_data`], but the result starts as a copy of the first
/// accumulator instead of merging it into zero.
pub fn reduce_data_fromzero<T: MomentFloat>(data: &MomentArray<T>) -> Vec<T> {
    let mom = data.mom();
    let mut out = vec![T::zero(); mom.size()];
    let mut iter = data.iter();
    if let Some(first) = iter.next() {
        kernel::copy_scaled(first, T::one(), &mut out);
    }
    for acc in iter {
        kernel::merge(mom, acc, &mut out);
    }
    out
}

/// Reduce `nbatch x nsamp` batch-major accumulators to `nbatch`.
///
/// # Errors
///
/// [`MomentsError::EmptySampleAxis`] or [`MomentsError::LengthMismatch`]
/// when `data.len()` is not a multiple of `nsamp`.
pub fn reduce_data_batch<T: MomentFloat>(
    data: &MomentArray<T>,
    nsamp: usize,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    let mom = data.mom();
    let nbatch = batch_count(data.len(), nsamp)?;
    let mut out = MomentArray::zeroed(nbatch, mom);
    if nbatch == 0 {
        return Ok(out);
    }

    let parallel = policy.resolve("reduce_data_batch", data.as_slice().len());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        mom.size(),
        parallel,
        |(b, acc): (usize, &mut [T])| {
            for s in 0..nsamp {
                kernel::merge(mom, &data[b * nsamp + s], acc);
            }
        }
    );
    Ok(out)
}

fn cumulative_row<T: MomentFloat>(mom: Moments, src: &[T], dst: &mut [T], inverse: bool) {
    let size = mom.size();
    if src.is_empty() {
        return;
    }
    dst[..size].copy_from_slice(&src[..size]);
    for i in 1..src.len() / size {
        let (done, rest) = dst.split_at_mut(i * size);
        let cur = &mut rest[..size];
        cur.copy_from_slice(&src[i * size..(i + 1) * size]);
        if inverse {
            kernel::merge_scaled(mom, &src[(i - 1) * size..i * size], -T::one(), cur);
        } else {
            kernel::merge(mom, &done[(i - 1) * size..], cur);
        }
    }
}

/// Running merge: element `i` holds the pooled accumulators `0..=i`.
///
/// ```
/// use central_moments::matrix::MomentArray;
/// use central_moments::moments::Moments;
/// use central_moments::reduction::cumulative;
///
/// let mom = Moments::Univariate(1);
/// let data = MomentArray::from_vec(vec![1.0, 1.0, 1.0, 3.0], mom).unwrap();
/// let out = cumulative(&data);
/// assert_eq!(&out[1], &[2.0, 2.0]);
/// ```
pub fn cumulative<T: MomentFloat>(data: &MomentArray<T>) -> MomentArray<T> {
    let mut out = MomentArray::zeroed(data.len(), data.mom());
    cumulative_row(data.mom(), data.as_slice(), out.as_mut_slice(), false);
    out
}

/// Undo [`cumulative`]: element `i` is `data[i]` minus `data[i - 1]`.
pub fn cumulative_inverse<T: MomentFloat>(data: &MomentArray<T>) -> MomentArray<T> {
    let mut out = MomentArray::zeroed(data.len(), data.mom());
    cumulative_row(data.mom(), data.as_slice(), out.as_mut_slice(), true);
    out
}

/// [`cumulative`] (or its inverse) over each row of `nbatch x nsamp`
/// batch-major accumulators.
///
/// # Errors
///
/// As [`reduce_data_batch`].
pub fn cumulative_batch<T: MomentFloat>(
    data: &MomentArray<T>,
    nsamp: usize,
    inverse: bool,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    let mom = data.mom();
    let nbatch = batch_count(data.len(), nsamp)?;
    let mut out = MomentArray::zeroed(data.len(), mom);
    if nbatch == 0 {
        return Ok(out);
    }
    let row = nsamp * mom.size();
    let parallel = policy.resolve("cumulative_batch", data.as_slice().len());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        row,
        parallel,
        |(b, dst): (usize, &mut [T])| {
            cumulative_row(mom, &data.as_slice()[b * row..(b + 1) * row], dst, inverse);
        }
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::allclose;

    const X: [f64; 8] = [0.3, -1.2, 2.5, 0.8, 4.1, -0.6, 1.9, 3.3];
    const W: [f64; 8] = [1.0, 0.5, 2.0, 1.5, 0.25, 1.0, 3.0, 0.75];

    #[test]
    fn test_reduce_vals_scenario() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let acc = reduce_vals(Moments::Univariate(2), &Samples::unweighted(&x)).unwrap();
        assert!(allclose(&acc, &[4.0, 2.5, 1.25], 1e-12, 1e-12));
    }

    #[test]
    fn test_reduce_vals_matches_multipass() {
        let s = Samples::new(&X, &W).unwrap();
        let mom = Moments::Univariate(5);
        let a = reduce_vals(mom, &s).unwrap();
        let b = reduce_vals_multipass(mom, &s).unwrap();
        assert!(allclose(&a, &b, 1e-9, 1e-10));
    }

    #[test]
    fn test_reduce_vals_bivariate_matches_multipass() {
        let y: Vec<f64> = X.iter().map(|x| 0.5 * x * x - 1.0).collect();
        let s = Samples::bivariate(&X, &y, Some(&W)).unwrap();
        let mom = Moments::Bivariate(3, 2);
        let a = reduce_vals(mom, &s).unwrap();
        let b = reduce_vals_multipass(mom, &s).unwrap();
        assert!(allclose(&a, &b, 1e-9, 1e-10));
    }

    #[test]
    fn test_reduce_vals_rejects_kind() {
        let s = Samples::unweighted(&X);
        assert!(reduce_vals(Moments::Bivariate(1, 1), &s).is_err());
        assert!(reduce_vals(Moments::Univariate(0), &s).is_err());
        let mut out = vec![0.0; 2];
        assert!(reduce_vals_into(&mut out, Moments::Univariate(2), &s).is_err());
    }

    #[test]
    fn test_multipass_zero_weight() {
        let s = Samples::new(&[1.0, 2.0], &[0.0, 0.0]).unwrap();
        let out = reduce_vals_multipass(Moments::Univariate(3), &s).unwrap();
        assert_eq!(out, vec![0.0; 4]);
    }

    #[test]
    fn test_reduce_stats() {
        let mom = Moments::Univariate(3);
        let left = reduce_vals(mom, &Samples::new(&X[..3], &W[..3]).unwrap()).unwrap();
        let right = reduce_vals(mom, &Samples::new(&X[3..], &W[3..]).unwrap()).unwrap();
        let whole = reduce_vals(mom, &Samples::new(&X, &W).unwrap()).unwrap();
        let out = reduce_stats(
            mom,
            &[left[0], right[0]],
            &[left[1], right[1]],
            &[left[2], left[3], right[2], right[3]],
        )
        .unwrap();
        assert!(allclose(&out, &whole, 1e-10, 1e-12));
        assert!(reduce_stats(mom, &[1.0], &[0.0], &[0.0]).is_err());
        assert!(reduce_stats(Moments::Bivariate(1, 1), &[1.0], &[0.0], &[]).is_err());
    }

    #[test]
    fn test_reduce_vals_batch() {
        let s = Samples::new(&X, &W).unwrap();
        let mom = Moments::Univariate(3);
        for policy in [Parallel::Never, Parallel::Always] {
            let out = reduce_vals_batch(&s, 4, mom, policy).unwrap();
            assert_eq!(out.len(), 2);
            let first = reduce_vals(mom, &s.slice(0..4)).unwrap();
            let second = reduce_vals(mom, &s.slice(4..8)).unwrap();
            assert_eq!(&out[0], first.as_slice());
            assert_eq!(&out[1], second.as_slice());
        }
        assert!(reduce_vals_batch(&s, 3, mom, Parallel::Never).is_err());
        assert!(matches!(
            reduce_vals_batch(&s, 0, mom, Parallel::Never),
            Err(MomentsError::EmptySampleAxis)
        ));
    }

    fn per_sample(mom: Moments) -> MomentArray<f64> {
        let mut arr = MomentArray::zeros(X.len(), mom).unwrap();
        for i in 0..X.len() {
            kernel::push_val(mom, &mut arr[i], X[i], 0.0, W[i]);
        }
        arr
    }

    #[test]
    fn test_reduce_data_matches_vals() {
        let mom = Moments::Univariate(4);
        let data = per_sample(mom);
        let whole = reduce_vals(mom, &Samples::new(&X, &W).unwrap()).unwrap();
        assert!(allclose(&reduce_data(&data), &whole, 1e-10, 1e-12));
        assert!(allclose(&reduce_data_fromzero(&data), &whole, 1e-10, 1e-12));

        let mut out = vec![0.0; 5];
        reduce_data_into(&mut out, &data).unwrap();
        assert!(allclose(&out, &whole, 1e-10, 1e-12));
    }

    #[test]
    fn test_reduce_data_batch() {
        let mom = Moments::Univariate(2);
        let data = per_sample(mom);
        let out = reduce_data_batch(&data, 2, Parallel::Always).unwrap();
        assert_eq!(out.len(), 4);
        for b in 0..4 {
            let range = 2 * b..2 * b + 2;
            let row = Samples::new(&X[range.clone()], &W[range]).unwrap();
            let expected = reduce_vals(mom, &row).unwrap();
            assert!(allclose(&out[b], &expected, 1e-12, 1e-12));
        }
    }

    #[test]
    fn test_cumulative_and_inverse() {
        let mom = Moments::Univariate(3);
        let data = per_sample(mom);
        let cum = cumulative(&data);
        for i in 0..X.len() {
            let expected = reduce_vals(mom, &Samples::new(&X[..=i], &W[..=i]).unwrap()).unwrap();
            assert!(allclose(&cum[i], &expected, 1e-10, 1e-12), "position {}", i);
        }
        let back = cumulative_inverse(&cum);
        assert!(allclose(back.as_slice(), data.as_slice(), 1e-8, 1e-10));
    }

    #[test]
    fn test_cumulative_batch() {
        let mom = Moments::Univariate(2);
        let data = per_sample(mom);
        let out = cumulative_batch(&data, 4, false, Parallel::Always).unwrap();
        let first = MomentArray::from_slice(data.rows(0, 4), mom).unwrap();
        let second = MomentArray::from_slice(data.rows(4, 8), mom).unwrap();
        assert_eq!(out.rows(0, 4), cumulative(&first).as_slice());
        assert_eq!(out.rows(4, 8), cumulative(&second).as_slice());

        let inv = cumulative_batch(&out, 4, true, Parallel::Never).unwrap();
        assert!(allclose(inv.as_slice(), data.as_slice(), 1e-8, 1e-10));
    }

    #[test]
    fn test_cumulative_empty() {
        let data = MomentArray::<f64>::zeros(0, Moments::Univariate(2)).unwrap();
        assert!(cumulative(&data).is_empty());
        assert!(reduce_data_batch(&data, 0, Parallel::Never).unwrap().is_empty());
    }
}
