//! Grouped and indexed reductions.
//!
//! Two representations of "which samples go where":
//!
//! - dense: one group id per sample (`by[i]`), negative ids excluded;
//! - indexed: a permutation of sample indices plus one half-open range
//!   `[start[g], end[g])` into it per group, and optionally a scale per
//!   position (see [`IndexedGroups`]).
//!
//! [`factor_by_to_index`] turns the first into the second.

use std::ops::Range;

use crate::error::{MomentsError, Result};
use crate::float::MomentFloat;
use crate::kernel;
use crate::matrix::MomentArray;
use crate::maybe_par_chunks_mut_enumerate;
use crate::moments::Moments;
use crate::parallel::Parallel;
use crate::samples::Samples;

fn check_by(by: &[i64], ndat: usize, ngroup: usize) -> Result<()> {
    if by.len() != ndat {
        return Err(MomentsError::LengthMismatch {
            name: "by",
            expected: ndat,
            actual: by.len(),
        });
    }
    if let Some(&group) = by.iter().max() {
        if group >= 0 && group as usize >= ngroup {
            return Err(MomentsError::GroupOutOfRange { group, ngroup });
        }
    }
    Ok(())
}

/// Merge `data[i]` into `out[by[i]]` in sample order, skipping negative ids.
///
/// # Errors
///
/// [`MomentsError::MomentsMismatch`] when `out` and `data` differ in shape,
/// [`MomentsError::LengthMismatch`] when `by` is not one id per accumulator,
/// or [`MomentsError::GroupOutOfRange`] for an id `>= out.len()`.
pub fn reduce_data_grouped_into<T: MomentFloat>(
    out: &mut MomentArray<T>,
    data: &MomentArray<T>,
    by: &[i64],
) -> Result<()> {
    out.check_moments(data)?;
    check_by(by, data.len(), out.len())?;
    let mom = data.mom();
    for (acc, &group) in data.iter().zip(by) {
        if group >= 0 {
            kernel::merge(mom, acc, &mut out[group as usize]);
        }
    }
    Ok(())
}

/// Reduce accumulators into `ngroup` groups.
///
/// # Examples
///
/// ```
/// use central_moments::grouped::reduce_data_grouped;
/// use central_moments::matrix::MomentArray;
/// use central_moments::moments::Moments;
///
/// let mom = Moments::Univariate(1);
/// let data = MomentArray::from_vec(vec![1.0, 0.0, 1.0, 2.0, 1.0, 4.0], mom).unwrap();
/// let out = reduce_data_grouped(&data, &[0, -1, 0], 1).unwrap();
/// assert_eq!(&out[0], &[2.0, 2.0]);
/// ```
///
/// # Errors
///
/// As [`reduce_data_grouped_into`].
pub fn reduce_data_grouped<T: MomentFloat>(
    data: &MomentArray<T>,
    by: &[i64],
    ngroup: usize,
) -> Result<MomentArray<T>> {
    let mut out = MomentArray::zeroed(ngroup, data.mom());
    reduce_data_grouped_into(&mut out, data, by)?;
    Ok(out)
}

/// Push `samples[i]` into group `by[i]` in sample order, skipping negative ids.
///
/// # Errors
///
/// [`MomentsError::InvalidOrder`], [`MomentsError::WrongMomentsKind`] when
/// the samples do not match `mom`, otherwise as [`reduce_data_grouped_into`].
pub fn reduce_vals_grouped<T: MomentFloat>(
    samples: &Samples<'_, T>,
    mom: Moments,
    by: &[i64],
    ngroup: usize,
) -> Result<MomentArray<T>> {
    let mom = mom.validate()?;
    samples.check_moments(mom)?;
    check_by(by, samples.len(), ngroup)?;
    let mut out = MomentArray::zeroed(ngroup, mom);
    for (i, &group) in by.iter().enumerate() {
        if group >= 0 {
            let (x, y, w) = samples.get(i);
            kernel::push_val(mom, &mut out[group as usize], x, y, w);
        }
    }
    Ok(out)
}

/// Sparse group description: group `g` is made of samples
/// `index[start[g]..end[g]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedGroups {
    /// Group label of each range.
    pub groups: Vec<i64>,
    pub index: Vec<usize>,
    pub start: Vec<usize>,
    pub end: Vec<usize>,
}

impl IndexedGroups {
    /// Build from explicit ranges; groups are labelled `0..start.len()`.
    pub fn new(index: Vec<usize>, start: Vec<usize>, end: Vec<usize>) -> Result<Self> {
        if start.len() != end.len() {
            return Err(MomentsError::LengthMismatch {
                name: "group_end",
                expected: start.len(),
                actual: end.len(),
            });
        }
        let out = Self {
            groups: (0..start.len() as i64).collect(),
            index,
            start,
            end,
        };
        out.check_ranges()?;
        Ok(out)
    }

    fn check_ranges(&self) -> Result<()> {
        let nindex = self.index.len();
        for (group, (&s, &e)) in self.start.iter().zip(&self.end).enumerate() {
            if s > e || e > nindex {
                return Err(MomentsError::InvalidGroupRange {
                    group,
                    start: s,
                    end: e,
                    nindex,
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn ngroup(&self) -> usize {
        self.start.len()
    }

    /// Positions into `index` belonging to group `g`.
    #[inline]
    pub fn range(&self, g: usize) -> Range<usize> {
        self.start[g]..self.end[g]
    }

    /// Check ranges, every sample index against `ndat`, and an optional
    /// per-position scale against `index`.
    pub fn check<T>(&self, ndat: usize, scale: Option<&[T]>) -> Result<()> {
        if self.start.len() != self.end.len() {
            return Err(MomentsError::LengthMismatch {
                name: "group_end",
                expected: self.start.len(),
                actual: self.end.len(),
            });
        }
        self.check_ranges()?;
        if let Some(&index) = self.index.iter().find(|&&i| i >= ndat) {
            return Err(MomentsError::IndexOutOfRange { index, ndat });
        }
        if let Some(scale) = scale {
            if scale.len() != self.index.len() {
                return Err(MomentsError::LengthMismatch {
                    name: "scale",
                    expected: self.index.len(),
                    actual: scale.len(),
                });
            }
        }
        Ok(())
    }
}

/// Convert dense group ids to [`IndexedGroups`].
///
/// Groups are the sorted distinct non-negative ids; within a group the
/// original sample order is kept.
///
/// ```
/// use central_moments::grouped::factor_by_to_index;
///
/// let g = factor_by_to_index(&[1, 0, -1, 1, 0]);
/// assert_eq!(g.groups, vec![0, 1]);
/// assert_eq!(g.index, vec![1, 4, 0, 3]);
/// assert_eq!((g.start, g.end), (vec![0, 2], vec![2, 4]));
/// ```
pub fn factor_by_to_index(by: &[i64]) -> IndexedGroups {
    let mut pairs: Vec<(i64, usize)> = by
        .iter()
        .enumerate()
        .filter(|&(_, &g)| g >= 0)
        .map(|(i, &g)| (g, i))
        .collect();
    pairs.sort_by_key(|&(g, _)| g);

    let mut groups = Vec::new();
    let mut start = Vec::new();
    let mut end = Vec::new();
    for (pos, &(g, _)) in pairs.iter().enumerate() {
        if groups.last() != Some(&g) {
            if !groups.is_empty() {
                end.push(pos);
            }
            groups.push(g);
            start.push(pos);
        }
    }
    if !groups.is_empty() {
        end.push(pairs.len());
    }

    IndexedGroups {
        groups,
        index: pairs.into_iter().map(|(_, i)| i).collect(),
        start,
        end,
    }
}

#[inline]
fn scale_at<T: MomentFloat>(scale: Option<&[T]>, p: usize) -> T {
    scale.map_or_else(T::one, |s| s[p])
}

/// Merge `scale[p] * data[index[p]]` into `out[g]` for each group range, in
/// range order. `out` may already hold data.
///
/// # Errors
///
/// [`MomentsError::MomentsMismatch`] when `out` and `data` differ in shape,
/// [`MomentsError::IndexOutOfRange`] for an index `>= data.len()`, or
/// [`MomentsError::LengthMismatch`] when `scale` is not one per index or
/// `out` is not one per group.
pub fn reduce_data_indexed_into<T: MomentFloat>(
    out: &mut MomentArray<T>,
    data: &MomentArray<T>,
    groups: &IndexedGroups,
    scale: Option<&[T]>,
    policy: Parallel,
) -> Result<()> {
    out.check_moments(data)?;
    groups.check(data.len(), scale)?;
    if out.len() != groups.ngroup() {
        return Err(MomentsError::LengthMismatch {
            name: "out",
            expected: groups.ngroup(),
            actual: out.len(),
        });
    }
    if out.is_empty() {
        return Ok(());
    }
    let mom = data.mom();
    let parallel = policy.resolve("reduce_data_indexed", groups.index.len() * mom.size());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        mom.size(),
        parallel,
        |(g, acc): (usize, &mut [T])| {
            for p in groups.range(g) {
                kernel::merge_scaled(mom, &data[groups.index[p]], scale_at(scale, p), acc);
            }
        }
    );
    Ok(())
}

/// Indexed reduction into fresh accumulators.
///
/// The first position of each nonempty range is a scaled copy; the rest are
/// merged with [`kernel::merge_scaled`]. Empty ranges give zero accumulators.
///
/// # Errors
///
/// As [`reduce_data_indexed_into`].
pub fn reduce_data_indexed_fromzero<T: MomentFloat>(
    data: &MomentArray<T>,
    groups: &IndexedGroups,
    scale: Option<&[T]>,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    groups.check(data.len(), scale)?;
    let mom = data.mom();
    let mut out = MomentArray::zeroed(groups.ngroup(), mom);
    if out.is_empty() {
        return Ok(out);
    }
    let work = groups.index.len() * mom.size();
    let parallel = policy.resolve("reduce_data_indexed_fromzero", work);
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        mom.size(),
        parallel,
        |(g, acc): (usize, &mut [T])| {
            let mut range = groups.range(g);
            if let Some(first) = range.next() {
                kernel::copy_scaled(&data[groups.index[first]], scale_at(scale, first), acc);
            }
            for p in range {
                kernel::merge_scaled(mom, &data[groups.index[p]], scale_at(scale, p), acc);
            }
        }
    );
    Ok(out)
}

/// Dense group ids for consecutive blocks; a trailing partial block gets -1.
pub fn block_by(ndat: usize, block_size: usize) -> Result<Vec<i64>> {
    if block_size == 0 {
        return Err(MomentsError::InvalidBlockSize);
    }
    let full = (ndat / block_size) * block_size;
    Ok((0..ndat)
        .map(|i| if i < full { (i / block_size) as i64 } else { -1 })
        .collect())
}

/// Merge consecutive blocks of `block_size` accumulators.
///
/// # Errors
///
/// [`MomentsError::InvalidBlockSize`] for a zero `block_size`.
pub fn reduce_data_block<T: MomentFloat>(
    data: &MomentArray<T>,
    block_size: usize,
) -> Result<MomentArray<T>> {
    let by = block_by(data.len(), block_size)?;
    reduce_data_grouped(data, &by, data.len() / block_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::allclose;
    use crate::reduction::reduce_vals;

    const X: [f64; 7] = [1.0, 4.0, -2.0, 0.5, 3.0, 2.0, -1.0];
    const W: [f64; 7] = [1.0, 2.0, 0.5, 1.0, 1.5, 1.0, 3.0];
    const Y: [f64; 7] = [0.5, 1.5, 2.0, -1.0, 0.0, 2.5, -0.5];

    fn per_sample(mom: Moments) -> MomentArray<f64> {
        let mut arr = MomentArray::zeros(X.len(), mom).unwrap();
        for i in 0..X.len() {
            kernel::push_val(mom, &mut arr[i], X[i], 0.0, W[i]);
        }
        arr
    }

    fn expected(mom: Moments, members: &[usize]) -> Vec<f64> {
        let x: Vec<f64> = members.iter().map(|&i| X[i]).collect();
        let w: Vec<f64> = members.iter().map(|&i| W[i]).collect();
        reduce_vals(mom, &Samples::new(&x, &w).unwrap()).unwrap()
    }

    #[test]
    fn test_reduce_data_grouped() {
        let mom = Moments::Univariate(3);
        let data = per_sample(mom);
        let by = [0, 1, 0, -1, 2, 1, 0];
        let out = reduce_data_grouped(&data, &by, 3).unwrap();
        assert!(allclose(&out[0], &expected(mom, &[0, 2, 6]), 1e-10, 1e-12));
        assert!(allclose(&out[1], &expected(mom, &[1, 5]), 1e-10, 1e-12));
        assert!(allclose(&out[2], &expected(mom, &[4]), 1e-10, 1e-12));
    }

    #[test]
    fn test_grouped_validation() {
        let mom = Moments::Univariate(2);
        let data = per_sample(mom);
        assert!(matches!(
            reduce_data_grouped(&data, &[0, 1, 0, 0, 3, 1, 0], 3),
            Err(MomentsError::GroupOutOfRange { group: 3, ngroup: 3 })
        ));
        assert!(reduce_data_grouped(&data, &[0, 1], 3).is_err());
    }

    #[test]
    fn test_reduce_vals_grouped_matches_data() {
        let mom = Moments::Univariate(2);
        let by = [1, 1, 0, 0, -1, 1, 0];
        let a = reduce_vals_grouped(&Samples::new(&X, &W).unwrap(), mom, &by, 2).unwrap();
        let b = reduce_data_grouped(&per_sample(mom), &by, 2).unwrap();
        assert!(allclose(a.as_slice(), b.as_slice(), 1e-10, 1e-12));
    }

    #[test]
    fn test_factor_by_to_index() {
        let g = factor_by_to_index(&[2, 0, 2, -1, 0, 5]);
        assert_eq!(g.groups, vec![0, 2, 5]);
        assert_eq!(g.index, vec![1, 4, 0, 2, 5]);
        assert_eq!(g.start, vec![0, 2, 4]);
        assert_eq!(g.end, vec![2, 4, 5]);

        let empty = factor_by_to_index(&[-1, -1]);
        assert_eq!(empty.ngroup(), 0);
        assert!(empty.index.is_empty());
    }

    #[test]
    fn test_indexed_matches_grouped() {
        let mom = Moments::Univariate(3);
        let data = per_sample(mom);
        let by = [0, 1, 0, -1, 1, 1, 0];
        let groups = factor_by_to_index(&by);
        let dense = reduce_data_grouped(&data, &by, 2).unwrap();
        for policy in [Parallel::Never, Parallel::Always] {
            let fromzero = reduce_data_indexed_fromzero(&data, &groups, None, policy).unwrap();
            assert!(allclose(fromzero.as_slice(), dense.as_slice(), 1e-10, 1e-12));

            let mut merged = MomentArray::zeros(2, mom).unwrap();
            reduce_data_indexed_into(&mut merged, &data, &groups, None, policy).unwrap();
            assert!(allclose(merged.as_slice(), dense.as_slice(), 1e-10, 1e-12));
        }
    }

    #[test]
    fn test_indexed_scale() {
        let mom = Moments::Univariate(2);
        let data = per_sample(mom);
        let groups = IndexedGroups::new(vec![0, 1, 1], vec![0, 3], vec![3, 3]).unwrap();
        let scale = [2.0, 1.0, 1.0];
        let out =
            reduce_data_indexed_fromzero(&data, &groups, Some(&scale), Parallel::Never).unwrap();
        // sample 0 twice, sample 1 twice
        let x = [X[0], X[1]];
        let w = [2.0 * W[0], 2.0 * W[1]];
        let whole = reduce_vals(mom, &Samples::new(&x, &w).unwrap()).unwrap();
        assert!(allclose(&out[0], &whole, 1e-10, 1e-12));
        assert_eq!(&out[1], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_indexed_validation() {
        assert!(matches!(
            IndexedGroups::new(vec![0, 1], vec![0], vec![3]),
            Err(MomentsError::InvalidGroupRange { group: 0, .. })
        ));
        assert!(IndexedGroups::new(vec![0, 1], vec![0, 1], vec![1]).is_err());

        let data = per_sample(Moments::Univariate(2));
        let groups = IndexedGroups::new(vec![0, 9], vec![0], vec![2]).unwrap();
        assert!(matches!(
            reduce_data_indexed_fromzero(&data, &groups, None, Parallel::Never),
            Err(MomentsError::IndexOutOfRange { index: 9, ndat: 7 })
        ));
        let groups = IndexedGroups::new(vec![0, 1], vec![0], vec![2]).unwrap();
        let short = [1.0];
        let out = reduce_data_indexed_fromzero(&data, &groups, Some(&short), Parallel::Never);
        assert!(out.is_err());
    }

    #[test]
    fn test_block() {
        assert_eq!(block_by(7, 3).unwrap(), vec![0, 0, 0, 1, 1, 1, -1]);
        assert!(matches!(block_by(3, 0), Err(MomentsError::InvalidBlockSize)));

        let mom = Moments::Univariate(2);
        let out = reduce_data_block(&per_sample(mom), 3).unwrap();
        assert_eq!(out.len(), 2);
        assert!(allclose(&out[0], &expected(mom, &[0, 1, 2]), 1e-10, 1e-12));
        assert!(allclose(&out[1], &expected(mom, &[3, 4, 5]), 1e-10, 1e-12));
    }

    #[test]
    fn test_bivariate_grouped_and_indexed() {
        let mom = Moments::Bivariate(2, 2);
        let samples = Samples::bivariate(&X, &Y, Some(&W)).unwrap();
        let mut data = MomentArray::zeros(X.len(), mom).unwrap();
        for i in 0..X.len() {
            kernel::push_val(mom, &mut data[i], X[i], Y[i], W[i]);
        }
        let by = [1, 0, 1, -1, 0, 1, 0];
        let members: [&[usize]; 2] = [&[1, 4, 6], &[0, 2, 5]];
        let expected: Vec<Vec<f64>> = members
            .iter()
            .map(|m| {
                let x: Vec<f64> = m.iter().map(|&i| X[i]).collect();
                let y: Vec<f64> = m.iter().map(|&i| Y[i]).collect();
                let w: Vec<f64> = m.iter().map(|&i| W[i]).collect();
                reduce_vals(mom, &Samples::bivariate(&x, &y, Some(&w)).unwrap()).unwrap()
            })
            .collect();

        let dense = reduce_data_grouped(&data, &by, 2).unwrap();
        let from_vals = reduce_vals_grouped(&samples, mom, &by, 2).unwrap();
        let groups = factor_by_to_index(&by);
        let fromzero =
            reduce_data_indexed_fromzero(&data, &groups, None, Parallel::Always).unwrap();
        let mut merged = MomentArray::zeros(2, mom).unwrap();
        reduce_data_indexed_into(&mut merged, &data, &groups, None, Parallel::Never).unwrap();
        for g in 0..2 {
            for out in [&dense, &from_vals, &fromzero, &merged] {
                assert!(allclose(&out[g], &expected[g], 1e-10, 1e-12), "group {}", g);
            }
        }
    }
}
