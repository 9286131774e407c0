//! Bootstrap and jackknife resampling.
//!
//! A [`FreqTable`] is an `nrep x ndat` matrix of multiplicities: cell
//! `(r, s)` says how many times sample `s` enters replicate `r`. An
//! [`IndexTable`] is the same information as an `nrep x nsamp` list of
//! sample indices with repeats. Resampling builds one accumulator per
//! replicate; replicates run in parallel, each folds in sample order.

use rand::prelude::*;

use crate::error::{MomentsError, Result};
use crate::float::MomentFloat;
use crate::helpers::cast_usize;
use crate::kernel;
use crate::matrix::MomentArray;
use crate::maybe_par_chunks_mut_enumerate;
use crate::moments::Moments;
use crate::parallel::Parallel;
use crate::reduction::{reduce_data, reduce_vals};
use crate::samples::Samples;

/// Replicate x sample multiplicities, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqTable {
    data: Vec<usize>,
    nrep: usize,
    ndat: usize,
}

impl FreqTable {
    pub fn new(data: Vec<usize>, nrep: usize, ndat: usize) -> Result<Self> {
        if data.len() != nrep * ndat {
            return Err(MomentsError::LengthMismatch {
                name: "freq",
                expected: nrep * ndat,
                actual: data.len(),
            });
        }
        Ok(Self { data, nrep, ndat })
    }

    pub fn zeros(nrep: usize, ndat: usize) -> Self {
        Self {
            data: vec![0; nrep * ndat],
            nrep,
            ndat,
        }
    }

    #[inline]
    pub fn nrep(&self) -> usize {
        self.nrep
    }

    #[inline]
    pub fn ndat(&self) -> usize {
        self.ndat
    }

    #[inline]
    pub fn row(&self, r: usize) -> &[usize] {
        &self.data[r * self.ndat..(r + 1) * self.ndat]
    }

    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [usize] {
        &mut self.data[r * self.ndat..(r + 1) * self.ndat]
    }

    #[inline]
    pub fn get(&self, r: usize, s: usize) -> usize {
        self.data[r * self.ndat + s]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.data
    }

    /// Resample size of replicate `r`.
    pub fn nsamp(&self, r: usize) -> usize {
        self.row(r).iter().sum()
    }

    fn check_ndat(&self, ndat: usize) -> Result<()> {
        if self.ndat != ndat {
            return Err(MomentsError::LengthMismatch {
                name: "freq columns",
                expected: ndat,
                actual: self.ndat,
            });
        }
        Ok(())
    }
}

/// Replicate x draw sample indices, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTable {
    data: Vec<usize>,
    nrep: usize,
    nsamp: usize,
}

impl IndexTable {
    pub fn new(data: Vec<usize>, nrep: usize, nsamp: usize) -> Result<Self> {
        if data.len() != nrep * nsamp {
            return Err(MomentsError::LengthMismatch {
                name: "indices",
                expected: nrep * nsamp,
                actual: data.len(),
            });
        }
        Ok(Self { data, nrep, nsamp })
    }

    #[inline]
    pub fn nrep(&self) -> usize {
        self.nrep
    }

    #[inline]
    pub fn nsamp(&self) -> usize {
        self.nsamp
    }

    #[inline]
    pub fn row(&self, r: usize) -> &[usize] {
        &self.data[r * self.nsamp..(r + 1) * self.nsamp]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.data
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Random resampling indices.
///
/// # Arguments
/// * `nrep` - Number of replicates
/// * `ndat` - Number of original samples
/// * `nsamp` - Draws per replicate (defaults to `ndat`)
/// * `replace` - Draw with replacement
/// * `seed` - Random seed
///
/// # Errors
///
/// [`MomentsError::TooManySamples`] when draws are requested from zero
/// samples, or when `nsamp > ndat` without replacement.
pub fn random_indices(
    nrep: usize,
    ndat: usize,
    nsamp: Option<usize>,
    replace: bool,
    seed: u64,
) -> Result<IndexTable> {
    let nsamp = nsamp.unwrap_or(ndat);
    if nsamp > 0 && (ndat == 0 || (!replace && nsamp > ndat)) {
        return Err(MomentsError::TooManySamples { nsamp, ndat });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(nrep * nsamp);
    for _ in 0..nrep {
        if replace {
            data.extend((0..nsamp).map(|_| rng.gen_range(0..ndat)));
        } else {
            data.extend(rand::seq::index::sample(&mut rng, ndat, nsamp).into_iter());
        }
    }
    IndexTable::new(data, nrep, nsamp)
}

/// Random frequency table; see [`random_indices`] for the arguments.
///
/// # Errors
///
/// As [`random_indices`].
pub fn random_freq(
    nrep: usize,
    ndat: usize,
    nsamp: Option<usize>,
    replace: bool,
    seed: u64,
) -> Result<FreqTable> {
    let indices = random_indices(nrep, ndat, nsamp, replace, seed)?;
    indices_to_freq(&indices, Some(ndat))
}

/// Leave-one-out table: all ones with a zero diagonal.
///
/// ```
/// use central_moments::resample::jackknife_freq;
///
/// let freq = jackknife_freq(3);
/// assert_eq!(freq.as_slice(), &[0, 1, 1, 1, 0, 1, 1, 1, 0]);
/// ```
pub fn jackknife_freq(ndat: usize) -> FreqTable {
    let mut out = FreqTable {
        data: vec![1; ndat * ndat],
        nrep: ndat,
        ndat,
    };
    for r in 0..ndat {
        out.row_mut(r)[r] = 0;
    }
    out
}

/// Expand frequencies into index lists, optionally shuffling each row.
///
/// Every replicate must have the same resample size.
///
/// # Errors
///
/// [`MomentsError::InconsistentFrequencies`] when two rows sum to
/// different sample counts.
pub fn freq_to_indices(freq: &FreqTable, shuffle_seed: Option<u64>) -> Result<IndexTable> {
    if freq.nrep() == 0 {
        return IndexTable::new(Vec::new(), 0, 0);
    }
    let nsamp = freq.nsamp(0);
    let mut data = Vec::with_capacity(freq.nrep() * nsamp);
    for r in 0..freq.nrep() {
        let other = freq.nsamp(r);
        if other != nsamp {
            return Err(MomentsError::InconsistentFrequencies { first: nsamp, other });
        }
        for (s, &count) in freq.row(r).iter().enumerate() {
            data.extend(std::iter::repeat(s).take(count));
        }
    }

    if let Some(seed) = shuffle_seed {
        let mut rng = StdRng::seed_from_u64(seed);
        if nsamp > 0 {
            for row in data.chunks_mut(nsamp) {
                row.shuffle(&mut rng);
            }
        }
    }
    IndexTable::new(data, freq.nrep(), nsamp)
}

/// Count index occurrences per replicate.
///
/// `ndat` defaults to one past the largest index.
///
/// # Errors
///
/// [`MomentsError::IndexOutOfRange`] when an index is `>= ndat`.
pub fn indices_to_freq(indices: &IndexTable, ndat: Option<usize>) -> Result<FreqTable> {
    let max = indices.as_slice().iter().max().map_or(0, |&m| m + 1);
    let ndat = ndat.unwrap_or(max);
    if max > ndat {
        return Err(MomentsError::IndexOutOfRange { index: max - 1, ndat });
    }
    let mut out = FreqTable::zeros(indices.nrep(), ndat);
    for r in 0..indices.nrep() {
        let row = out.row_mut(r);
        for &s in indices.row(r) {
            row[s] += 1;
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Resampling
// ---------------------------------------------------------------------------

/// Merge `freq[r, s] * data[s]` into `out[r]`. `out` may already hold data.
///
/// # Errors
///
/// [`MomentsError::MomentsMismatch`] when `out` and `data` differ in shape,
/// [`MomentsError::LengthMismatch`] when `freq` does not have `data.len()`
/// columns or `out` does not have one accumulator per replicate.
pub fn resample_data_into<T: MomentFloat>(
    out: &mut MomentArray<T>,
    data: &MomentArray<T>,
    freq: &FreqTable,
    policy: Parallel,
) -> Result<()> {
    out.check_moments(data)?;
    freq.check_ndat(data.len())?;
    if out.len() != freq.nrep() {
        return Err(MomentsError::LengthMismatch {
            name: "out",
            expected: freq.nrep(),
            actual: out.len(),
        });
    }
    if out.is_empty() {
        return Ok(());
    }
    let mom = data.mom();
    let parallel = policy.resolve("resample_data", freq.as_slice().len() * mom.size());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        mom.size(),
        parallel,
        |(r, acc): (usize, &mut [T])| {
            for (s, &count) in freq.row(r).iter().enumerate() {
                if count > 0 {
                    kernel::merge_scaled(mom, &data[s], cast_usize(count), acc);
                }
            }
        }
    );
    Ok(())
}

/// One accumulator per replicate of `freq`.
///
/// Each replicate starts as a scaled copy of its first contributing sample;
/// a replicate with no contributions is all zeros.
///
/// # Errors
///
/// [`MomentsError::LengthMismatch`] when `freq` does not have `data.len()`
/// columns.
pub fn resample_data<T: MomentFloat>(
    data: &MomentArray<T>,
    freq: &FreqTable,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    freq.check_ndat(data.len())?;
    let mom = data.mom();
    let mut out = MomentArray::zeroed(freq.nrep(), mom);
    if out.is_empty() {
        return Ok(out);
    }
    let parallel = policy.resolve("resample_data", freq.as_slice().len() * mom.size());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        mom.size(),
        parallel,
        |(r, acc): (usize, &mut [T])| {
            let mut started = false;
            for (s, &count) in freq.row(r).iter().enumerate() {
                if count == 0 {
                    continue;
                }
                if started {
                    kernel::merge_scaled(mom, &data[s], cast_usize(count), acc);
                } else {
                    kernel::copy_scaled(&data[s], cast_usize(count), acc);
                    started = true;
                }
            }
        }
    );
    Ok(out)
}

/// One accumulator per replicate, built from raw samples with effective
/// weight `w[s] * freq[r, s]`.
///
/// # Errors
///
/// [`MomentsError::InvalidOrder`], [`MomentsError::WrongMomentsKind`] when
/// the samples do not match `mom`, or [`MomentsError::LengthMismatch`]
/// when `freq` does not have one column per sample.
pub fn resample_vals<T: MomentFloat>(
    samples: &Samples<'_, T>,
    mom: Moments,
    freq: &FreqTable,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    let mom = mom.validate()?;
    samples.check_moments(mom)?;
    freq.check_ndat(samples.len())?;
    let mut out = MomentArray::zeroed(freq.nrep(), mom);
    if out.is_empty() {
        return Ok(out);
    }
    let parallel = policy.resolve("resample_vals", freq.as_slice().len() * mom.size());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        mom.size(),
        parallel,
        |(r, acc): (usize, &mut [T])| {
            for (s, &count) in freq.row(r).iter().enumerate() {
                if count > 0 {
                    let (x, y, w) = samples.get(s);
                    kernel::push_val(mom, acc, x, y, w * cast_usize(count));
                }
            }
        }
    );
    Ok(out)
}

fn resolve_total<T: MomentFloat>(
    mom: Moments,
    total: Option<&[T]>,
    reduce: impl FnOnce() -> Result<Vec<T>>,
) -> Result<Vec<T>> {
    match total {
        Some(total) => {
            mom.check_len("total", total.len())?;
            Ok(total.to_vec())
        }
        None => reduce(),
    }
}

/// Leave-one-out accumulators: `out[s]` is `total` with `data[s]` removed.
///
/// `total` defaults to the reduction of `data`.
///
/// # Errors
///
/// [`MomentsError::LengthMismatch`] when `total` does not match the
/// accumulator shape of `data`.
///
/// # Panics
///
/// In debug builds, when a component weighs more than `total`.
pub fn jackknife_data<T: MomentFloat>(
    data: &MomentArray<T>,
    total: Option<&[T]>,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    let mom = data.mom();
    let total = resolve_total(mom, total, || Ok(reduce_data(data)))?;
    let mut out = MomentArray::zeroed(data.len(), mom);
    if out.is_empty() {
        return Ok(out);
    }
    let parallel = policy.resolve("jackknife_data", data.as_slice().len());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        mom.size(),
        parallel,
        |(s, acc): (usize, &mut [T])| {
            debug_assert!(
                data[s][0] <= total[0],
                "jackknife component {} outweighs the total",
                s
            );
            acc.copy_from_slice(&total);
            kernel::merge_scaled(mom, &data[s], -T::one(), acc);
        }
    );
    Ok(out)
}

/// Leave-one-out accumulators from raw samples.
///
/// # Errors
///
/// [`MomentsError::InvalidOrder`], [`MomentsError::WrongMomentsKind`] when
/// the samples do not match `mom`, or [`MomentsError::LengthMismatch`] when
/// `total` does not match `mom`.
///
/// # Panics
///
/// In debug builds, when a sample weighs more than `total`.
pub fn jackknife_vals<T: MomentFloat>(
    samples: &Samples<'_, T>,
    mom: Moments,
    total: Option<&[T]>,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    let mom = mom.validate()?;
    samples.check_moments(mom)?;
    let total = resolve_total(mom, total, || reduce_vals(mom, samples))?;
    let mut out = MomentArray::zeroed(samples.len(), mom);
    if out.is_empty() {
        return Ok(out);
    }
    let parallel = policy.resolve("jackknife_vals", samples.len() * mom.size());
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        mom.size(),
        parallel,
        |(s, acc): (usize, &mut [T])| {
            let (x, y, w) = samples.get(s);
            debug_assert!(w <= total[0], "jackknife sample {} outweighs the total", s);
            acc.copy_from_slice(&total);
            kernel::remove_val(mom, acc, x, y, w);
        }
    );
    Ok(out)
}
